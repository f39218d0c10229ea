//! Streaming entry capabilities
//!
//! Entry bytes move between the build and a backend through these two
//! capabilities so that no backend is forced to hold a whole entry in memory.

use std::io::{self, Read, Write};

/// Consumes the bytes of one cache entry
///
/// A backend calls `read_from` at most once per `load`, and only on a hit.
/// The reader is expected to consume the stream fully.
pub trait EntryReader {
    fn read_from(&mut self, input: &mut dyn Read) -> io::Result<()>;
}

/// Produces the bytes of one cache entry
///
/// `write_to` must be safely re-invocable: a transport may call it again to
/// resend the body, so every invocation has to yield the same bytes and
/// leave no single-use side effects behind. `Send + Sync` lets a transport
/// drive the writer from a producer thread.
pub trait EntryWriter: Send + Sync {
    fn write_to(&self, output: &mut dyn Write) -> io::Result<()>;
}

/// Collects the entry into the vector, appending to what is already there
impl EntryReader for Vec<u8> {
    fn read_from(&mut self, input: &mut dyn Read) -> io::Result<()> {
        input.read_to_end(self)?;
        Ok(())
    }
}

impl<R: EntryReader + ?Sized> EntryReader for &mut R {
    fn read_from(&mut self, input: &mut dyn Read) -> io::Result<()> {
        (**self).read_from(input)
    }
}

/// Writes the vector's bytes as the entry
impl EntryWriter for Vec<u8> {
    fn write_to(&self, output: &mut dyn Write) -> io::Result<()> {
        output.write_all(self)
    }
}

impl EntryWriter for [u8] {
    fn write_to(&self, output: &mut dyn Write) -> io::Result<()> {
        output.write_all(self)
    }
}

impl<W: EntryWriter + ?Sized> EntryWriter for &W {
    fn write_to(&self, output: &mut dyn Write) -> io::Result<()> {
        (**self).write_to(output)
    }
}
