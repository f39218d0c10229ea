//! Bounded in-process pipe between an entry writer and a request body
//!
//! ureq pulls request bodies through `Read`, while entry writers push through
//! `Write`. The writer runs on a producer thread and hands fixed-size chunks
//! to the transport over a bounded channel, so at most
//! `PIPE_DEPTH * CHUNK_SIZE` bytes of an entry are in memory at once.

use super::EntryWriter;
use std::io::{self, Read, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

const CHUNK_SIZE: usize = 64 * 1024;
const PIPE_DEPTH: usize = 4;

enum Chunk {
    Data(Vec<u8>),
    End,
    Failed(io::Error),
}

/// Create a connected writer/reader pair
pub(crate) fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = sync_channel(PIPE_DEPTH);
    (
        PipeWriter {
            tx,
            buffer: Vec::with_capacity(CHUNK_SIZE),
        },
        PipeReader {
            rx,
            current: Vec::new(),
            pos: 0,
            done: false,
        },
    )
}

/// Run `writer` into `output`, then mark the end of the stream.
///
/// A writer error is forwarded to the reading side so the consumer fails
/// instead of treating a truncated body as complete.
pub(crate) fn produce(writer: &dyn EntryWriter, mut output: PipeWriter) -> io::Result<()> {
    let result = writer.write_to(&mut output).and_then(|()| output.flush());
    match result {
        Ok(()) => output.finish(),
        Err(e) => {
            let reported = io::Error::new(e.kind(), e.to_string());
            // The reader may already be gone; its own error wins then
            let _ = output.tx.send(Chunk::Failed(reported));
            Err(e)
        }
    }
}

pub(crate) struct PipeWriter {
    tx: SyncSender<Chunk>,
    buffer: Vec<u8>,
}

impl PipeWriter {
    fn send_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buffer, Vec::with_capacity(CHUNK_SIZE));
        self.tx
            .send(Chunk::Data(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "request body closed"))
    }

    fn finish(mut self) -> io::Result<()> {
        self.send_buffer()?;
        self.tx
            .send(Chunk::End)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "request body closed"))
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = CHUNK_SIZE - self.buffer.len();
        let n = room.min(buf.len());
        self.buffer.extend_from_slice(&buf[..n]);
        if self.buffer.len() == CHUNK_SIZE {
            self.send_buffer()?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffer()
    }
}

pub(crate) struct PipeReader {
    rx: Receiver<Chunk>,
    current: Vec<u8>,
    pos: usize,
    done: bool,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.current.len() {
            if self.done {
                return Ok(0);
            }
            match self.rx.recv() {
                Ok(Chunk::Data(chunk)) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                Ok(Chunk::End) => self.done = true,
                Ok(Chunk::Failed(e)) => return Err(e),
                Err(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "entry writer stopped before finishing",
                    ))
                }
            }
        }

        let n = (self.current.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
