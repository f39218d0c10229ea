//! Build cache backends
//!
//! Every backend implements [`BuildCache`]: content-addressed `load` and
//! `store` over streaming entry readers and writers. Backends compose, so the
//! resilient wrapper is just another `BuildCache` that holds a delegate.
//!
//! | Backend | Storage | Notes |
//! |---------|---------|-------|
//! | [`InMemoryBuildCache`] | shared concurrent map | reference / test double |
//! | [`HttpBuildCache`] | remote service | `GET`/`PUT` under a root URI |
//! | [`ResilientBuildCache`] | delegate | disables a failing delegate |

mod entry;
mod factory;
pub mod http;
mod key;
pub mod memory;
mod pipe;
pub mod resilient;
pub mod transport;

pub use entry::{EntryReader, EntryWriter};
pub use factory::create_cache;
pub use http::HttpBuildCache;
pub use key::CacheKey;
pub use memory::{EntryMap, InMemoryBuildCache};
pub use resilient::ResilientBuildCache;
pub use transport::{HttpTransport, TransportResponse, UreqTransport};

use crate::error::CacheResult;
use std::sync::Arc;

/// Content-addressed build cache
///
/// Implementations must be safe to call from many build workers at once.
/// `load` and `store` block the caller for the duration of the I/O.
pub trait BuildCache: Send + Sync {
    /// Load the entry for `key` into `reader`.
    ///
    /// Returns `true` once the full entry has been delivered, `false` on a
    /// miss. On a miss the reader is never invoked. Errors are returned, never
    /// swallowed.
    fn load(&self, key: &CacheKey, reader: &mut dyn EntryReader) -> CacheResult<bool>;

    /// Store the entry produced by `writer` under `key`, replacing any
    /// previous value.
    fn store(&self, key: &CacheKey, writer: &dyn EntryWriter) -> CacheResult<()>;

    /// Human-readable identifier for diagnostics
    fn description(&self) -> String;

    /// Release backend-owned resources. Call exactly once.
    fn close(&self) -> CacheResult<()>;
}

impl<T: BuildCache + ?Sized> BuildCache for Box<T> {
    fn load(&self, key: &CacheKey, reader: &mut dyn EntryReader) -> CacheResult<bool> {
        (**self).load(key, reader)
    }

    fn store(&self, key: &CacheKey, writer: &dyn EntryWriter) -> CacheResult<()> {
        (**self).store(key, writer)
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn close(&self) -> CacheResult<()> {
        (**self).close()
    }
}

impl<T: BuildCache + ?Sized> BuildCache for Arc<T> {
    fn load(&self, key: &CacheKey, reader: &mut dyn EntryReader) -> CacheResult<bool> {
        (**self).load(key, reader)
    }

    fn store(&self, key: &CacheKey, writer: &dyn EntryWriter) -> CacheResult<()> {
        (**self).store(key, writer)
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn close(&self) -> CacheResult<()> {
        (**self).close()
    }
}
