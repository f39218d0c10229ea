//! buildcache - pluggable build artifact cache client
//!
//! Content-addressed `load`/`store` against interchangeable backends (a
//! remote HTTP service or an in-memory map), with a circuit breaker that
//! keeps a flaky backend from failing the build.

pub mod cache;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ui;

pub use cache::{BuildCache, CacheKey, EntryReader, EntryWriter};
pub use error::{CacheError, CacheResult};
