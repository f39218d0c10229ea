//! In-memory reference backend
//!
//! Entries live in a concurrent map the caller owns. Stores are buffered in
//! full before they are published, which is fine for a small test-scale
//! backend and keeps readers from ever seeing a partial entry.

use super::{BuildCache, CacheKey, EntryReader, EntryWriter};
use crate::error::{CacheError, CacheResult};
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent map of hash code to entry bytes
pub type EntryMap = DashMap<String, Arc<[u8]>>;

/// Build cache backed by a shared [`EntryMap`]
pub struct InMemoryBuildCache {
    description: String,
    entries: Arc<EntryMap>,
}

impl InMemoryBuildCache {
    /// Create a backend over `entries`. The map is shared, not owned: closing
    /// the backend leaves it untouched.
    pub fn new(description: impl Into<String>, entries: Arc<EntryMap>) -> Self {
        Self {
            description: description.into(),
            entries,
        }
    }

    /// Create a backend over a fresh, empty map
    pub fn empty(description: impl Into<String>) -> Self {
        Self::new(description, Arc::new(DashMap::new()))
    }

    /// The backing map
    pub fn entries(&self) -> &Arc<EntryMap> {
        &self.entries
    }
}

impl BuildCache for InMemoryBuildCache {
    fn load(&self, key: &CacheKey, reader: &mut dyn EntryReader) -> CacheResult<bool> {
        // Clone the handle out so no shard lock is held while the reader runs
        let bytes = match self.entries.get(key.hash_code()) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(false),
        };

        reader
            .read_from(&mut &bytes[..])
            .map_err(|e| CacheError::io(format!("reading cache entry {}", key), e))?;
        Ok(true)
    }

    fn store(&self, key: &CacheKey, writer: &dyn EntryWriter) -> CacheResult<()> {
        let mut buffer = Vec::new();
        writer
            .write_to(&mut buffer)
            .map_err(|e| CacheError::io(format!("writing cache entry {}", key), e))?;

        self.entries
            .insert(key.hash_code().to_string(), Arc::from(buffer));
        Ok(())
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn close(&self) -> CacheResult<()> {
        Ok(())
    }
}
