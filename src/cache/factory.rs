//! Backend factory
//!
//! Builds the configured backend and wraps it in the circuit breaker.

use super::http::{parse_root, HttpBuildCache};
use super::memory::InMemoryBuildCache;
use super::resilient::ResilientBuildCache;
use super::BuildCache;
use crate::config::{BackendKind, CacheConfig};
use crate::diagnostics::SharedSink;
use crate::error::{CacheError, CacheResult};
use std::time::Duration;
use tracing::debug;

/// Create the build cache described by `config`
///
/// Fails fast on configuration errors; no network request is made here.
pub fn create_cache(config: &CacheConfig, sink: SharedSink) -> CacheResult<Box<dyn BuildCache>> {
    let backend: Box<dyn BuildCache> = match config.backend {
        BackendKind::Memory => Box::new(InMemoryBuildCache::empty(config.description.clone())),
        BackendKind::Http => {
            let root = config.http.root.as_deref().ok_or_else(|| {
                CacheError::Configuration("the http backend requires cache.http.root".to_string())
            })?;
            let timeout = config.http.timeout_secs.map(Duration::from_secs);
            Box::new(HttpBuildCache::new(parse_root(root)?, timeout, sink.clone())?)
        }
    };
    debug!("Created {}", backend.description());

    if !config.resilience.enabled {
        return Ok(backend);
    }

    Ok(Box::new(ResilientBuildCache::new(
        backend,
        config.resilience.max_error_count,
        sink,
    )))
}
