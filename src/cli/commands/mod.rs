//! CLI command implementations

pub mod config;
pub mod get;
pub mod info;
pub mod put;

pub use config::execute as config;
pub use get::execute as get;
pub use info::execute as info;
pub use put::execute as put;

use crate::cache::BuildCache;
use crate::error::{CacheError, CacheResult};

/// Run `op` against `cache` on the blocking pool, then close the cache.
///
/// The cache is closed even when `op` fails; the operation's error wins.
pub(crate) async fn with_cache<T, F>(cache: Box<dyn BuildCache>, op: F) -> CacheResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn BuildCache) -> CacheResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> CacheResult<T> {
        let result = op(&*cache);
        let closed = cache.close();
        let value = result?;
        closed?;
        Ok(value)
    })
    .await
    .map_err(|e| CacheError::User(format!("Cache task failed: {}", e)))?
}
