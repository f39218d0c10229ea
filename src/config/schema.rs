//! Configuration schema for buildcache
//!
//! Configuration is stored at `~/.config/buildcache/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache backend settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Which backend serves the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local map, lost on exit
    #[default]
    Memory,
    /// Remote cache service
    Http,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend to use
    pub backend: BackendKind,

    /// Description of the in-memory backend
    pub description: String,

    /// HTTP backend settings
    pub http: HttpConfig,

    /// Circuit breaker settings
    pub resilience: ResilienceConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            description: "in-memory cache".to_string(),
            http: HttpConfig::default(),
            resilience: ResilienceConfig::default(),
        }
    }
}

/// HTTP backend settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Root URI; the path must end with '/'
    pub root: Option<String>,

    /// Global per-request timeout in seconds (none by default)
    pub timeout_secs: Option<u64>,
}

/// Circuit breaker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Wrap the backend in the error-budget circuit breaker
    pub enabled: bool,

    /// Errors tolerated before the backend is disabled
    pub max_error_count: u32,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_error_count: 3,
        }
    }
}
