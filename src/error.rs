//! Error types for buildcache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in buildcache
#[derive(Error, Debug)]
pub enum CacheError {
    // Configuration errors
    #[error("Invalid HTTP cache root URI {uri}: {reason}")]
    InvalidRootUri { uri: String, reason: String },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid cache configuration: {0}")]
    Configuration(String),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache I/O errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP cache returned status {status}: {reason} ({uri})")]
    UnexpectedStatus {
        uri: String,
        status: u16,
        reason: String,
    },

    #[error("Cannot address cache entry {key}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Cache entry not found: {0}")]
    EntryNotFound(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error stems from malformed configuration.
    ///
    /// Configuration errors are fatal and raised at construction time; they
    /// are never worth retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidRootUri { .. }
                | Self::ConfigInvalid { .. }
                | Self::Configuration(_)
                | Self::ConfigDirCreate { .. }
                | Self::TomlParse(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRootUri { .. } => {
                Some("Use an http(s) URL whose path ends with '/', e.g. https://cache.example.com/cache/")
            }
            Self::UnexpectedStatus { .. } => Some("Check that the remote cache service is healthy"),
            Self::EntryNotFound(_) => Some("Store the entry first with: buildcache put <FILE>"),
            _ => None,
        }
    }
}
