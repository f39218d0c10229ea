//! Content-addressed cache keys

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Read};

/// Opaque content address identifying one cache entry
///
/// The build engine computes keys; this crate treats the hash code as an
/// opaque path segment and never validates its length or charset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already computed hash code
    pub fn new(hash_code: impl Into<String>) -> Self {
        Self(hash_code.into())
    }

    /// Key for the given content: lower-case hex SHA-256
    pub fn for_content(content: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(content)))
    }

    /// Key for everything `reader` yields, hashed incrementally
    pub fn from_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// The hash code this key addresses
    pub fn hash_code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(hash_code: String) -> Self {
        Self(hash_code)
    }
}

impl From<&str> for CacheKey {
    fn from(hash_code: &str) -> Self {
        Self(hash_code.to_string())
    }
}
