//! Build cache backed by a remote HTTP service
//!
//! Entries are loaded with `GET <root>/<hash>` and stored with
//! `PUT <root>/<hash>`. A 2xx response to `GET` is a hit and a 404 is a
//! miss; anything else is an error. Request bodies are streamed with an
//! unknown length.

use super::transport::{HttpTransport, UreqTransport};
use super::{BuildCache, CacheKey, EntryReader, EntryWriter};
use crate::diagnostics::SharedSink;
use crate::error::{CacheError, CacheResult};
use std::time::Duration;
use tracing::Level;
use url::Url;

/// Build cache that delegates to a service reachable over HTTP
pub struct HttpBuildCache<T = UreqTransport> {
    root: Url,
    transport: T,
    sink: SharedSink,
}

/// Check that `root` can serve as the base for relative key resolution.
///
/// The path must end with `/`, otherwise joining a key would replace the
/// last segment instead of appending to it.
pub fn validate_root(root: &Url) -> CacheResult<()> {
    let invalid = |reason: &str| CacheError::InvalidRootUri {
        uri: root.to_string(),
        reason: reason.to_string(),
    };

    if root.cannot_be_a_base() {
        return Err(invalid("URI cannot be used as a base"));
    }
    if !matches!(root.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if !root.path().ends_with('/') {
        return Err(invalid("HTTP cache root URI must end with '/'"));
    }
    Ok(())
}

/// Parse and validate a root URI string
pub fn parse_root(root: &str) -> CacheResult<Url> {
    let url = Url::parse(root).map_err(|e| CacheError::InvalidRootUri {
        uri: root.to_string(),
        reason: e.to_string(),
    })?;
    validate_root(&url)?;
    Ok(url)
}

impl HttpBuildCache<UreqTransport> {
    /// Create a backend at `root` with a pooled ureq client
    pub fn new(root: Url, timeout: Option<Duration>, sink: SharedSink) -> CacheResult<Self> {
        validate_root(&root)?;
        Ok(Self {
            root,
            transport: UreqTransport::new(timeout),
            sink,
        })
    }
}

impl<T: HttpTransport> HttpBuildCache<T> {
    /// Create a backend at `root` that issues requests through `transport`
    pub fn with_transport(root: Url, transport: T, sink: SharedSink) -> CacheResult<Self> {
        validate_root(&root)?;
        Ok(Self {
            root,
            transport,
            sink,
        })
    }

    /// The root all keys resolve against
    pub fn root(&self) -> &Url {
        &self.root
    }

    fn resolve(&self, reference: &str, key: &CacheKey) -> CacheResult<Url> {
        self.root
            .join(reference)
            .map_err(|e| CacheError::InvalidKey {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

impl<T: HttpTransport> BuildCache for HttpBuildCache<T> {
    fn load(&self, key: &CacheKey, reader: &mut dyn EntryReader) -> CacheResult<bool> {
        // "./" keeps a key containing ':' from being read as a scheme
        let uri = self.resolve(&format!("./{}", key.hash_code()), key)?;
        let mut response = self
            .transport
            .get(&uri)
            .map_err(|e| CacheError::io(format!("GET {}", uri), e))?;

        if self.sink.enabled(Level::DEBUG) {
            self.sink.log(
                Level::DEBUG,
                format_args!(
                    "Response for GET {}: {} {}",
                    uri, response.status, response.reason
                ),
            );
        }

        match response.status {
            200..=299 => {
                reader
                    .read_from(&mut response.body)
                    .map_err(|e| CacheError::io(format!("reading response body of GET {}", uri), e))?;
                Ok(true)
            }
            404 => Ok(false),
            status => Err(CacheError::UnexpectedStatus {
                uri: uri.to_string(),
                status,
                reason: response.reason,
            }),
        }
    }

    fn store(&self, key: &CacheKey, writer: &dyn EntryWriter) -> CacheResult<()> {
        let uri = self.resolve(key.hash_code(), key)?;
        let response = self
            .transport
            .put(&uri, writer)
            .map_err(|e| CacheError::io(format!("PUT {}", uri), e))?;

        if response.is_success() {
            if self.sink.enabled(Level::DEBUG) {
                self.sink.log(
                    Level::DEBUG,
                    format_args!(
                        "Response for PUT {}: {} {}",
                        uri, response.status, response.reason
                    ),
                );
            }
        } else {
            self.sink.log(
                Level::WARN,
                format_args!(
                    "HTTP cache did not accept PUT {}: {} {}",
                    uri, response.status, response.reason
                ),
            );
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("HTTP cache at {}", self.root)
    }

    fn close(&self) -> CacheResult<()> {
        self.transport.close();
        Ok(())
    }
}
