//! HTTP transport seam for the HTTP backend
//!
//! The backend owns the wire semantics (URI resolution, status handling);
//! a transport only executes requests. [`UreqTransport`] is the production
//! implementation; tests substitute their own.

use super::pipe;
use super::EntryWriter;
use parking_lot::RwLock;
use std::fmt;
use std::io::{self, Read};
use std::time::Duration;
use ureq::{Agent, SendBody};
use url::Url;

/// Response to a transport request
///
/// Dropping the response releases its connection, whether or not the body
/// was read to the end.
pub struct TransportResponse {
    /// Status code
    pub status: u16,
    /// Reason phrase for the status
    pub reason: String,
    /// Response body stream
    pub body: Box<dyn Read>,
}

impl TransportResponse {
    /// Response with an empty body
    pub fn empty(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: Box::new(io::empty()),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Capability to execute GET and PUT requests
///
/// Non-2xx statuses are returned as responses, not errors. Only transport
/// failures (connect, timeout, broken body) are errors.
pub trait HttpTransport: Send + Sync {
    /// Issue a GET for `uri`
    fn get(&self, uri: &Url) -> io::Result<TransportResponse>;

    /// Issue a PUT for `uri` with a body of unknown length produced by `body`
    fn put(&self, uri: &Url, body: &dyn EntryWriter) -> io::Result<TransportResponse>;

    /// Release the underlying client. Later requests fail.
    fn close(&self);
}

/// Blocking transport over a pooled ureq agent
pub struct UreqTransport {
    agent: RwLock<Option<Agent>>,
}

impl UreqTransport {
    /// Create a transport with an optional global request timeout
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();
        Self {
            agent: RwLock::new(Some(config.into())),
        }
    }

    fn agent(&self) -> io::Result<Agent> {
        self.agent
            .read()
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "HTTP client is closed"))
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

fn transport_error(err: ureq::Error) -> io::Error {
    match err {
        ureq::Error::Io(e) => e,
        other => io::Error::other(other),
    }
}

fn into_transport_response(response: ureq::http::Response<ureq::Body>) -> TransportResponse {
    let status = response.status();
    TransportResponse {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        body: Box::new(response.into_body().into_reader()),
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, uri: &Url) -> io::Result<TransportResponse> {
        let response = self
            .agent()?
            .get(uri.as_str())
            .call()
            .map_err(transport_error)?;
        Ok(into_transport_response(response))
    }

    fn put(&self, uri: &Url, body: &dyn EntryWriter) -> io::Result<TransportResponse> {
        let agent = self.agent()?;
        let (writer, mut reader) = pipe::pipe();

        std::thread::scope(|scope| {
            let producer = scope.spawn(move || pipe::produce(body, writer));

            let sent = agent
                .put(uri.as_str())
                .send(SendBody::from_reader(&mut reader))
                .map_err(transport_error);
            // Unblocks the producer if the request ended before the body did
            drop(reader);

            let produced = producer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("entry writer panicked")));

            match (produced, sent) {
                (Err(e), _) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                (_, sent) => sent.map(into_transport_response),
            }
        })
    }

    fn close(&self) {
        self.agent.write().take();
    }
}
