//! Diagnostics sink handed to cache components at construction
//!
//! Components never reach for a global logger directly. They receive an
//! `Arc<dyn DiagnosticsSink>` and emit leveled messages through it. The
//! production sink forwards to `tracing`; tests use [`RecordingSink`].

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::Level;

/// Leveled message sink used by every cache component
pub trait DiagnosticsSink: Send + Sync {
    /// Whether messages at `level` would be recorded
    fn enabled(&self, level: Level) -> bool;

    /// Record a message at `level`
    fn log(&self, level: Level, message: fmt::Arguments<'_>);
}

/// Shared handle to a diagnostics sink
pub type SharedSink = Arc<dyn DiagnosticsSink>;

/// Sink that forwards to the `tracing` subscriber installed by the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    /// Create a shared tracing sink
    pub fn shared() -> SharedSink {
        Arc::new(Self)
    }
}

impl DiagnosticsSink for TracingSink {
    fn enabled(&self, level: Level) -> bool {
        match level {
            Level::ERROR => tracing::enabled!(Level::ERROR),
            Level::WARN => tracing::enabled!(Level::WARN),
            Level::INFO => tracing::enabled!(Level::INFO),
            Level::DEBUG => tracing::enabled!(Level::DEBUG),
            _ => tracing::enabled!(Level::TRACE),
        }
    }

    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        match level {
            Level::ERROR => tracing::error!("{}", message),
            Level::WARN => tracing::warn!("{}", message),
            Level::INFO => tracing::info!("{}", message),
            Level::DEBUG => tracing::debug!("{}", message),
            _ => tracing::trace!("{}", message),
        }
    }
}

/// Sink that keeps every message in memory
///
/// `max_level` decides what `enabled` reports; messages are recorded
/// regardless so tests can assert on everything a component emitted.
#[derive(Debug)]
pub struct RecordingSink {
    max_level: Level,
    records: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    /// Create a recording sink reporting levels up to `max_level` as enabled
    pub fn new(max_level: Level) -> Self {
        Self {
            max_level,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the recorded messages
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().clone()
    }

    /// Number of recorded messages at `level` containing `needle`
    pub fn count(&self, level: Level, needle: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|(l, m)| *l == level && m.contains(needle))
            .count()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn enabled(&self, level: Level) -> bool {
        // tracing orders levels by verbosity: TRACE > DEBUG > ... > ERROR
        level <= self.max_level
    }

    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.records.lock().push((level, message.to_string()));
    }
}
