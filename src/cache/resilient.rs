//! Error-budget circuit breaker around another build cache
//!
//! The wrapper passes calls through to its delegate until the delegate has
//! failed `max_error_count` times. After that it short-circuits for the rest
//! of its lifetime: `load` misses and `store` does nothing. Delegate errors
//! never propagate past the wrapper, so a flaky cache cannot fail a build.
//!
//! # Budget accounting
//!
//! Every forwarded call reserves one unit of the remaining error budget
//! before touching the delegate. A call that succeeds hands its unit back; a
//! call that fails spends it. The delegate can therefore fail at most
//! `max_error_count` times in total, even when many workers hit a dead
//! backend at the same instant. While all remaining units are held by
//! in-flight calls, further callers wait until a unit is handed back or the
//! wrapper disables itself. No call is dropped while the wrapper is enabled.

use super::{BuildCache, CacheKey, EntryReader, EntryWriter};
use crate::diagnostics::SharedSink;
use crate::error::{CacheError, CacheResult};
use parking_lot::{Condvar, Mutex};
use std::error::Error as _;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tracing::Level;

/// Build cache that disables its delegate after repeated failures
pub struct ResilientBuildCache<B> {
    delegate: B,
    max_error_count: u32,
    enabled: AtomicBool,
    /// Errors still tolerated before disabling
    remaining_errors: AtomicI64,
    budget: ErrorBudget,
    sink: SharedSink,
}

/// Error budget not yet held by in-flight calls
///
/// Waiters check the counter and the enabled flag while holding `lock`;
/// anything that changes either takes `lock` before notifying.
struct ErrorBudget {
    unreserved: AtomicI64,
    lock: Mutex<()>,
    changed: Condvar,
}

impl ErrorBudget {
    fn new(units: i64) -> Self {
        Self {
            unreserved: AtomicI64::new(units),
            lock: Mutex::new(()),
            changed: Condvar::new(),
        }
    }

    /// Take one unit if any is free
    fn try_take(&self) -> bool {
        let mut current = self.unreserved.load(Ordering::Acquire);
        while current > 0 {
            match self.unreserved.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    fn give_back(&self) {
        self.unreserved.fetch_add(1, Ordering::AcqRel);
        let _guard = self.lock.lock();
        self.changed.notify_one();
    }

    fn wake_all(&self) {
        let _guard = self.lock.lock();
        self.changed.notify_all();
    }
}

/// One unit of error budget held by an in-flight call
///
/// Dropping the reservation returns the unit; `spend` keeps it.
struct Reservation<'a> {
    budget: &'a ErrorBudget,
    spent: bool,
}

impl Reservation<'_> {
    fn spend(mut self) {
        self.spent = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.spent {
            self.budget.give_back();
        }
    }
}

impl<B: BuildCache> ResilientBuildCache<B> {
    /// Wrap `delegate` with a budget of `max_error_count` errors.
    ///
    /// A budget of zero yields a wrapper that starts out disabled.
    pub fn new(delegate: B, max_error_count: u32, sink: SharedSink) -> Self {
        let budget = i64::from(max_error_count);
        Self {
            delegate,
            max_error_count,
            enabled: AtomicBool::new(max_error_count > 0),
            remaining_errors: AtomicI64::new(budget),
            budget: ErrorBudget::new(budget),
            sink,
        }
    }

    /// Whether calls are still forwarded to the delegate
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Number of delegate errors observed so far
    pub fn error_count(&self) -> u32 {
        let remaining = self.remaining_errors.load(Ordering::Acquire).max(0);
        self.max_error_count - remaining as u32
    }

    /// Configured error budget
    pub fn max_error_count(&self) -> u32 {
        self.max_error_count
    }

    /// The wrapped backend
    pub fn delegate(&self) -> &B {
        &self.delegate
    }

    /// Reserve a unit of budget, waiting while all units are in flight
    ///
    /// Returns `None` once the wrapper is disabled.
    fn reserve(&self, operation: &str, key: &CacheKey) -> Option<Reservation<'_>> {
        if !self.is_enabled() {
            return None;
        }
        if self.budget.try_take() {
            return Some(self.reservation());
        }

        if self.sink.enabled(Level::DEBUG) {
            self.sink.log(
                Level::DEBUG,
                format_args!(
                    "Waiting to {} cache entry {}: error budget of {} is held by in-flight requests",
                    operation,
                    key,
                    self.description()
                ),
            );
        }

        let mut guard = self.budget.lock.lock();
        loop {
            if !self.is_enabled() {
                return None;
            }
            if self.budget.try_take() {
                return Some(self.reservation());
            }
            self.budget.changed.wait(&mut guard);
        }
    }

    fn reservation(&self) -> Reservation<'_> {
        Reservation {
            budget: &self.budget,
            spent: false,
        }
    }

    fn handle_error_during(
        &self,
        operation: &str,
        key: &CacheKey,
        error: &CacheError,
        reservation: Reservation<'_>,
    ) {
        reservation.spend();

        if self.sink.enabled(Level::INFO) {
            self.sink.log(
                Level::INFO,
                format_args!(
                    "Could not {} cache entry {}: {}",
                    operation,
                    key,
                    error_chain(error)
                ),
            );
        } else {
            self.sink.log(
                Level::WARN,
                format_args!("Could not {} cache entry {}: {}", operation, key, error),
            );
        }

        let remaining = self.remaining_errors.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining <= 0
            && self
                .enabled
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.budget.wake_all();
            self.sink.log(
                Level::WARN,
                format_args!(
                    "{} is now disabled because {} errors were encountered",
                    self.description(),
                    self.max_error_count
                ),
            );
        }
    }
}

/// Render an error with its source chain on one line
fn error_chain(error: &CacheError) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(rendered, ": {}", cause);
        source = cause.source();
    }
    rendered
}

impl<B: BuildCache> BuildCache for ResilientBuildCache<B> {
    /// Load through the delegate, reporting a miss when it fails
    ///
    /// A delegate that fails part-way through the body has already handed
    /// those bytes to `reader`. The call still returns `Ok(false)`, so a
    /// reader that writes somewhere durable must discard its partial output
    /// itself unless `read_from` completed.
    fn load(&self, key: &CacheKey, reader: &mut dyn EntryReader) -> CacheResult<bool> {
        let Some(reservation) = self.reserve("load", key) else {
            return Ok(false);
        };

        match self.delegate.load(key, reader) {
            Ok(hit) => Ok(hit),
            Err(e) => {
                self.handle_error_during("load", key, &e, reservation);
                Ok(false)
            }
        }
    }

    fn store(&self, key: &CacheKey, writer: &dyn EntryWriter) -> CacheResult<()> {
        let Some(reservation) = self.reserve("store", key) else {
            return Ok(());
        };

        if let Err(e) = self.delegate.store(key, writer) {
            self.handle_error_during("store", key, &e, reservation);
        }
        Ok(())
    }

    fn description(&self) -> String {
        self.delegate.description()
    }

    fn close(&self) -> CacheResult<()> {
        if !self.is_enabled() {
            self.sink.log(
                Level::WARN,
                format_args!(
                    "{} was disabled during the build after encountering {} errors.",
                    self.description(),
                    self.max_error_count
                ),
            );
        }
        self.delegate.close()
    }
}
