//! Retry-based synchronization.
//!
//! [`Synchronizer`] runs an attempt until it succeeds, fails with an error
//! that is not retryable, or the wall-clock budget is spent. Between
//! attempts it sleeps a fixed interval on the calling thread and optionally
//! reloads its subject.
//!
//! Retryable errors are the element-not-found family plus whatever kinds
//! the driver declares (see [`Driver::invalid_element_errors`]). When the
//! budget runs out the last retryable error is returned as is, so callers
//! see the real cause.
//!
//! Calls nest: a synchronized operation started inside another one on the
//! same thread runs its attempt exactly once and leaves retrying to the
//! outermost call.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use locator_engine::Synchronizer;
//!
//! let element = Synchronizer::new(Duration::from_secs(2))
//!     .interval(Duration::from_millis(50))
//!     .run(|| query.resolve_for(&document, None)?.first().cloned().ok_or_else(not_found))?;
//! ```
//!
//! [`Driver::invalid_element_errors`]: crate::driver::Driver::invalid_element_errors

// ============================================================================
// Imports
// ============================================================================

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::DEFAULT_RETRY_INTERVAL;
use crate::error::{Error, ErrorKind, Result};

// ============================================================================
// Nesting
// ============================================================================

thread_local! {
    /// Set while a synchronized operation runs on this thread.
    static SYNCHRONIZING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the thread as synchronizing until dropped.
struct NestingGuard;

impl NestingGuard {
    /// Returns `None` if the thread is already synchronizing.
    fn enter() -> Option<Self> {
        if SYNCHRONIZING.get() {
            return None;
        }
        SYNCHRONIZING.set(true);
        Some(Self)
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        SYNCHRONIZING.set(false);
    }
}

/// Returns `true` while a synchronized operation runs on this thread.
#[must_use]
pub fn is_synchronizing() -> bool {
    SYNCHRONIZING.get()
}

// ============================================================================
// Classification
// ============================================================================

/// Returns `true` if `error` should be retried: the element-not-found
/// family, or one of the `extra` kinds.
#[must_use]
pub fn is_retryable(error: &Error, extra: &[ErrorKind]) -> bool {
    error.is_element_error() || extra.contains(&error.kind())
}

// ============================================================================
// Synchronizer
// ============================================================================

type ReloadHook<'a> = Box<dyn FnMut() -> Result<()> + 'a>;
type ReloadPredicate<'a> = Box<dyn Fn(&Error) -> bool + 'a>;

/// Bounded retry loop.
pub struct Synchronizer<'a> {
    max_wait: Duration,
    interval: Duration,
    wait_supported: bool,
    retry_element_errors: bool,
    retry_on: Vec<ErrorKind>,
    reload: Option<ReloadHook<'a>>,
    reload_if: Option<ReloadPredicate<'a>>,
}

impl<'a> Synchronizer<'a> {
    /// Creates a synchronizer that retries for up to `max_wait`.
    #[must_use]
    pub fn new(max_wait: Duration) -> Self {
        Self {
            max_wait,
            interval: DEFAULT_RETRY_INTERVAL,
            wait_supported: true,
            retry_element_errors: true,
            retry_on: Vec::new(),
            reload: None,
            reload_if: None,
        }
    }

    /// Sets the sleep between attempts.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// With `false`, every run makes exactly one attempt.
    #[must_use]
    pub fn wait_supported(mut self, supported: bool) -> Self {
        self.wait_supported = supported;
        self
    }

    /// Adds error kinds to retry beyond the element-not-found family.
    #[must_use]
    pub fn retry_on(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.retry_on.extend(kinds);
        self
    }

    /// Retries exactly `kinds`, replacing the element-not-found family and
    /// any kinds added before.
    #[must_use]
    pub fn retry_only(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.retry_element_errors = false;
        self.retry_on = kinds.into_iter().collect();
        self
    }

    /// Runs `reload` after each sleep, before the next attempt.
    #[must_use]
    pub fn reload_with<F>(mut self, reload: F) -> Self
    where
        F: FnMut() -> Result<()> + 'a,
    {
        self.reload = Some(Box::new(reload));
        self
    }

    /// Limits reloading to failures for which `predicate` holds.
    #[must_use]
    pub fn reload_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Error) -> bool + 'a,
    {
        self.reload_if = Some(Box::new(predicate));
        self
    }

    /// Returns `true` if `error` is retried by this synchronizer.
    #[must_use]
    pub fn is_retryable(&self, error: &Error) -> bool {
        if self.retry_element_errors {
            is_retryable(error, &self.retry_on)
        } else {
            self.retry_on.contains(&error.kind())
        }
    }

    /// Runs `attempt` until it succeeds or the budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last retryable one
    /// once `max_wait` has elapsed. Reload failures propagate.
    pub fn run<T, F>(mut self, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let Some(_guard) = NestingGuard::enter() else {
            return attempt();
        };

        let start = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let error = match attempt() {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(attempts, elapsed_ms = start.elapsed().as_millis(), "Synchronized");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !self.wait_supported || !self.is_retryable(&error) {
                return Err(error);
            }
            if start.elapsed() >= self.max_wait {
                debug!(attempts, error = %error, "Synchronization budget spent");
                return Err(error);
            }

            debug!(attempt = attempts, error = %error, "Retrying");
            thread::sleep(self.interval);
            self.reload_after(&error)?;
        }
    }

    /// Polls `condition` until it returns `true` or the budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the last retryable error seen, [`Error::Timeout`] if the
    /// condition only ever returned `false`, or the first non-retryable
    /// error.
    pub fn until<F>(mut self, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Result<bool>,
    {
        let Some(_guard) = NestingGuard::enter() else {
            return match condition() {
                Ok(true) => Ok(()),
                Ok(false) => Err(self.timeout()),
                Err(e) => Err(e),
            };
        };

        let start = Instant::now();
        let mut last_error = None;
        loop {
            match condition() {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) if self.wait_supported && self.is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }

            if !self.wait_supported || start.elapsed() >= self.max_wait {
                return Err(last_error.unwrap_or_else(|| self.timeout()));
            }

            thread::sleep(self.interval);
            if let Some(error) = &last_error {
                self.reload_after(error)?;
            }
        }
    }

    fn reload_after(&mut self, error: &Error) -> Result<()> {
        let wanted = self.reload_if.as_ref().is_none_or(|predicate| predicate(error));
        match &mut self.reload {
            Some(reload) if wanted => reload(),
            _ => Ok(()),
        }
    }

    fn timeout(&self) -> Error {
        let ms = u64::try_from(self.max_wait.as_millis()).unwrap_or(u64::MAX);
        Error::timeout("wait_until", ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
