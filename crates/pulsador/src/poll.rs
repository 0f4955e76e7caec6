//! Bounded polling.
//!
//! The system's only concurrency-adjacent construct: cooperative waiting on a
//! single thread. A poll session is a query closure, a total budget, and a
//! step interval; the first `Some` wins, and an exhausted budget yields
//! `None`. "Not found" is a normal negative outcome that callers branch on
//! explicitly — it is never an error.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::{DEFAULT_POLL_STEP_MS, DEFAULT_POLL_TIMEOUT_MS};

/// Budget and step interval for one poll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOptions {
    /// Total budget in milliseconds
    pub timeout_ms: u64,
    /// Step interval in milliseconds
    pub step_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            step_ms: DEFAULT_POLL_STEP_MS,
        }
    }
}

impl PollOptions {
    /// Create options with the default 2000ms/80ms budget
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total budget in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the step interval in milliseconds
    #[must_use]
    pub const fn with_step(mut self, step_ms: u64) -> Self {
        self.step_ms = step_ms;
        self
    }

    /// Total budget as a Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Step interval as a Duration
    #[must_use]
    pub const fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }
}

/// Repeatedly evaluate a query until it yields a value or the budget runs out.
///
/// The first probe happens immediately; subsequent probes follow at the step
/// interval. Returns `None` when the budget elapses without a match. A zero
/// budget performs no probe at all.
pub fn poll_until<T, F>(mut query: F, options: &PollOptions) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let start = Instant::now();
    while start.elapsed() < options.timeout() {
        if let Some(value) = query() {
            return Some(value);
        }
        std::thread::sleep(options.step());
    }
    None
}
