//! Retry policy and sleep capability for the drain poll loop.
//!
//! The drain check's only suspension point is the fixed delay between
//! polls. The delay length and retry budget live in [`RetryPolicy`]; the
//! act of sleeping is behind the [`Sleep`] trait so tests can simulate
//! elapsed time without waiting.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Fixed-delay retry policy for the drain check.
///
/// `sleep_for` is in seconds and kept as an `f64` so status lines render
/// integral delays without decimals (`20`) and fractional delays with
/// their native precision (`0.001`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Seconds to sleep between polls.
    pub sleep_for: f64,
    /// Maximum number of retries; the loop body runs at most
    /// `loop_for + 1` times.
    pub loop_for: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            sleep_for: 20.0,
            loop_for: 15,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given delay (seconds) and retry budget.
    pub fn new(sleep_for: f64, loop_for: u32) -> Self {
        Self {
            sleep_for,
            loop_for,
        }
    }

    /// Wall-clock seconds consumed by `iterations` polls.
    pub fn elapsed(&self, iterations: u32) -> f64 {
        f64::from(iterations) * self.sleep_for
    }

    /// Worst-case wall-clock seconds before the budget runs out.
    pub fn budget(&self) -> f64 {
        self.elapsed(self.loop_for)
    }
}

/// Trait for suspending between polls.
pub trait Sleep: Send + Debug {
    /// Block for `seconds`.
    fn sleep(&mut self, seconds: f64);
}

/// Real blocking sleep via [`std::thread::sleep`].
///
/// Uninterruptible except by process termination; the retry budget is the
/// only bound on total wall-clock time.
#[derive(Debug, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            thread::sleep(Duration::from_secs_f64(seconds));
        }
    }
}

/// Records requested sleeps without waiting. Cloning shares the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleep {
    slept: Arc<Mutex<Vec<f64>>>,
}

impl RecordingSleep {
    /// Create a sleeper with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sleep requested so far, in seconds.
    pub fn slept(&self) -> Vec<f64> {
        self.slept.lock().unwrap().clone()
    }

    /// Total simulated seconds slept.
    pub fn total(&self) -> f64 {
        self.slept.lock().unwrap().iter().sum()
    }
}

impl Sleep for RecordingSleep {
    fn sleep(&mut self, seconds: f64) {
        self.slept.lock().unwrap().push(seconds);
    }
}
