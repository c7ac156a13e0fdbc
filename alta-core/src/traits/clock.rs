//! Sample ticker and stop signal
//!
//! The control loop is single-threaded. The only suspension point is the
//! fixed-period wait between ticks.

use core::sync::atomic::{AtomicBool, Ordering};

/// Fixed-period sample clock
pub trait Ticker {
    /// Monotonic time in milliseconds
    ///
    /// Wraps after ~49 days; callers only take differences.
    fn now_ms(&mut self) -> u32;

    /// Block until the next sample period starts
    fn wait(&mut self);
}

/// External request to stop the run, polled between trials
pub trait StopSignal {
    /// Check whether the run should stop after the current trial
    fn stop_requested(&mut self) -> bool;
}

impl StopSignal for AtomicBool {
    fn stop_requested(&mut self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl StopSignal for &AtomicBool {
    fn stop_requested(&mut self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Stop signal that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn stop_requested(&mut self) -> bool {
        false
    }
}

/// Stop after a fixed number of trials
///
/// The signal is polled once per completed trial, so the first trial always
/// runs and `new(0)` behaves like `new(1)`.
#[derive(Debug, Clone, Copy)]
pub struct StopAfter {
    remaining: u32,
}

impl StopAfter {
    /// Allow exactly `trials` trials
    pub const fn new(trials: u32) -> Self {
        Self { remaining: trials }
    }
}

impl StopSignal for StopAfter {
    fn stop_requested(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_after() {
        // One poll per completed trial
        let mut stop = StopAfter::new(2);
        assert!(!stop.stop_requested());
        assert!(stop.stop_requested());
        assert!(stop.stop_requested());
    }

    #[test]
    fn test_stop_after_zero_stops_at_first_poll() {
        let mut stop = StopAfter::new(0);
        assert!(stop.stop_requested());
    }

    #[test]
    fn test_atomic_stop() {
        let flag = AtomicBool::new(false);
        let mut signal = &flag;
        assert!(!signal.stop_requested());
        flag.store(true, Ordering::Relaxed);
        assert!(signal.stop_requested());
    }
}
