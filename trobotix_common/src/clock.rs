//! Monotonic time sources.
//!
//! Everything time-dependent in the control loop (debouncing, velocity
//! differentiation, cycle pacing) reads time through [`Clock`] so tests can
//! drive it deterministically. Timestamps are offsets from an arbitrary
//! origin and never go backwards.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// A monotonic timestamp source.
pub trait Clock {
    /// Current timestamp relative to the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock backed monotonic clock, origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually driven clock for tests and simulation.
///
/// With a non-zero `step`, every call to [`Clock::now`] returns the current
/// time and then advances it by `step`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    step: Duration,
}

impl ManualClock {
    /// Clock frozen at zero until [`advance`](Self::advance) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that advances by `step` after every read.
    pub fn with_step(step: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            step,
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to an absolute timestamp. Ignored if it would move backwards.
    pub fn set(&self, at: Duration) {
        if at >= self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}
