//! Time-based boolean debouncer.
//!
//! Driven entirely by the caller-supplied monotonic timestamp, so the same
//! sequence of `(input, now)` samples always yields the same output.

use std::time::Duration;

/// Which transitions must hold for the full period before being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceType {
    /// false → true is delayed; true → false is immediate.
    #[default]
    Rising,
    /// true → false is delayed; false → true is immediate.
    Falling,
    /// Both transitions are delayed.
    Both,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    period: Duration,
    kind: DebounceType,
    baseline: bool,
    changed_since: Option<Duration>,
}

impl Debouncer {
    pub fn new(period: Duration, kind: DebounceType) -> Self {
        Self {
            period,
            kind,
            baseline: matches!(kind, DebounceType::Falling),
            changed_since: None,
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn kind(&self) -> DebounceType {
        self.kind
    }

    /// Feed one sample taken at `now` and return the debounced value.
    ///
    /// A sample equal to the baseline resets the timer.
    pub fn calculate(&mut self, input: bool, now: Duration) -> bool {
        if input == self.baseline {
            self.changed_since = None;
            return self.baseline;
        }

        let since = *self.changed_since.get_or_insert(now);
        if now.saturating_sub(since) >= self.period {
            if self.kind == DebounceType::Both {
                self.baseline = input;
                self.changed_since = None;
            }
            input
        } else {
            self.baseline
        }
    }
}
