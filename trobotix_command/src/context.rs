//! Per-tick run context.
//!
//! The periodic driver builds one [`RunContext`] per cycle and passes it to
//! [`CommandScheduler::run`](crate::scheduler::CommandScheduler::run). Every
//! trigger condition and every command hook sees the same value for the
//! whole tick: which op mode is active, whether the robot is enabled, and
//! the monotonic timestamp of the cycle start.

use std::rc::Rc;
use std::time::Duration;

/// Driver-owned state threaded through condition evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunContext {
    active_op_mode: Option<Rc<str>>,
    enabled: bool,
    timestamp: Duration,
}

impl RunContext {
    /// Disabled context with no active op mode.
    pub fn new(timestamp: Duration) -> Self {
        Self {
            active_op_mode: None,
            enabled: false,
            timestamp,
        }
    }

    #[must_use]
    pub fn with_op_mode(mut self, name: impl Into<Rc<str>>) -> Self {
        self.active_op_mode = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Name of the op mode currently running, if any.
    #[inline]
    pub fn active_op_mode(&self) -> Option<&str> {
        self.active_op_mode.as_deref()
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Monotonic timestamp of the current cycle start.
    #[inline]
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn set_op_mode(&mut self, name: impl Into<Rc<str>>) {
        self.active_op_mode = Some(name.into());
    }

    pub fn clear_op_mode(&mut self) {
        self.active_op_mode = None;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_timestamp(&mut self, timestamp: Duration) {
        self.timestamp = timestamp;
    }
}
