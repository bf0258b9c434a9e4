//! Prelude module for common re-exports.
//!
//! ```rust
//! use trobotix_common::prelude::*;
//! ```

// ─── Time ───────────────────────────────────────────────────────────
pub use crate::clock::{Clock, ManualClock, MonotonicClock};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{ALWAYS_CONTEXT, DEFAULT_CYCLE_TIME_US, MAX_SUBSYSTEMS};
