//! Workspace-wide constants.
//!
//! Single source of truth for numeric limits and default paths.

use static_assertions::const_assert;

/// Maximum number of subsystems a scheduler can arbitrate.
///
/// Requirement sets are stored as a 64-bit mask, one bit per subsystem.
pub const MAX_SUBSYSTEMS: usize = 64;

/// Trigger context that is active regardless of the running op mode.
pub const ALWAYS_CONTEXT: &str = "ALWAYS";

/// Default control cycle period in microseconds (100 Hz).
pub const DEFAULT_CYCLE_TIME_US: u64 = 10_000;

/// Nominal hub bus voltage [V].
pub const NOMINAL_BUS_VOLTAGE: f64 = 12.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/robot.toml";

const_assert!(MAX_SUBSYSTEMS <= u64::BITS as usize);
const_assert!(DEFAULT_CYCLE_TIME_US > 0);
