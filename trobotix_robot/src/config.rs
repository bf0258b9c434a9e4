//! Robot configuration (`config/robot.toml`).
//!
//! Every section except `[shared]` is optional and falls back to the
//! competition defaults below.

use serde::{Deserialize, Serialize};
use trobotix_common::config::{ConfigError, SharedConfig, Validate};
use trobotix_common::consts::{DEFAULT_CYCLE_TIME_US, NOMINAL_BUS_VOLTAGE};

use crate::hardware::encoder::counts_per_rev;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub drivetrain: DrivetrainConfig,
    #[serde(default)]
    pub test_motor: TestMotorConfig,
}

/// `[cycle]`: control loop pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Cycle period [µs]. `0` runs cycles back to back without sleeping.
    pub period_us: u64,
    /// Log a warning for every cycle that exceeds the period.
    pub warn_on_overrun: bool,
    /// End the session after this many back-to-back overruns. `0` never
    /// ends it.
    pub max_consecutive_overruns: u32,
    pub rt: RtConfig,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_us: DEFAULT_CYCLE_TIME_US,
            warn_on_overrun: true,
            max_consecutive_overruns: 0,
            rt: RtConfig::default(),
        }
    }
}

/// `[cycle.rt]`: control thread setup. Only applied in `rt` builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtConfig {
    pub lock_memory: bool,
    pub cpu_core: Option<usize>,
    /// `SCHED_FIFO` priority, 1..=99.
    pub priority: Option<i32>,
    /// Stack touched before the first cycle [KiB].
    pub stack_prefault_kib: usize,
}

impl Default for RtConfig {
    fn default() -> Self {
        Self {
            lock_memory: true,
            cpu_core: Some(1),
            priority: Some(80),
            stack_prefault_kib: 256,
        }
    }
}

/// `[session]`: which op mode to run and for how long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub op_mode: String,
    /// Stop after this many cycles. Runs until Ctrl-C when absent.
    pub max_cycles: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            op_mode: "TestTeleop".to_string(),
            max_cycles: None,
        }
    }
}

/// `[hub]`: simulated hub parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Bus voltage reported by the simulated hub [V].
    pub bus_voltage: f64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bus_voltage: NOMINAL_BUS_VOLTAGE,
        }
    }
}

/// `[drivetrain]`: mecanum drive geometry and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub front_left: String,
    pub front_right: String,
    pub back_left: String,
    pub back_right: String,
    /// Wheel ground speed at full duty cycle [m/s].
    pub max_speed_mps: f64,
    pub max_angular_speed_radps: f64,
    /// Left-right wheel spacing [m].
    pub track_width_m: f64,
    /// Front-back wheel spacing [m].
    pub wheel_base_m: f64,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            front_left: "FrontLeft".to_string(),
            front_right: "FrontRight".to_string(),
            back_left: "BackLeft".to_string(),
            back_right: "BackRight".to_string(),
            max_speed_mps: 1.5,
            max_angular_speed_radps: 2.0 * std::f64::consts::PI,
            track_width_m: 0.36,
            wheel_base_m: 0.32,
        }
    }
}

/// `[test_motor]`: current-limited bench motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestMotorConfig {
    pub name: String,
    pub counts_per_rev: f64,
    pub stator_current_limit_a: f64,
    pub supply_current_limit_a: f64,
    pub brake: bool,
    /// Duty-cycle change below which motor writes are skipped.
    pub tolerance: f64,
}

impl Default for TestMotorConfig {
    fn default() -> Self {
        Self {
            name: "TestMotor".to_string(),
            counts_per_rev: counts_per_rev::GOBILDA_6000RPM,
            stator_current_limit_a: 6.0,
            supply_current_limit_a: 4.0,
            brake: true,
            tolerance: 0.01,
        }
    }
}

/// Half of the usual 8 MiB main-thread stack.
const MAX_STACK_PREFAULT_KIB: usize = 4096;

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}

fn positive(value: f64, field: &str) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be > 0 (got {value})")))
    }
}

impl Validate for RobotConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.session.op_mode.trim().is_empty() {
            return Err(invalid("session.op_mode cannot be empty"));
        }
        if self.session.max_cycles == Some(0) {
            return Err(invalid("session.max_cycles must be > 0"));
        }

        let rt = &self.cycle.rt;
        if let Some(priority) = rt.priority
            && !(1..=99).contains(&priority)
        {
            return Err(invalid(format!(
                "cycle.rt.priority must be in 1..=99 (got {priority})"
            )));
        }
        if rt.stack_prefault_kib > MAX_STACK_PREFAULT_KIB {
            return Err(invalid(format!(
                "cycle.rt.stack_prefault_kib must be <= {MAX_STACK_PREFAULT_KIB}"
            )));
        }

        positive(self.hub.bus_voltage, "hub.bus_voltage")?;

        let dt = &self.drivetrain;
        positive(dt.max_speed_mps, "drivetrain.max_speed_mps")?;
        positive(dt.max_angular_speed_radps, "drivetrain.max_angular_speed_radps")?;
        positive(dt.track_width_m, "drivetrain.track_width_m")?;
        positive(dt.wheel_base_m, "drivetrain.wheel_base_m")?;
        let mut names = vec![
            &dt.front_left,
            &dt.front_right,
            &dt.back_left,
            &dt.back_right,
            &self.test_motor.name,
        ];
        names.sort();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(invalid("motor names must be unique"));
        }

        let tm = &self.test_motor;
        positive(tm.counts_per_rev, "test_motor.counts_per_rev")?;
        positive(tm.stator_current_limit_a, "test_motor.stator_current_limit_a")?;
        positive(tm.supply_current_limit_a, "test_motor.supply_current_limit_a")?;
        if !(0.0..1.0).contains(&tm.tolerance) {
            return Err(invalid(format!(
                "test_motor.tolerance must be in [0, 1) (got {})",
                tm.tolerance
            )));
        }
        Ok(())
    }
}
