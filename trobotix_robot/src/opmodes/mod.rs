//! Op modes: named top-level sessions that bind commands to triggers.
//!
//! An op mode's [`OpMode::initialize`] runs once per process for its name.
//! Everything it binds goes onto the scheduler's default loop with an
//! op-mode context, so its bindings stay dormant while another op mode is
//! active and wake up again when it is re-entered.

pub mod teleop;

use trobotix_command::prelude::{CommandScheduler, Trigger, TriggerContext};

use crate::config::RobotConfig;
use crate::error::DriverError;
use crate::robot::Robot;

pub use teleop::{Drive, DrivetrainTest, TestTeleop};

pub trait OpMode {
    fn name(&self) -> &str;

    /// Bind this op mode's commands. Called once per process.
    fn initialize(&mut self, ctx: &mut OpModeContext<'_>) -> Result<(), DriverError>;
}

/// What an op mode sees while initializing.
pub struct OpModeContext<'a> {
    scheduler: &'a mut CommandScheduler,
    robot: &'a Robot,
    config: &'a RobotConfig,
    enabled: Trigger,
}

impl<'a> OpModeContext<'a> {
    pub fn new(
        scheduler: &'a mut CommandScheduler,
        robot: &'a Robot,
        config: &'a RobotConfig,
        enabled: Trigger,
    ) -> Self {
        Self {
            scheduler,
            robot,
            config,
            enabled,
        }
    }

    #[inline]
    pub fn scheduler(&mut self) -> &mut CommandScheduler {
        self.scheduler
    }

    #[inline]
    pub fn robot(&self) -> &'a Robot {
        self.robot
    }

    #[inline]
    pub fn config(&self) -> &'a RobotConfig {
        self.config
    }

    /// True while this op mode is active and the robot is enabled.
    #[inline]
    pub fn enabled(&self) -> &Trigger {
        &self.enabled
    }
}

/// Trigger that is true while the robot is enabled under op mode `name`.
pub fn enabled_trigger(scheduler: &CommandScheduler, name: &str) -> Trigger {
    Trigger::new(
        scheduler.default_loop(),
        |ctx| ctx.is_enabled(),
        TriggerContext::op_mode(name),
    )
}

/// Every op mode this build knows, by name.
pub const OP_MODES: [&str; 3] = [Drive::NAME, DrivetrainTest::NAME, TestTeleop::NAME];

/// Look up an op mode by name.
pub fn op_mode(name: &str) -> Result<Box<dyn OpMode>, DriverError> {
    match name {
        Drive::NAME => Ok(Box::new(Drive)),
        DrivetrainTest::NAME => Ok(Box::new(DrivetrainTest)),
        TestTeleop::NAME => Ok(Box::new(TestTeleop)),
        other => Err(DriverError::UnknownOpMode(other.to_string())),
    }
}
