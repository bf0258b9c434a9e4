//! The robot aggregate: every subsystem and controller, built once.

use trobotix_command::prelude::CommandScheduler;
use tracing::info;

use crate::config::RobotConfig;
use crate::error::DriverError;
use crate::hardware::HardwareMap;
use crate::hardware::gamepad::CommandGamepad;
use crate::subsystems::Registered;
use crate::subsystems::drivetrain::Drivetrain;
use crate::subsystems::test_motor::TestMotor;
use crate::telemetry::Telemetry;

pub struct Robot {
    pub drivetrain: Registered<Drivetrain>,
    pub test_motor: Registered<TestMotor>,
    pub primary: CommandGamepad,
    pub secondary: CommandGamepad,
}

impl Robot {
    /// Build every subsystem, register it with `scheduler` and install the
    /// default commands.
    pub fn new(
        scheduler: &mut CommandScheduler,
        hardware: &HardwareMap,
        telemetry: &Telemetry,
        config: &RobotConfig,
    ) -> Result<Self, DriverError> {
        let drivetrain = Registered::register(
            scheduler,
            Drivetrain::new(hardware, &config.drivetrain, telemetry)?,
        )?;
        let test_motor = Registered::register(
            scheduler,
            TestMotor::new(hardware, &config.test_motor, telemetry)?,
        )?;

        let stop = scheduler.add_command(drivetrain.stop())?;
        scheduler.set_default_command(drivetrain.id(), stop)?;
        let hold = scheduler.add_command(test_motor.stop())?;
        scheduler.set_default_command(test_motor.id(), hold)?;

        let default_loop = scheduler.default_loop();
        let primary = CommandGamepad::new(default_loop, hardware.hub().clone(), 0);
        let secondary = CommandGamepad::new(default_loop, hardware.hub().clone(), 1);

        info!(
            drivetrain = %drivetrain.id(),
            test_motor = %test_motor.id(),
            "Robot initialized"
        );
        Ok(Self {
            drivetrain,
            test_motor,
            primary,
            secondary,
        })
    }
}
