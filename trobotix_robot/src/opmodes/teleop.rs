//! Driver-controlled op modes.

use trobotix_command::prelude::Decorate;

use super::{OpMode, OpModeContext};
use crate::error::DriverError;
use crate::subsystems::drivetrain::ChassisSpeeds;

/// Field driving from the primary gamepad. `A` toggles the test motor at
/// the secondary gamepad's right trigger.
pub struct Drive;

impl Drive {
    pub const NAME: &'static str = "Drive";
}

impl OpMode for Drive {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, ctx: &mut OpModeContext<'_>) -> Result<(), DriverError> {
        let robot = ctx.robot();
        let limits = &ctx.config().drivetrain;
        let (max_speed, max_angular) = (limits.max_speed_mps, limits.max_angular_speed_radps);

        let pad = robot.primary.clone();
        let drive = robot.drivetrain.drive(move || {
            let state = pad.state();
            ChassisSpeeds::new(
                -state.left_y * max_speed,
                -state.left_x * max_speed,
                -state.right_x * max_angular,
            )
        });
        let drive = ctx.scheduler().add_command(drive)?;
        ctx.enabled().while_true(drive);

        let secondary = robot.secondary.clone();
        let spin = robot
            .test_motor
            .move_with(move || secondary.state().right_trigger);
        let spin = ctx.scheduler().add_command(spin)?;
        ctx.enabled().and(&robot.primary.a()).toggle_on_true(spin);
        Ok(())
    }
}

/// Forward/back only, straight from the left stick.
pub struct DrivetrainTest;

impl DrivetrainTest {
    pub const NAME: &'static str = "DrivetrainTest";
}

impl OpMode for DrivetrainTest {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, ctx: &mut OpModeContext<'_>) -> Result<(), DriverError> {
        let robot = ctx.robot();
        let pad = robot.primary.clone();
        let drive = robot
            .drivetrain
            .drive(move || ChassisSpeeds::new(-pad.left_y(), 0.0, 0.0))
            .with_name("DrivetrainTest");
        let drive = ctx.scheduler().add_command(drive)?;
        ctx.enabled().while_true(drive);
        Ok(())
    }
}

/// Bench session: full forward on the drivetrain and the test motor at the
/// primary gamepad's right trigger, no driver steering.
pub struct TestTeleop;

impl TestTeleop {
    pub const NAME: &'static str = "TestTeleop";
}

impl OpMode for TestTeleop {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&mut self, ctx: &mut OpModeContext<'_>) -> Result<(), DriverError> {
        let robot = ctx.robot();
        let drive = robot
            .drivetrain
            .drive(|| ChassisSpeeds::new(1.0, 0.0, 0.0));
        let drive = ctx.scheduler().add_command(drive)?;
        ctx.enabled().while_true(drive);

        let pad = robot.primary.clone();
        let spin = robot
            .test_motor
            .move_with(move || pad.state().right_trigger);
        let spin = ctx.scheduler().add_command(spin)?;
        ctx.enabled().while_true(spin);
        Ok(())
    }
}
