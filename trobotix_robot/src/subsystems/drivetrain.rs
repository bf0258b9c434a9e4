//! Mecanum drivetrain.

use trobotix_command::prelude::{Decorate, RunCommand, Subsystem};

use super::Registered;
use crate::config::DrivetrainConfig;
use crate::error::DriverError;
use crate::hardware::HardwareMap;
use crate::hardware::motor::Motor;
use crate::telemetry::Telemetry;

/// Robot-relative chassis velocity. `vx` forward and `vy` left [m/s],
/// `omega` counter-clockwise [rad/s].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSpeeds {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

impl ChassisSpeeds {
    pub const ZERO: Self = Self {
        vx: 0.0,
        vy: 0.0,
        omega: 0.0,
    };

    pub const fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }
}

/// Wheel duty cycles in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelDutyCycles {
    pub front_left: f64,
    pub front_right: f64,
    pub back_left: f64,
    pub back_right: f64,
}

impl WheelDutyCycles {
    fn max_abs(&self) -> f64 {
        [self.front_left, self.front_right, self.back_left, self.back_right]
            .into_iter()
            .fold(0.0, |acc, v| acc.max(v.abs()))
    }

    fn scaled(self, k: f64) -> Self {
        Self {
            front_left: self.front_left * k,
            front_right: self.front_right * k,
            back_left: self.back_left * k,
            back_right: self.back_right * k,
        }
    }
}

/// Mecanum inverse kinematics, normalized by `max_speed_mps`. When any wheel
/// would exceed full duty, all four are scaled down together so the
/// direction of travel is kept.
pub fn mecanum_duty_cycles(speeds: ChassisSpeeds, config: &DrivetrainConfig) -> WheelDutyCycles {
    let k = (config.track_width_m + config.wheel_base_m) / 2.0;
    let turn = k * speeds.omega;
    let raw = WheelDutyCycles {
        front_left: speeds.vx - speeds.vy - turn,
        front_right: speeds.vx + speeds.vy + turn,
        back_left: speeds.vx + speeds.vy - turn,
        back_right: speeds.vx - speeds.vy + turn,
    }
    .scaled(1.0 / config.max_speed_mps);

    let max = raw.max_abs();
    if max > 1.0 { raw.scaled(1.0 / max) } else { raw }
}

pub struct Drivetrain {
    front_left: Motor,
    front_right: Motor,
    back_left: Motor,
    back_right: Motor,
    config: DrivetrainConfig,
    telemetry: Telemetry,
    commanded: ChassisSpeeds,
    output: WheelDutyCycles,
}

impl Drivetrain {
    pub fn new(
        hardware: &HardwareMap,
        config: &DrivetrainConfig,
        telemetry: &Telemetry,
    ) -> Result<Self, DriverError> {
        let front_left = hardware.motor(&config.front_left)?;
        let mut front_right = hardware.motor(&config.front_right)?;
        let back_left = hardware.motor(&config.back_left)?;
        let mut back_right = hardware.motor(&config.back_right)?;
        front_right.set_inverted(true);
        back_right.set_inverted(true);

        let mut drivetrain = Self {
            front_left,
            front_right,
            back_left,
            back_right,
            config: config.clone(),
            telemetry: telemetry.clone(),
            commanded: ChassisSpeeds::ZERO,
            output: WheelDutyCycles::default(),
        };
        for motor in drivetrain.motors_mut() {
            motor.set_brake(true);
        }
        Ok(drivetrain)
    }

    fn motors_mut(&mut self) -> [&mut Motor; 4] {
        [
            &mut self.front_left,
            &mut self.front_right,
            &mut self.back_left,
            &mut self.back_right,
        ]
    }

    pub fn drive(&mut self, speeds: ChassisSpeeds) {
        let duty = mecanum_duty_cycles(speeds, &self.config);
        self.front_left.set(duty.front_left);
        self.front_right.set(duty.front_right);
        self.back_left.set(duty.back_left);
        self.back_right.set(duty.back_right);
        self.commanded = speeds;
        self.output = duty;
    }

    pub fn stop(&mut self) {
        self.drive(ChassisSpeeds::ZERO);
    }

    #[inline]
    pub fn commanded(&self) -> ChassisSpeeds {
        self.commanded
    }

    #[inline]
    pub fn output(&self) -> WheelDutyCycles {
        self.output
    }

    #[inline]
    pub fn config(&self) -> &DrivetrainConfig {
        &self.config
    }
}

impl Subsystem for Drivetrain {
    fn name(&self) -> &str {
        "Drivetrain"
    }

    fn periodic(&mut self) {
        self.telemetry
            .add_speeds("Drivetrain/Commanded Speeds", self.commanded);
        self.telemetry
            .add_data("Drivetrain/Front Left", self.front_left.duty_cycle());
        self.telemetry
            .add_data("Drivetrain/Front Right", self.front_right.duty_cycle());
        self.telemetry
            .add_data("Drivetrain/Back Left", self.back_left.duty_cycle());
        self.telemetry
            .add_data("Drivetrain/Back Right", self.back_right.duty_cycle());
    }
}

impl Registered<Drivetrain> {
    /// Drive at the speeds `supplier` returns each tick.
    pub fn drive<F>(&self, mut supplier: F) -> RunCommand<impl FnMut() + use<F>>
    where
        F: FnMut() -> ChassisSpeeds + 'static,
    {
        self.run(move |drivetrain| drivetrain.drive(supplier()))
            .with_name("Drive")
    }

    /// Hold every wheel at zero.
    pub fn stop(&self) -> RunCommand<impl FnMut() + use<>> {
        self.run(Drivetrain::stop).with_name("Stop")
    }
}
