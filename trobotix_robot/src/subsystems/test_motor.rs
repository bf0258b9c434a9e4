//! Current-limited bench motor.

use trobotix_command::prelude::{Decorate, RunCommand, Subsystem};
use trobotix_common::consts::NOMINAL_BUS_VOLTAGE;

use super::Registered;
use crate::config::TestMotorConfig;
use crate::error::DriverError;
use crate::hardware::HardwareMap;
use crate::hardware::modeled_motor::{DcMotor, LimitedVoltage, ModeledMotor};
use crate::telemetry::Telemetry;

pub struct TestMotor {
    name: String,
    motor: ModeledMotor,
    telemetry: Telemetry,
    last_command: Option<LimitedVoltage>,
}

impl TestMotor {
    pub fn new(
        hardware: &HardwareMap,
        config: &TestMotorConfig,
        telemetry: &Telemetry,
    ) -> Result<Self, DriverError> {
        let mut motor = ModeledMotor::new(
            hardware.motor(&config.name)?,
            hardware.encoder(&config.name, config.counts_per_rev)?,
            DcMotor::gobilda_5203_6000rpm(1),
            config.stator_current_limit_a,
            config.supply_current_limit_a,
        );
        motor.set_brake(config.brake);
        motor.set_tolerance(config.tolerance);

        Ok(Self {
            name: config.name.clone(),
            motor,
            telemetry: telemetry.clone(),
            last_command: None,
        })
    }

    pub fn set_voltage(&mut self, volts: f64) {
        let command = self.motor.set_voltage(volts);
        self.telemetry
            .add_data(format!("{}/Commanded Voltage", self.name), command.requested);
        self.telemetry.add_data(
            format!("{}/Actual Voltage", self.name),
            self.motor.duty_cycle() * self.motor.motor().bus_voltage(),
        );
        self.last_command = Some(command);
    }

    #[inline]
    pub fn last_command(&self) -> Option<LimitedVoltage> {
        self.last_command
    }

    #[inline]
    pub fn motor(&self) -> &ModeledMotor {
        &self.motor
    }
}

impl Subsystem for TestMotor {
    fn name(&self) -> &str {
        &self.name
    }

    fn periodic(&mut self) {
        let stator = self.motor.motor().current();
        let encoder = self.motor.encoder();
        let t = &self.telemetry;
        t.add_data(format!("{}/Stator Current", self.name), stator);
        t.add_data(
            format!("{}/Supply Current", self.name),
            stator * self.motor.duty_cycle().abs(),
        );
        t.add_data(format!("{}/Position (Rotations)", self.name), encoder.position());
        t.add_data(format!("{}/Velocity (RPM)", self.name), encoder.velocity() * 60.0);
    }
}

impl Registered<TestMotor> {
    /// Drive at `input() * 12 V` each tick; `input` is in `[-1, 1]`.
    pub fn move_with<F>(&self, mut input: F) -> RunCommand<impl FnMut() + use<F>>
    where
        F: FnMut() -> f64 + 'static,
    {
        self.run(move |motor| motor.set_voltage(input() * NOMINAL_BUS_VOLTAGE))
            .with_name("MoveTestMotor")
    }

    pub fn stop(&self) -> RunCommand<impl FnMut() + use<>> {
        self.run(|motor: &mut TestMotor| motor.set_voltage(0.0))
            .with_name("StopTestMotor")
    }
}
