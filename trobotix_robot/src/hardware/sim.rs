//! Simulated hub.
//!
//! Every motor port is a first-order DC motor model driving a fixed
//! inertia. Each [`Hub::bulk_read`] integrates the physics over one step
//! and refreshes the input cache, so sensors only change on bulk reads
//! exactly as on real hardware.

use std::f64::consts::TAU;
use std::time::Duration;

use tracing::{debug, trace};
use trobotix_common::consts::DEFAULT_CYCLE_TIME_US;

use super::gamepad::GamepadState;
use super::modeled_motor::DcMotor;
use super::{Hub, Port};
use crate::config::RobotConfig;
use crate::hardware::encoder::counts_per_rev;

const GAMEPAD_COUNT: usize = 2;

/// Physical parameters of one simulated motor port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimMotorSpec {
    pub counts_per_rev: f64,
    pub model: DcMotor,
    /// Rotor plus load inertia [kg·m²].
    pub inertia: f64,
}

impl Default for SimMotorSpec {
    fn default() -> Self {
        Self {
            counts_per_rev: counts_per_rev::GOBILDA_6000RPM,
            model: DcMotor::gobilda_5203_6000rpm(1),
            inertia: 1e-4,
        }
    }
}

#[derive(Debug)]
struct SimMotor {
    name: String,
    spec: SimMotorSpec,
    power: f64,
    brake: bool,
    /// Rotor angle [rad].
    angle: f64,
    /// Rotor speed [rad/s].
    omega: f64,
    current: f64,
    cached_counts: i64,
    cached_current: f64,
    writes: usize,
}

impl SimMotor {
    fn new(name: String, spec: SimMotorSpec) -> Self {
        Self {
            name,
            spec,
            power: 0.0,
            brake: false,
            angle: 0.0,
            omega: 0.0,
            current: 0.0,
            cached_counts: 0,
            cached_current: 0.0,
            writes: 0,
        }
    }

    fn step(&mut self, bus_voltage: f64, dt: f64) {
        let model = &self.spec.model;
        let idle = self.power == 0.0;
        let coasting = idle && !self.brake;

        self.current = if coasting {
            0.0
        } else {
            model.current(self.omega, self.power * bus_voltage)
        };

        let friction = if self.omega == 0.0 {
            0.0
        } else {
            model.torque(model.free_current_a) * self.omega.signum()
        };
        let torque = model.torque(self.current) - friction;
        let omega = self.omega + torque / self.spec.inertia * dt;

        // An unpowered rotor stops instead of reversing.
        self.omega = if idle && self.omega != 0.0 && omega.signum() != self.omega.signum() {
            0.0
        } else {
            omega
        };
        self.angle += self.omega * dt;
    }

    fn latch(&mut self) {
        self.cached_counts = (self.angle / TAU * self.spec.counts_per_rev).round() as i64;
        self.cached_current = self.current.abs();
    }
}

/// In-process hub used by the simulator binary and the tests.
#[derive(Debug)]
pub struct SimHub {
    motors: Vec<SimMotor>,
    gamepads: [GamepadState; GAMEPAD_COUNT],
    bus_voltage: f64,
    cached_bus_voltage: f64,
    step: Duration,
}

impl SimHub {
    pub fn new(bus_voltage: f64) -> Self {
        Self {
            motors: Vec::new(),
            gamepads: [GamepadState::default(); GAMEPAD_COUNT],
            bus_voltage,
            cached_bus_voltage: bus_voltage,
            step: Duration::from_micros(DEFAULT_CYCLE_TIME_US),
        }
    }

    /// Hub with every motor named in `config` attached.
    pub fn from_config(config: &RobotConfig) -> Self {
        let mut hub = Self::new(config.hub.bus_voltage);
        if config.cycle.period_us > 0 {
            hub.step = Duration::from_micros(config.cycle.period_us);
        }

        let dt = &config.drivetrain;
        for name in [&dt.front_left, &dt.front_right, &dt.back_left, &dt.back_right] {
            hub.add_motor(name, SimMotorSpec::default());
        }
        hub.add_motor(
            &config.test_motor.name,
            SimMotorSpec {
                counts_per_rev: config.test_motor.counts_per_rev,
                ..SimMotorSpec::default()
            },
        );
        debug!(
            motors = hub.motors.len(),
            step_us = hub.step.as_micros() as u64,
            "Simulated hub ready"
        );
        hub
    }

    /// Physics time advanced by every bulk read.
    #[must_use]
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    pub fn add_motor(&mut self, name: &str, spec: SimMotorSpec) -> Port {
        self.motors.push(SimMotor::new(name.to_string(), spec));
        self.motors.len() - 1
    }

    pub fn set_bus_voltage(&mut self, volts: f64) {
        self.bus_voltage = volts;
    }

    /// Ignored for indices past the last gamepad slot.
    pub fn set_gamepad(&mut self, index: usize, state: GamepadState) {
        if let Some(slot) = self.gamepads.get_mut(index) {
            *slot = state;
        }
    }

    /// Last power written to `port`.
    pub fn power(&self, port: Port) -> f64 {
        self.motors[port].power
    }

    pub fn brake(&self, port: Port) -> bool {
        self.motors[port].brake
    }

    /// Number of power writes `port` has received.
    pub fn writes(&self, port: Port) -> usize {
        self.motors[port].writes
    }

    /// Live rotor speed of `port` [rad/s].
    pub fn speed(&self, port: Port) -> f64 {
        self.motors[port].omega
    }
}

impl Hub for SimHub {
    fn port(&self, name: &str) -> Option<Port> {
        self.motors.iter().position(|m| m.name == name)
    }

    fn bulk_read(&mut self) {
        let dt = self.step.as_secs_f64();
        for motor in &mut self.motors {
            motor.step(self.bus_voltage, dt);
            motor.latch();
        }
        self.cached_bus_voltage = self.bus_voltage;
        trace!(dt, "Simulated hub bulk read");
    }

    fn bus_voltage(&self) -> f64 {
        self.cached_bus_voltage
    }

    fn encoder_counts(&self, port: Port) -> i64 {
        self.motors.get(port).map_or(0, |m| m.cached_counts)
    }

    fn motor_current(&self, port: Port) -> f64 {
        self.motors.get(port).map_or(0.0, |m| m.cached_current)
    }

    fn set_power(&mut self, port: Port, power: f64) {
        if let Some(motor) = self.motors.get_mut(port) {
            motor.power = power.clamp(-1.0, 1.0);
            motor.writes += 1;
        }
    }

    fn set_brake(&mut self, port: Port, brake: bool) {
        if let Some(motor) = self.motors.get_mut(port) {
            motor.brake = brake;
        }
    }

    fn gamepad(&self, index: usize) -> GamepadState {
        self.gamepads.get(index).copied().unwrap_or_default()
    }
}
