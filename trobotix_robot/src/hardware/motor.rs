//! Duty-cycle motor output.

use super::{Port, SharedHub};

const DEFAULT_TOLERANCE: f64 = 0.01;

/// Motor output with write suppression.
///
/// Commands are clamped to `[-1, 1]` and only written to the hub when they
/// differ from the last written value by more than the tolerance.
pub struct Motor {
    hub: SharedHub,
    port: Port,
    name: String,
    inverted: bool,
    last_duty_cycle: f64,
    tolerance: f64,
}

impl Motor {
    pub fn new(hub: SharedHub, port: Port, name: impl Into<String>) -> Self {
        Self {
            hub,
            port,
            name: name.into(),
            inverted: false,
            last_duty_cycle: 0.0,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_brake(&mut self, brake: bool) {
        self.hub.borrow_mut().set_brake(self.port, brake);
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    /// Command a duty cycle in `[-1, 1]`.
    pub fn set(&mut self, duty_cycle: f64) {
        let duty_cycle = duty_cycle.clamp(-1.0, 1.0);
        if (self.last_duty_cycle - duty_cycle).abs() <= self.tolerance {
            return;
        }
        let power = if self.inverted { -duty_cycle } else { duty_cycle };
        self.hub.borrow_mut().set_power(self.port, power);
        self.last_duty_cycle = duty_cycle;
    }

    /// Command a voltage, scaled by the cached bus voltage.
    pub fn set_voltage(&mut self, volts: f64) {
        let bus_voltage = self.hub.borrow().bus_voltage();
        self.set(volts / bus_voltage);
    }

    /// Last duty cycle actually written.
    #[inline]
    pub fn duty_cycle(&self) -> f64 {
        self.last_duty_cycle
    }

    /// Stator current [A] from the last bulk read.
    pub fn current(&self) -> f64 {
        self.hub.borrow().motor_current(self.port)
    }

    pub fn bus_voltage(&self) -> f64 {
        self.hub.borrow().bus_voltage()
    }
}
