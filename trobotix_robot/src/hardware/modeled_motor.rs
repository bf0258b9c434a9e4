//! Current-limited motor built on a brushed DC motor model.
//!
//! The hub only offers duty-cycle output, so stator and supply current
//! limits are enforced by capping the commanded voltage at the value the
//! motor model says produces the limiting current at the measured speed.

use std::f64::consts::TAU;

use super::encoder::Encoder;
use super::motor::Motor;

/// Steady-state brushed DC motor model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcMotor {
    pub nominal_voltage: f64,
    pub stall_torque_nm: f64,
    pub stall_current_a: f64,
    pub free_current_a: f64,
    pub free_speed_rad_per_sec: f64,
    /// Winding resistance [Ω].
    pub r_ohms: f64,
    /// Velocity constant [rad/s per V].
    pub kv: f64,
    /// Torque constant [Nm per A].
    pub kt: f64,
}

impl DcMotor {
    pub fn new(
        nominal_voltage: f64,
        stall_torque_nm: f64,
        stall_current_a: f64,
        free_current_a: f64,
        free_speed_rad_per_sec: f64,
        motor_count: u32,
    ) -> Self {
        let n = f64::from(motor_count);
        let stall_torque_nm = stall_torque_nm * n;
        let stall_current_a = stall_current_a * n;
        let free_current_a = free_current_a * n;
        let r_ohms = nominal_voltage / stall_current_a;
        Self {
            nominal_voltage,
            stall_torque_nm,
            stall_current_a,
            free_current_a,
            free_speed_rad_per_sec,
            r_ohms,
            kv: free_speed_rad_per_sec / (nominal_voltage - r_ohms * free_current_a),
            kt: stall_torque_nm / stall_current_a,
        }
    }

    /// goBILDA 5203 Yellow Jacket, 1:1 (6000 RPM).
    pub fn gobilda_5203_6000rpm(motor_count: u32) -> Self {
        Self::new(12.0, 0.1442, 9.2, 0.25, rpm_to_rad_per_sec(6000.0), motor_count)
    }

    #[inline]
    pub fn torque(&self, current_a: f64) -> f64 {
        current_a * self.kt
    }

    /// Voltage that produces `torque_nm` at `speed_rad_per_sec`.
    #[inline]
    pub fn voltage(&self, torque_nm: f64, speed_rad_per_sec: f64) -> f64 {
        speed_rad_per_sec / self.kv + self.r_ohms * torque_nm / self.kt
    }

    /// Stator current drawn at `speed_rad_per_sec` with `voltage` applied.
    #[inline]
    pub fn current(&self, speed_rad_per_sec: f64, voltage: f64) -> f64 {
        (voltage - speed_rad_per_sec / self.kv) / self.r_ohms
    }
}

#[inline]
pub fn rpm_to_rad_per_sec(rpm: f64) -> f64 {
    rpm * TAU / 60.0
}

#[inline]
pub fn rad_per_sec_to_rpm(rad_per_sec: f64) -> f64 {
    rad_per_sec * 60.0 / TAU
}

/// Voltage command after limiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitedVoltage {
    pub requested: f64,
    pub applied: f64,
    /// Effective stator current limit at the measured speed [A].
    pub stator_limit_a: f64,
}

pub struct ModeledMotor {
    motor: Motor,
    encoder: Encoder,
    model: DcMotor,
    stator_current_limit_a: f64,
    supply_current_limit_a: f64,
}

impl ModeledMotor {
    pub fn new(
        motor: Motor,
        encoder: Encoder,
        model: DcMotor,
        stator_current_limit_a: f64,
        supply_current_limit_a: f64,
    ) -> Self {
        Self {
            motor,
            encoder,
            model,
            stator_current_limit_a,
            supply_current_limit_a,
        }
    }

    /// Effective stator current limit [A] at `vel_rad_per_sec`.
    ///
    /// The supply limit becomes a stator limit through the duty cycle; the
    /// tighter of the two wins.
    pub fn stator_limit(&self, vel_rad_per_sec: f64, bus_voltage: f64) -> f64 {
        let m = &self.model;
        let back_emf_term =
            (m.stall_current_a - m.free_current_a) * (vel_rad_per_sec / m.free_speed_rad_per_sec);
        let supply_bound = (-back_emf_term
            + (back_emf_term.powi(2)
                + 4.0 * (bus_voltage / 12.0) * m.stall_current_a * self.supply_current_limit_a)
                .sqrt())
            / 2.0;
        self.stator_current_limit_a.min(supply_bound)
    }

    /// Maximum voltage [V] at `vel_rad_per_sec` that respects both limits.
    pub fn voltage_limit(&self, vel_rad_per_sec: f64, bus_voltage: f64) -> f64 {
        let stator_limit = self.stator_limit(vel_rad_per_sec, bus_voltage);
        self.model
            .voltage(self.model.torque(stator_limit), vel_rad_per_sec)
    }

    pub fn set_voltage(&mut self, volts: f64) -> LimitedVoltage {
        let vel = self.encoder.velocity() * TAU;
        let bus_voltage = self.motor.bus_voltage();

        let (applied, stator_limit_a) = if volts >= 0.0 {
            let limit = self.voltage_limit(vel, bus_voltage);
            (volts.min(limit), self.stator_limit(vel, bus_voltage))
        } else {
            let limit = self.voltage_limit(-vel, bus_voltage);
            (volts.max(-limit), self.stator_limit(-vel, bus_voltage))
        };

        self.motor.set_voltage(applied);
        LimitedVoltage {
            requested: volts,
            applied,
            stator_limit_a,
        }
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.motor.set_inverted(inverted);
        self.encoder.set_inverted(inverted);
    }

    pub fn set_brake(&mut self, brake: bool) {
        self.motor.set_brake(brake);
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.motor.set_tolerance(tolerance);
    }

    #[inline]
    pub fn duty_cycle(&self) -> f64 {
        self.motor.duty_cycle()
    }

    #[inline]
    pub fn motor(&self) -> &Motor {
        &self.motor
    }

    #[inline]
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    #[inline]
    pub fn model(&self) -> &DcMotor {
        &self.model
    }
}
