//! Hardware interface layer.
//!
//! All device access goes through a [`Hub`]: one bulk read per cycle fills
//! the hub's input cache, and every sensor getter reads from that cache.
//! Device wrappers ([`motor::Motor`], [`encoder::Encoder`]) hold a
//! [`SharedHub`] and a port index resolved once at construction.

pub mod encoder;
pub mod gamepad;
pub mod modeled_motor;
pub mod motor;
pub mod sim;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::DriverError;

use self::encoder::Encoder;
use self::gamepad::GamepadState;

/// Index of a device port on a [`Hub`].
pub type Port = usize;

/// A hardware module whose inputs are bulk-read once per cycle.
pub trait Hub {
    /// Resolve a configured device name.
    fn port(&self, name: &str) -> Option<Port>;

    /// Refresh the cached inputs of every device.
    fn bulk_read(&mut self);

    /// Cached bus voltage [V].
    fn bus_voltage(&self) -> f64;

    /// Cached raw encoder count.
    fn encoder_counts(&self, port: Port) -> i64;

    /// Cached motor stator current [A].
    fn motor_current(&self, port: Port) -> f64;

    fn set_power(&mut self, port: Port, power: f64);

    fn set_brake(&mut self, port: Port, brake: bool);

    /// Latest state of driver gamepad `index` (0 = primary).
    fn gamepad(&self, index: usize) -> GamepadState;
}

pub type SharedHub = Rc<RefCell<dyn Hub>>;

/// Hub handle plus the encoders whose velocity the driver recalculates.
#[derive(Clone)]
pub struct HardwareMap {
    hub: SharedHub,
    encoders: Rc<RefCell<Vec<Encoder>>>,
}

impl HardwareMap {
    pub fn new(hub: SharedHub) -> Self {
        Self {
            hub,
            encoders: Rc::new(RefCell::new(Vec::new())),
        }
    }

    #[inline]
    pub fn hub(&self) -> &SharedHub {
        &self.hub
    }

    pub fn port(&self, name: &str) -> Result<Port, DriverError> {
        self.hub
            .borrow()
            .port(name)
            .ok_or_else(|| DriverError::UnknownDevice(name.to_string()))
    }

    /// Open a motor by name.
    pub fn motor(&self, name: &str) -> Result<motor::Motor, DriverError> {
        Ok(motor::Motor::new(self.hub.clone(), self.port(name)?, name))
    }

    /// Open the encoder on motor port `name` and register it for velocity
    /// recalculation.
    pub fn encoder(&self, name: &str, counts_per_rev: f64) -> Result<Encoder, DriverError> {
        let encoder = Encoder::new(self.hub.clone(), self.port(name)?, counts_per_rev);
        self.encoders.borrow_mut().push(encoder.clone());
        Ok(encoder)
    }

    pub fn bulk_read(&self) {
        self.hub.borrow_mut().bulk_read();
    }

    pub fn bus_voltage(&self) -> f64 {
        self.hub.borrow().bus_voltage()
    }

    /// Feed the previous cycle's duration [s] to every registered encoder.
    pub fn recalculate_velocity(&self, dt: f64) {
        for encoder in self.encoders.borrow().iter() {
            encoder.recalculate_velocity(dt);
        }
    }
}
