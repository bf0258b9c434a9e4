//! Quadrature encoder with a driver-fed velocity estimate.

use std::cell::RefCell;
use std::rc::Rc;

use super::{Port, SharedHub};

/// Encoder counts per output revolution of common goBILDA Yellow Jacket
/// gearmotors.
pub mod counts_per_rev {
    const STAGE_3_7: f64 = 1.0 + 46.0 / 17.0;
    const STAGE_5_2: f64 = 1.0 + 46.0 / 11.0;

    pub const GOBILDA_6000RPM: f64 = 28.0;
    pub const GOBILDA_1620RPM: f64 = GOBILDA_6000RPM * STAGE_3_7;
    pub const GOBILDA_1150RPM: f64 = GOBILDA_6000RPM * STAGE_5_2;
    pub const GOBILDA_435RPM: f64 = GOBILDA_6000RPM * STAGE_3_7 * STAGE_3_7;
    pub const GOBILDA_312RPM: f64 = GOBILDA_6000RPM * STAGE_3_7 * STAGE_5_2;
    pub const GOBILDA_223RPM: f64 = GOBILDA_6000RPM * STAGE_5_2 * STAGE_5_2;
    pub const GOBILDA_117RPM: f64 = GOBILDA_6000RPM * STAGE_3_7 * STAGE_3_7 * STAGE_3_7;
    pub const GOBILDA_84RPM: f64 = GOBILDA_6000RPM * STAGE_3_7 * STAGE_3_7 * STAGE_5_2;
    pub const GOBILDA_60RPM: f64 = GOBILDA_6000RPM * STAGE_3_7 * STAGE_5_2 * STAGE_5_2;
    pub const GOBILDA_43RPM: f64 = GOBILDA_6000RPM * STAGE_5_2 * STAGE_5_2 * STAGE_5_2;
    pub const GOBILDA_30RPM: f64 =
        GOBILDA_6000RPM * STAGE_3_7 * STAGE_3_7 * STAGE_3_7 * STAGE_3_7;
}

/// Three-sample moving average of finite-difference velocities.
#[derive(Debug, Clone, Default)]
pub struct VelocityEstimator {
    last_position: f64,
    vel_t1: f64,
    vel_t2: f64,
    velocity: f64,
}

impl VelocityEstimator {
    pub fn new(initial_position: f64) -> Self {
        Self {
            last_position: initial_position,
            ..Self::default()
        }
    }

    /// Advance by one sample taken `dt` seconds after the previous one.
    pub fn update(&mut self, position: f64, dt: f64) {
        let current = (position - self.last_position) / dt;
        self.velocity = (current + self.vel_t1 + self.vel_t2) / 3.0;
        self.vel_t2 = self.vel_t1;
        self.vel_t1 = current;
        self.last_position = position;
    }

    #[inline]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }
}

#[derive(Debug)]
struct EncoderState {
    inverted: bool,
    estimator: VelocityEstimator,
}

/// Cheap to clone; clones share inversion and velocity state.
#[derive(Clone)]
pub struct Encoder {
    hub: SharedHub,
    port: Port,
    counts_per_rev: f64,
    state: Rc<RefCell<EncoderState>>,
}

impl Encoder {
    pub fn new(hub: SharedHub, port: Port, counts_per_rev: f64) -> Self {
        let counts = hub.borrow().encoder_counts(port);
        Self {
            hub,
            port,
            counts_per_rev,
            state: Rc::new(RefCell::new(EncoderState {
                inverted: false,
                estimator: VelocityEstimator::new(counts as f64 / counts_per_rev),
            })),
        }
    }

    pub fn set_inverted(&self, inverted: bool) {
        self.state.borrow_mut().inverted = inverted;
    }

    /// Position [rotations] from the last bulk read.
    pub fn position(&self) -> f64 {
        let counts = self.hub.borrow().encoder_counts(self.port) as f64;
        let counts = if self.state.borrow().inverted {
            -counts
        } else {
            counts
        };
        counts / self.counts_per_rev
    }

    /// Velocity [rotations/s] as of the last recalculation.
    pub fn velocity(&self) -> f64 {
        self.state.borrow().estimator.velocity()
    }

    pub(crate) fn recalculate_velocity(&self, dt: f64) {
        let position = self.position();
        self.state.borrow_mut().estimator.update(position, dt);
    }
}
