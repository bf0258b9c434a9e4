//! Simulated robot shared by the integration tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use trobotix_common::clock::ManualClock;
use trobotix_common::config::ConfigLoader;
use trobotix_robot::config::RobotConfig;
use trobotix_robot::driver::OpModeRunner;
use trobotix_robot::hardware::HardwareMap;
use trobotix_robot::hardware::gamepad::GamepadState;
use trobotix_robot::hardware::sim::SimHub;

/// Ports assigned by `SimHub::from_config` with the default names.
pub const FRONT_LEFT: usize = 0;
pub const FRONT_RIGHT: usize = 1;
pub const BACK_LEFT: usize = 2;
pub const BACK_RIGHT: usize = 3;
pub const TEST_MOTOR: usize = 4;

/// Every read of the runner's clock advances it by this much.
pub const CLOCK_STEP: Duration = Duration::from_millis(5);

pub type Sim = Rc<RefCell<SimHub>>;

/// Default config with free-running cycles.
pub fn config() -> RobotConfig {
    let mut config = RobotConfig::from_toml_str("[shared]\nservice_name = \"test\"\n").unwrap();
    config.cycle.period_us = 0;
    config
}

pub fn runner() -> (Sim, OpModeRunner<ManualClock>) {
    runner_with(config())
}

pub fn runner_with(config: RobotConfig) -> (Sim, OpModeRunner<ManualClock>) {
    let sim = Rc::new(RefCell::new(SimHub::from_config(&config)));
    let runner = OpModeRunner::with_clock(
        HardwareMap::new(sim.clone()),
        config,
        ManualClock::with_step(CLOCK_STEP),
    )
    .unwrap();
    (sim, runner)
}

pub fn set_gamepad(sim: &Sim, index: usize, state: GamepadState) {
    sim.borrow_mut().set_gamepad(index, state);
}

pub fn power(sim: &Sim, port: usize) -> f64 {
    sim.borrow().power(port)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
