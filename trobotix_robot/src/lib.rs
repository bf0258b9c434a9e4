//! trobotix robot application
//!
//! The periodic driver, the hardware layer and the robot built on the
//! `trobotix_command` scheduler.
//!
//! # Module Structure
//!
//! - [`config`] - `RobotConfig` TOML sections and validation
//! - [`driver`] - `OpModeRunner` cycle loop and `CycleStats`
//! - [`error`] - `DriverError`
//! - [`hardware`] - Hub trait, motors, encoders, gamepads, simulated hub
//! - [`opmodes`] - Op-mode trait, registry and the teleop op modes
//! - [`robot`] - Robot aggregate
//! - [`rt`] - Control thread setup from `[cycle.rt]` (`rt` feature)
//! - [`subsystems`] - Drivetrain and test motor subsystems
//! - [`telemetry`] - Per-cycle telemetry packet
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use trobotix_common::config::ConfigLoader;
//! use trobotix_robot::config::RobotConfig;
//! use trobotix_robot::driver::OpModeRunner;
//! use trobotix_robot::hardware::HardwareMap;
//! use trobotix_robot::hardware::sim::SimHub;
//!
//! let config = RobotConfig::from_toml_str("[shared]\nservice_name = \"sim\"\n").unwrap();
//! let hub = Rc::new(RefCell::new(SimHub::from_config(&config)));
//! let mut runner = OpModeRunner::new(HardwareMap::new(hub), config).unwrap();
//! let stats = runner.run_named("TestTeleop", |s| s.cycle_count >= 100).unwrap();
//! println!("mean cycle: {:?}", stats.mean_cycle());
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod hardware;
pub mod opmodes;
pub mod robot;
pub mod rt;
pub mod subsystems;
pub mod telemetry;

pub use error::DriverError;

use static_assertions::assert_impl_all;

// Value types shared outside the control thread.
assert_impl_all!(driver::CycleStats: Send, Sync, Clone);
assert_impl_all!(hardware::gamepad::GamepadState: Copy, Send, Sync);
