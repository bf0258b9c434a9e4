//! Subsystem contract.
//!
//! Subsystems are built by the application first and then handed to
//! [`CommandScheduler::register_subsystem`](crate::scheduler::CommandScheduler::register_subsystem).
//! The scheduler keeps a shared handle to call [`Subsystem::periodic`] once
//! per tick; commands hold their own handle to the same `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::rc::Rc;

/// Exclusive hardware aggregate.
pub trait Subsystem {
    fn name(&self) -> &str;

    /// Called at the start of every tick, before any command runs.
    fn periodic(&mut self) {}
}

/// Shared handle to a registered subsystem.
pub type SubsystemHandle = Rc<RefCell<dyn Subsystem>>;
