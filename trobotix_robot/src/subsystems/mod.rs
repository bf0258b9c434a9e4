//! Robot subsystems and the handle that ties each one to its scheduler id.

pub mod drivetrain;
pub mod test_motor;

use std::cell::RefCell;
use std::rc::Rc;

use trobotix_command::prelude::{
    CommandScheduler, Decorate, InstantCommand, RunCommand, SchedulerError, Subsystem, SubsystemId,
};

/// A subsystem registered with a scheduler.
///
/// Commands built through [`run`](Self::run) and
/// [`run_once`](Self::run_once) require the subsystem and borrow it only
/// while their action runs.
pub struct Registered<S> {
    subsystem: Rc<RefCell<S>>,
    id: SubsystemId,
}

impl<S> Clone for Registered<S> {
    fn clone(&self) -> Self {
        Self {
            subsystem: self.subsystem.clone(),
            id: self.id,
        }
    }
}

impl<S: Subsystem + 'static> Registered<S> {
    pub fn register(scheduler: &mut CommandScheduler, subsystem: S) -> Result<Self, SchedulerError> {
        let subsystem = Rc::new(RefCell::new(subsystem));
        let id = scheduler.register_subsystem(subsystem.clone())?;
        Ok(Self { subsystem, id })
    }

    #[inline]
    pub fn id(&self) -> SubsystemId {
        self.id
    }

    #[inline]
    pub fn handle(&self) -> &Rc<RefCell<S>> {
        &self.subsystem
    }

    /// Command that runs `action` every tick while scheduled.
    pub fn run<F>(&self, mut action: F) -> RunCommand<impl FnMut() + use<S, F>>
    where
        F: FnMut(&mut S) + 'static,
    {
        let subsystem = self.subsystem.clone();
        RunCommand::new(move || action(&mut subsystem.borrow_mut())).with_requirements(self.id)
    }

    /// Command that runs `action` once and finishes.
    pub fn run_once<F>(&self, mut action: F) -> InstantCommand<impl FnMut() + use<S, F>>
    where
        F: FnMut(&mut S) + 'static,
    {
        let subsystem = self.subsystem.clone();
        InstantCommand::new(move || action(&mut subsystem.borrow_mut())).with_requirements(self.id)
    }
}
