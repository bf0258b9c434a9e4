//! Scheduler error type.
//!
//! Every variant is a wiring bug caught at development time. Conflict
//! rejection is a normal outcome and never surfaces here.

use thiserror::Error;

use crate::ids::{CommandId, SubsystemId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The handle was not issued by this scheduler.
    #[error("unknown command {0}")]
    UnknownCommand(CommandId),

    /// The handle was not issued by this scheduler.
    #[error("unknown subsystem {0}")]
    UnknownSubsystem(SubsystemId),

    /// The same subsystem instance was registered twice.
    #[error("subsystem '{0}' is already registered")]
    DuplicateSubsystem(String),

    /// Registry is full.
    #[error("cannot register more than {limit} subsystems")]
    TooManySubsystems { limit: usize },

    /// A default command must require the subsystem it defaults for.
    #[error("default command '{command}' does not require subsystem '{subsystem}'")]
    DefaultCommandMissingRequirement { command: String, subsystem: String },

    /// Direct re-schedule of a command that is already scheduled or pending.
    #[error("command '{0}' is already scheduled")]
    AlreadyScheduled(String),
}
