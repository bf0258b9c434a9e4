//! Common imports for applications built on the scheduler.

pub use crate::command::{Command, CommandContext, CommandState, InterruptionBehavior};
pub use crate::context::RunContext;
pub use crate::debouncer::{DebounceType, Debouncer};
pub use crate::error::SchedulerError;
pub use crate::event_loop::{EventLoop, PollContext};
pub use crate::ids::{CommandId, RequirementSet, SubsystemId};
pub use crate::library::{
    CommandProperties, Decorate, FunctionalCommand, IdleCommand, InstantCommand, RunCommand,
};
pub use crate::proxy::ProxyCommand;
pub use crate::scheduler::{CommandScheduler, SchedulerStats};
pub use crate::subsystem::{Subsystem, SubsystemHandle};
pub use crate::trigger::{Trigger, TriggerContext};
