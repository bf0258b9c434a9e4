//! Command contract.
//!
//! A command is registered once with the scheduler and is referred to by its
//! [`CommandId`] from then on. Every lifecycle hook receives a
//! [`CommandContext`]: read access to the tick's [`RunContext`] plus a queue
//! for scheduling requests that the scheduler applies after the hook returns.

use crate::context::RunContext;
use crate::ids::{CommandId, RequirementSet};
use crate::request::Request;

/// Which side yields when an incoming command needs a resource this command
/// owns. Only the existing owner's policy is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptionBehavior {
    /// The running command is cancelled and the incoming one takes over.
    #[default]
    CancelSelf,
    /// The incoming command is rejected; the running command is untouched.
    CancelIncoming,
}

/// Lifecycle position of a registered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Idle,
    /// Requested, waiting for conflict resolution in the current or next tick.
    Pending,
    Scheduled,
}

impl CommandState {
    #[inline]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Schedulable unit of behavior.
///
/// `initialize` runs exactly once per scheduling, `execute` once per tick
/// while scheduled, and `end` exactly once when the command finishes
/// (`interrupted == false`) or is cancelled (`interrupted == true`).
///
/// The scheduler snapshots [`requirements`](Command::requirements),
/// [`interruption_behavior`](Command::interruption_behavior) and
/// [`runs_when_disabled`](Command::runs_when_disabled) at registration.
pub trait Command {
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    fn requirements(&self) -> RequirementSet {
        RequirementSet::EMPTY
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        InterruptionBehavior::CancelSelf
    }

    fn runs_when_disabled(&self) -> bool {
        false
    }

    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) {}

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) {}

    fn is_finished(&mut self, _ctx: &CommandContext<'_>) -> bool {
        false
    }

    fn end(&mut self, _interrupted: bool, _ctx: &mut CommandContext<'_>) {}
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn requirements(&self) -> RequirementSet {
        (**self).requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        (**self).interruption_behavior()
    }

    fn runs_when_disabled(&self) -> bool {
        (**self).runs_when_disabled()
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        (**self).initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        (**self).execute(ctx);
    }

    fn is_finished(&mut self, ctx: &CommandContext<'_>) -> bool {
        (**self).is_finished(ctx)
    }

    fn end(&mut self, interrupted: bool, ctx: &mut CommandContext<'_>) {
        (**self).end(interrupted, ctx);
    }
}

/// View of the scheduler handed to command hooks.
pub struct CommandContext<'a> {
    run: &'a RunContext,
    states: &'a [CommandState],
    requests: &'a mut Vec<Request>,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        run: &'a RunContext,
        states: &'a [CommandState],
        requests: &'a mut Vec<Request>,
    ) -> Self {
        Self {
            run,
            states,
            requests,
        }
    }

    #[inline]
    pub fn run_context(&self) -> &RunContext {
        self.run
    }

    /// True while `id` is scheduled or waiting to be initialized.
    pub fn is_scheduled(&self, id: CommandId) -> bool {
        self.states
            .get(id.index())
            .is_some_and(|state| !state.is_idle())
    }

    /// Request that `id` be scheduled once this hook returns.
    pub fn schedule(&mut self, id: CommandId) {
        self.requests.push(Request::Schedule(id));
    }

    /// Request that `id` be cancelled once this hook returns.
    pub fn cancel(&mut self, id: CommandId) {
        self.requests.push(Request::Cancel(id));
    }
}
