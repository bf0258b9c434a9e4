//! Proxy command.

use crate::command::{Command, CommandContext};
use crate::ids::CommandId;

/// Schedules `target` through the normal scheduler path without taking on
/// its requirements, and finishes once `target` is no longer scheduled.
///
/// Interrupting the proxy cancels the target. Usually created through
/// [`CommandScheduler::proxy`](crate::scheduler::CommandScheduler::proxy).
#[derive(Debug, Clone)]
pub struct ProxyCommand {
    target: CommandId,
    name: String,
}

impl ProxyCommand {
    pub fn new(target: CommandId, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }

    #[inline]
    pub fn target(&self) -> CommandId {
        self.target
    }
}

impl Command for ProxyCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        ctx.schedule(self.target);
    }

    fn is_finished(&mut self, ctx: &CommandContext<'_>) -> bool {
        !ctx.is_scheduled(self.target)
    }

    fn end(&mut self, interrupted: bool, ctx: &mut CommandContext<'_>) {
        if interrupted && ctx.is_scheduled(self.target) {
            ctx.cancel(self.target);
        }
    }
}
