//! Command scheduler: resource arbitration and tick execution.
//!
//! The scheduler owns every registered command and a shared handle to every
//! registered subsystem. Per tick ([`CommandScheduler::run`]):
//!
//! 1. subsystem periodics
//! 2. default event loop poll, then apply the collected requests
//! 3. default command fallback for ownerless subsystems
//! 4. drain the pending queue (conflict resolution + `initialize`), then
//!    repeat 3 and 4 for subsystems a rejected request left ownerless
//! 5. `execute` / `is_finished` / `end` for every scheduled command
//!
//! Requests raised from inside a hook are collected and applied right after
//! that hook returns. Cancellation is synchronous; scheduling always goes
//! through the pending queue, so a schedule raised during step 5 is
//! initialized in step 4 of the next tick.

use std::collections::VecDeque;

use tracing::{debug, warn};
use trobotix_common::consts::MAX_SUBSYSTEMS;

use crate::command::{Command, CommandContext, CommandState, InterruptionBehavior};
use crate::context::RunContext;
use crate::error::SchedulerError;
use crate::event_loop::{EventLoop, PollContext};
use crate::ids::{CommandId, RequirementSet, SubsystemId};
use crate::proxy::ProxyCommand;
use crate::request::Request;
use crate::subsystem::SubsystemHandle;

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Calls to [`CommandScheduler::run`].
    pub ticks: u64,
    pub initialized: u64,
    /// Commands that ended because `is_finished` returned true.
    pub finished: u64,
    /// Commands that ended through cancellation.
    pub interrupted: u64,
    /// Incoming commands rejected by an owner or by the disabled state.
    pub rejected: u64,
}

impl SchedulerStats {
    /// Counts accumulated since `earlier` was taken.
    pub fn since(&self, earlier: &SchedulerStats) -> SchedulerStats {
        SchedulerStats {
            ticks: self.ticks.saturating_sub(earlier.ticks),
            initialized: self.initialized.saturating_sub(earlier.initialized),
            finished: self.finished.saturating_sub(earlier.finished),
            interrupted: self.interrupted.saturating_sub(earlier.interrupted),
            rejected: self.rejected.saturating_sub(earlier.rejected),
        }
    }
}

struct SubsystemSlot {
    name: String,
    handle: SubsystemHandle,
    owner: Option<CommandId>,
    default_command: Option<CommandId>,
}

struct CommandSlot {
    name: String,
    command: Box<dyn Command>,
    requirements: RequirementSet,
    interruption: InterruptionBehavior,
    runs_when_disabled: bool,
}

pub struct CommandScheduler {
    subsystems: Vec<SubsystemSlot>,
    commands: Vec<CommandSlot>,
    /// Parallel to `commands`.
    states: Vec<CommandState>,
    /// Scheduled commands in initialization order.
    scheduled: Vec<CommandId>,
    pending: VecDeque<CommandId>,
    requests: Vec<Request>,
    default_loop: EventLoop,
    context: RunContext,
    stats: SchedulerStats,
}

impl Default for CommandScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandScheduler {
    pub fn new() -> Self {
        Self {
            subsystems: Vec::new(),
            commands: Vec::new(),
            states: Vec::new(),
            scheduled: Vec::new(),
            pending: VecDeque::new(),
            requests: Vec::new(),
            default_loop: EventLoop::new(),
            context: RunContext::default(),
            stats: SchedulerStats::default(),
        }
    }

    // ─── Registration ───────────────────────────────────────────────

    /// Add a subsystem to the periodic set.
    ///
    /// # Errors
    /// `DuplicateSubsystem` if this instance is already registered,
    /// `TooManySubsystems` once the registry is full.
    pub fn register_subsystem(
        &mut self,
        subsystem: SubsystemHandle,
    ) -> Result<SubsystemId, SchedulerError> {
        let name = subsystem.borrow().name().to_owned();
        let ptr = std::rc::Rc::as_ptr(&subsystem);
        if self
            .subsystems
            .iter()
            .any(|slot| std::ptr::addr_eq(std::rc::Rc::as_ptr(&slot.handle), ptr))
        {
            return Err(SchedulerError::DuplicateSubsystem(name));
        }
        if self.subsystems.len() >= MAX_SUBSYSTEMS {
            return Err(SchedulerError::TooManySubsystems {
                limit: MAX_SUBSYSTEMS,
            });
        }

        let id = SubsystemId::from_index(self.subsystems.len());
        debug!(subsystem = %name, %id, "Subsystem registered");
        self.subsystems.push(SubsystemSlot {
            name,
            handle: subsystem,
            owner: None,
            default_command: None,
        });
        Ok(id)
    }

    /// Take ownership of a command and return its handle.
    ///
    /// # Errors
    /// `UnknownSubsystem` if a requirement was not registered here.
    pub fn add_command(
        &mut self,
        command: impl Command + 'static,
    ) -> Result<CommandId, SchedulerError> {
        let requirements = command.requirements();
        if let Some(unknown) = requirements
            .iter()
            .find(|s| s.index() >= self.subsystems.len())
        {
            return Err(SchedulerError::UnknownSubsystem(unknown));
        }

        let id = CommandId::from_index(self.commands.len());
        self.commands.push(CommandSlot {
            name: command.name().to_owned(),
            requirements,
            interruption: command.interruption_behavior(),
            runs_when_disabled: command.runs_when_disabled(),
            command: Box::new(command),
        });
        self.states.push(CommandState::Idle);
        Ok(id)
    }

    /// Register a [`ProxyCommand`] for `target`.
    pub fn proxy(&mut self, target: CommandId) -> Result<CommandId, SchedulerError> {
        let index = self.command_index(target)?;
        let name = format!("Proxy({})", self.commands[index].name);
        self.add_command(ProxyCommand::new(target, name))
    }

    /// Set the command that runs whenever `subsystem` has no owner.
    ///
    /// # Errors
    /// `DefaultCommandMissingRequirement` if `command` does not require
    /// `subsystem`.
    pub fn set_default_command(
        &mut self,
        subsystem: SubsystemId,
        command: CommandId,
    ) -> Result<(), SchedulerError> {
        let sub = self.subsystem_index(subsystem)?;
        let cmd = self.command_index(command)?;
        let slot = &self.commands[cmd];

        if !slot.requirements.contains(subsystem) {
            return Err(SchedulerError::DefaultCommandMissingRequirement {
                command: slot.name.clone(),
                subsystem: self.subsystems[sub].name.clone(),
            });
        }
        if slot.interruption == InterruptionBehavior::CancelIncoming {
            warn!(
                "Default command '{}' of '{}' cancels incoming commands; it will block every other command requiring it",
                slot.name, self.subsystems[sub].name
            );
        }

        self.subsystems[sub].default_command = Some(command);
        Ok(())
    }

    /// Clear the default command, returning the previous one.
    pub fn remove_default_command(
        &mut self,
        subsystem: SubsystemId,
    ) -> Result<Option<CommandId>, SchedulerError> {
        let sub = self.subsystem_index(subsystem)?;
        Ok(self.subsystems[sub].default_command.take())
    }

    pub fn default_command(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.subsystems
            .get(subsystem.index())
            .and_then(|slot| slot.default_command)
    }

    // ─── Control ────────────────────────────────────────────────────

    /// Queue `command` for initialization on the next [`run`](Self::run).
    ///
    /// # Errors
    /// `AlreadyScheduled` if it is scheduled or already queued.
    pub fn schedule(&mut self, command: CommandId) -> Result<(), SchedulerError> {
        let index = self.command_index(command)?;
        if !self.states[index].is_idle() {
            return Err(SchedulerError::AlreadyScheduled(
                self.commands[index].name.clone(),
            ));
        }
        self.enqueue(command);
        Ok(())
    }

    /// Cancel `command` now. No-op if it is idle.
    pub fn cancel(&mut self, command: CommandId) -> Result<(), SchedulerError> {
        self.command_index(command)?;
        self.cancel_command(command);
        self.apply_requests()
    }

    /// Cancel every scheduled and pending command.
    pub fn cancel_all(&mut self) -> Result<(), SchedulerError> {
        let active: Vec<CommandId> = self
            .scheduled
            .iter()
            .chain(self.pending.iter())
            .copied()
            .collect();
        for command in active {
            self.cancel_command(command);
        }
        self.apply_requests()
    }

    /// Poll an application-created event loop against the context of the
    /// most recent tick and apply its requests.
    pub fn poll(&mut self, event_loop: &EventLoop) -> Result<(), SchedulerError> {
        event_loop.poll(&mut PollContext::new(&self.context, &mut self.requests));
        self.apply_requests()
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// True once the command has been initialized and until it ends.
    pub fn is_scheduled(&self, command: CommandId) -> bool {
        self.state(command) == Some(CommandState::Scheduled)
    }

    pub fn state(&self, command: CommandId) -> Option<CommandState> {
        self.states.get(command.index()).copied()
    }

    /// Command currently owning `subsystem`.
    pub fn requiring(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.subsystems
            .get(subsystem.index())
            .and_then(|slot| slot.owner)
    }

    pub fn scheduled_commands(&self) -> &[CommandId] {
        &self.scheduled
    }

    pub fn command_name(&self, command: CommandId) -> Option<&str> {
        self.commands
            .get(command.index())
            .map(|slot| slot.name.as_str())
    }

    pub fn subsystem_name(&self, subsystem: SubsystemId) -> Option<&str> {
        self.subsystems
            .get(subsystem.index())
            .map(|slot| slot.name.as_str())
    }

    pub fn requirements(&self, command: CommandId) -> Option<RequirementSet> {
        self.commands
            .get(command.index())
            .map(|slot| slot.requirements)
    }

    #[inline]
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Loop polled in step 2 of every tick.
    #[inline]
    pub fn default_loop(&self) -> &EventLoop {
        &self.default_loop
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Run one tick.
    ///
    /// # Errors
    /// `UnknownCommand` if a binding or hook requested a handle this
    /// scheduler never issued.
    pub fn run(&mut self, ctx: &RunContext) -> Result<(), SchedulerError> {
        self.context = ctx.clone();
        self.stats.ticks += 1;

        for slot in &self.subsystems {
            slot.handle.borrow_mut().periodic();
        }

        let default_loop = self.default_loop.clone();
        self.poll(&default_loop)?;

        // Each default gets one attempt per tick, so this terminates even
        // when a blocked owner keeps rejecting it.
        let mut attempted: Vec<CommandId> = Vec::new();
        loop {
            self.schedule_defaults(&mut attempted);
            if self.pending.is_empty() {
                break;
            }
            while let Some(command) = self.pending.pop_front() {
                self.initialize_command(command)?;
            }
        }

        let snapshot = self.scheduled.clone();
        for command in snapshot {
            self.step_command(command)?;
        }
        Ok(())
    }

    /// Queue the default of every subsystem that is neither owned nor
    /// claimed by a pending request.
    fn schedule_defaults(&mut self, attempted: &mut Vec<CommandId>) {
        let claimed = self
            .pending
            .iter()
            .fold(RequirementSet::EMPTY, |acc, id| {
                acc.union(self.commands[id.index()].requirements)
            });
        let enabled = self.context.is_enabled();

        for index in 0..self.subsystems.len() {
            let slot = &self.subsystems[index];
            let Some(default) = slot.default_command else {
                continue;
            };
            if slot.owner.is_some() || claimed.contains(SubsystemId::from_index(index)) {
                continue;
            }
            if !self.states[default.index()].is_idle() || attempted.contains(&default) {
                continue;
            }
            if !enabled && !self.commands[default.index()].runs_when_disabled {
                continue;
            }
            attempted.push(default);
            self.enqueue(default);
        }
    }

    fn initialize_command(&mut self, command: CommandId) -> Result<(), SchedulerError> {
        let index = command.index();
        if self.states[index] != CommandState::Pending {
            return Ok(());
        }

        let slot = &self.commands[index];
        if !self.context.is_enabled() && !slot.runs_when_disabled {
            debug!(command = %slot.name, "Rejected while disabled");
            self.reject(command);
            return Ok(());
        }

        let requirements = slot.requirements;
        let mut owners: Vec<CommandId> = Vec::new();
        for subsystem in requirements.iter() {
            if let Some(owner) = self.subsystems[subsystem.index()].owner
                && !owners.contains(&owner)
            {
                owners.push(owner);
            }
        }

        if let Some(blocker) = owners.iter().find(|owner| {
            self.commands[owner.index()].interruption == InterruptionBehavior::CancelIncoming
        }) {
            debug!(
                command = %self.commands[index].name,
                owner = %self.commands[blocker.index()].name,
                "Rejected by owner"
            );
            self.reject(command);
            return Ok(());
        }

        for owner in owners {
            self.cancel_command(owner);
        }
        self.apply_requests()?;
        // An interrupted owner may have cancelled the incoming command.
        if self.states[index] != CommandState::Pending {
            return Ok(());
        }

        self.states[index] = CommandState::Scheduled;
        self.scheduled.push(command);
        for subsystem in requirements.iter() {
            self.subsystems[subsystem.index()].owner = Some(command);
        }
        self.stats.initialized += 1;
        debug!(command = %self.commands[index].name, "Initialized");

        self.invoke(command, |c, ctx| c.initialize(ctx));
        self.apply_requests()
    }

    fn step_command(&mut self, command: CommandId) -> Result<(), SchedulerError> {
        let index = command.index();
        if self.states[index] != CommandState::Scheduled {
            return Ok(());
        }

        if !self.context.is_enabled() && !self.commands[index].runs_when_disabled {
            self.cancel_command(command);
            return self.apply_requests();
        }

        self.invoke(command, |c, ctx| c.execute(ctx));
        self.apply_requests()?;
        if self.states[index] != CommandState::Scheduled {
            return Ok(());
        }

        let finished = self.invoke(command, |c, ctx| c.is_finished(ctx));
        self.apply_requests()?;
        if !finished || self.states[index] != CommandState::Scheduled {
            return Ok(());
        }

        self.retire(command);
        self.stats.finished += 1;
        debug!(command = %self.commands[index].name, "Finished");
        self.invoke(command, |c, ctx| c.end(false, ctx));
        self.apply_requests()
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn command_index(&self, command: CommandId) -> Result<usize, SchedulerError> {
        let index = command.index();
        if index < self.commands.len() {
            Ok(index)
        } else {
            Err(SchedulerError::UnknownCommand(command))
        }
    }

    fn subsystem_index(&self, subsystem: SubsystemId) -> Result<usize, SchedulerError> {
        let index = subsystem.index();
        if index < self.subsystems.len() {
            Ok(index)
        } else {
            Err(SchedulerError::UnknownSubsystem(subsystem))
        }
    }

    fn enqueue(&mut self, command: CommandId) {
        self.states[command.index()] = CommandState::Pending;
        self.pending.push_back(command);
    }

    fn reject(&mut self, command: CommandId) {
        self.states[command.index()] = CommandState::Idle;
        self.stats.rejected += 1;
    }

    /// Drop a scheduled command from the run-state and release what it owns.
    fn retire(&mut self, command: CommandId) {
        self.states[command.index()] = CommandState::Idle;
        self.scheduled.retain(|id| *id != command);
        for subsystem in self.commands[command.index()].requirements.iter() {
            let slot = &mut self.subsystems[subsystem.index()];
            if slot.owner == Some(command) {
                slot.owner = None;
            }
        }
    }

    /// Cancel without applying the requests raised by `end`.
    fn cancel_command(&mut self, command: CommandId) {
        match self.states[command.index()] {
            CommandState::Idle => {}
            CommandState::Pending => {
                self.states[command.index()] = CommandState::Idle;
                self.pending.retain(|id| *id != command);
                debug!(command = %self.commands[command.index()].name, "Dequeued");
            }
            CommandState::Scheduled => {
                self.retire(command);
                self.stats.interrupted += 1;
                debug!(command = %self.commands[command.index()].name, "Interrupted");
                self.invoke(command, |c, ctx| c.end(true, ctx));
            }
        }
    }

    fn apply_requests(&mut self) -> Result<(), SchedulerError> {
        while !self.requests.is_empty() {
            let batch = std::mem::take(&mut self.requests);
            for request in batch {
                match request {
                    Request::Schedule(command) => {
                        let index = self.command_index(command)?;
                        if self.states[index].is_idle() {
                            self.enqueue(command);
                        }
                    }
                    Request::Cancel(command) => {
                        self.command_index(command)?;
                        self.cancel_command(command);
                    }
                    Request::Toggle(command) => {
                        let index = self.command_index(command)?;
                        if self.states[index].is_idle() {
                            self.enqueue(command);
                        } else {
                            self.cancel_command(command);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Run one hook of `command`. Requests it raises land in
    /// `self.requests`; the hook never sees the command table, so the
    /// command stays in its slot even if the hook unwinds.
    fn invoke<R>(
        &mut self,
        command: CommandId,
        hook: impl FnOnce(&mut dyn Command, &mut CommandContext<'_>) -> R,
    ) -> R {
        let target = self.commands[command.index()].command.as_mut();
        let mut ctx = CommandContext::new(&self.context, &self.states, &mut self.requests);
        hook(target, &mut ctx)
    }
}
