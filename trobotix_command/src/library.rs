//! Closure-backed commands for wiring subsystems and op modes.

use crate::command::{Command, CommandContext, InterruptionBehavior};
use crate::ids::RequirementSet;

/// Properties the scheduler snapshots at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProperties {
    pub name: String,
    pub requirements: RequirementSet,
    pub interruption: InterruptionBehavior,
    pub runs_when_disabled: bool,
}

impl CommandProperties {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: RequirementSet::EMPTY,
            interruption: InterruptionBehavior::CancelSelf,
            runs_when_disabled: false,
        }
    }
}

/// Builder-style decorators shared by every library command.
pub trait Decorate: Sized {
    fn properties_mut(&mut self) -> &mut CommandProperties;

    #[must_use]
    fn with_requirements(mut self, requirements: impl Into<RequirementSet>) -> Self {
        self.properties_mut().requirements = requirements.into();
        self
    }

    #[must_use]
    fn with_interruption_behavior(mut self, behavior: InterruptionBehavior) -> Self {
        self.properties_mut().interruption = behavior;
        self
    }

    /// Keep running while the robot is disabled.
    #[must_use]
    fn ignoring_disable(mut self) -> Self {
        self.properties_mut().runs_when_disabled = true;
        self
    }

    #[must_use]
    fn with_name(mut self, name: impl Into<String>) -> Self {
        self.properties_mut().name = name.into();
        self
    }
}

macro_rules! impl_properties {
    ($ty:ident $(<$($gen:ident),+>)?) => {
        impl $(<$($gen),+>)? Decorate for $ty $(<$($gen),+>)? {
            fn properties_mut(&mut self) -> &mut CommandProperties {
                &mut self.props
            }
        }
    };
}

macro_rules! forward_properties {
    () => {
        fn name(&self) -> &str {
            &self.props.name
        }

        fn requirements(&self) -> RequirementSet {
            self.props.requirements
        }

        fn interruption_behavior(&self) -> InterruptionBehavior {
            self.props.interruption
        }

        fn runs_when_disabled(&self) -> bool {
            self.props.runs_when_disabled
        }
    };
}

// ─── InstantCommand ─────────────────────────────────────────────────

/// Runs `action` once on initialize and finishes in the same tick.
pub struct InstantCommand<F> {
    props: CommandProperties,
    action: F,
}

impl<F: FnMut()> InstantCommand<F> {
    pub fn new(action: F) -> Self {
        Self {
            props: CommandProperties::named("InstantCommand"),
            action,
        }
    }
}

impl_properties!(InstantCommand<F>);

impl<F: FnMut()> Command for InstantCommand<F> {
    forward_properties!();

    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) {
        (self.action)();
    }

    fn is_finished(&mut self, _ctx: &CommandContext<'_>) -> bool {
        true
    }
}

// ─── RunCommand ─────────────────────────────────────────────────────

/// Runs `action` every tick until cancelled.
pub struct RunCommand<F> {
    props: CommandProperties,
    action: F,
}

impl<F: FnMut()> RunCommand<F> {
    pub fn new(action: F) -> Self {
        Self {
            props: CommandProperties::named("RunCommand"),
            action,
        }
    }
}

impl_properties!(RunCommand<F>);

impl<F: FnMut()> Command for RunCommand<F> {
    forward_properties!();

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) {
        (self.action)();
    }
}

// ─── FunctionalCommand ──────────────────────────────────────────────

type Hook = Box<dyn FnMut()>;

/// Command assembled from optional lifecycle closures.
pub struct FunctionalCommand {
    props: CommandProperties,
    on_init: Option<Hook>,
    on_execute: Option<Hook>,
    on_end: Option<Box<dyn FnMut(bool)>>,
    finished: Option<Box<dyn FnMut() -> bool>>,
}

impl Default for FunctionalCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionalCommand {
    /// A command that does nothing and never finishes.
    pub fn new() -> Self {
        Self {
            props: CommandProperties::named("FunctionalCommand"),
            on_init: None,
            on_execute: None,
            on_end: None,
            finished: None,
        }
    }

    #[must_use]
    pub fn on_init(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_init = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_execute(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_execute = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_end(mut self, f: impl FnMut(bool) + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn until(mut self, f: impl FnMut() -> bool + 'static) -> Self {
        self.finished = Some(Box::new(f));
        self
    }
}

impl_properties!(FunctionalCommand);

impl Command for FunctionalCommand {
    forward_properties!();

    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) {
        if let Some(f) = self.on_init.as_mut() {
            f();
        }
    }

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) {
        if let Some(f) = self.on_execute.as_mut() {
            f();
        }
    }

    fn is_finished(&mut self, _ctx: &CommandContext<'_>) -> bool {
        self.finished.as_mut().is_some_and(|f| f())
    }

    fn end(&mut self, interrupted: bool, _ctx: &mut CommandContext<'_>) {
        if let Some(f) = self.on_end.as_mut() {
            f(interrupted);
        }
    }
}

// ─── IdleCommand ────────────────────────────────────────────────────

/// Holds its requirements and does nothing.
pub struct IdleCommand {
    props: CommandProperties,
}

impl IdleCommand {
    pub fn new(requirements: impl Into<RequirementSet>) -> Self {
        let mut props = CommandProperties::named("IdleCommand");
        props.requirements = requirements.into();
        Self { props }
    }
}

impl_properties!(IdleCommand);

impl Command for IdleCommand {
    forward_properties!();
}
