//! Edge-triggered condition bindings.
//!
//! A [`Trigger`] pairs a condition with a [`TriggerContext`]. Every binding
//! method registers exactly one binding on the trigger's [`EventLoop`], and
//! every binding owns its own `previous` cell captured at bind time, so two
//! bindings on the same condition track edges independently.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use trobotix_common::consts::ALWAYS_CONTEXT;

use crate::context::RunContext;
use crate::debouncer::{DebounceType, Debouncer};
use crate::event_loop::{EventLoop, PollContext};
use crate::ids::CommandId;

type Condition = Rc<dyn Fn(&RunContext) -> bool>;

/// Op mode a trigger is active in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerContext {
    #[default]
    Always,
    OpMode(Rc<str>),
}

impl TriggerContext {
    pub fn op_mode(name: impl Into<Rc<str>>) -> Self {
        Self::OpMode(name.into())
    }

    /// True if bindings of this trigger may fire under `ctx`.
    pub fn matches(&self, ctx: &RunContext) -> bool {
        match self {
            Self::Always => true,
            Self::OpMode(name) => ctx.active_op_mode() == Some(&**name),
        }
    }
}

impl fmt::Display for TriggerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str(ALWAYS_CONTEXT),
            Self::OpMode(name) => f.write_str(name),
        }
    }
}

#[derive(Clone)]
pub struct Trigger {
    event_loop: EventLoop,
    condition: Condition,
    context: TriggerContext,
}

impl Trigger {
    pub fn new(
        event_loop: &EventLoop,
        condition: impl Fn(&RunContext) -> bool + 'static,
        context: TriggerContext,
    ) -> Self {
        Self {
            event_loop: event_loop.clone(),
            condition: Rc::new(condition),
            context,
        }
    }

    #[inline]
    pub fn context(&self) -> &TriggerContext {
        &self.context
    }

    #[inline]
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Evaluate the raw condition, ignoring the trigger's context.
    pub fn get_as_boolean(&self, ctx: &RunContext) -> bool {
        (self.condition)(ctx)
    }

    // ─── Bindings ───────────────────────────────────────────────────

    /// Schedule on any change of the condition.
    pub fn on_change(&self, command: CommandId) -> &Self {
        self.add_binding(move |previous, current, poll| {
            if previous != current {
                poll.schedule(command);
            }
        })
    }

    /// Schedule on the rising edge.
    pub fn on_true(&self, command: CommandId) -> &Self {
        self.add_binding(move |previous, current, poll| {
            if !previous && current {
                poll.schedule(command);
            }
        })
    }

    /// Schedule on the falling edge.
    pub fn on_false(&self, command: CommandId) -> &Self {
        self.add_binding(move |previous, current, poll| {
            if previous && !current {
                poll.schedule(command);
            }
        })
    }

    /// Schedule on the rising edge and cancel on the falling edge.
    pub fn while_true(&self, command: CommandId) -> &Self {
        self.add_binding(move |previous, current, poll| match (previous, current) {
            (false, true) => poll.schedule(command),
            (true, false) => poll.cancel(command),
            _ => {}
        })
    }

    /// Schedule on the falling edge and cancel on the rising edge.
    pub fn while_false(&self, command: CommandId) -> &Self {
        self.add_binding(move |previous, current, poll| match (previous, current) {
            (true, false) => poll.schedule(command),
            (false, true) => poll.cancel(command),
            _ => {}
        })
    }

    /// Toggle the command on each rising edge.
    pub fn toggle_on_true(&self, command: CommandId) -> &Self {
        self.add_binding(move |previous, current, poll| {
            if !previous && current {
                poll.toggle(command);
            }
        })
    }

    /// Toggle the command on each falling edge.
    pub fn toggle_on_false(&self, command: CommandId) -> &Self {
        self.add_binding(move |previous, current, poll| {
            if previous && !current {
                poll.toggle(command);
            }
        })
    }

    fn add_binding(&self, on_edge: impl Fn(bool, bool, &mut PollContext<'_>) + 'static) -> &Self {
        let condition = self.condition.clone();
        let context = self.context.clone();
        let previous = Cell::new(condition(&self.event_loop.last_context()));

        self.event_loop.bind(move |poll| {
            let run = poll.run_context();
            let current = condition(run) && context.matches(run);
            on_edge(previous.replace(current), current, poll);
        });
        self
    }

    // ─── Composition ────────────────────────────────────────────────

    /// Both conditions hold. Both sides are always evaluated.
    #[must_use]
    pub fn and(&self, other: &Trigger) -> Trigger {
        let (lhs, rhs) = (self.condition.clone(), other.condition.clone());
        self.derive(move |ctx| {
            let a = lhs(ctx);
            let b = rhs(ctx);
            a && b
        })
    }

    /// Either condition holds. Both sides are always evaluated.
    #[must_use]
    pub fn or(&self, other: &Trigger) -> Trigger {
        let (lhs, rhs) = (self.condition.clone(), other.condition.clone());
        self.derive(move |ctx| {
            let a = lhs(ctx);
            let b = rhs(ctx);
            a || b
        })
    }

    #[must_use]
    pub fn negate(&self) -> Trigger {
        let inner = self.condition.clone();
        self.derive(move |ctx| !inner(ctx))
    }

    /// Filter the condition through a [`Debouncer`] clocked by
    /// [`RunContext::timestamp`].
    #[must_use]
    pub fn debounce(&self, period: Duration, kind: DebounceType) -> Trigger {
        let inner = self.condition.clone();
        let debouncer = RefCell::new(Debouncer::new(period, kind));
        self.derive(move |ctx| debouncer.borrow_mut().calculate(inner(ctx), ctx.timestamp()))
    }

    fn derive(&self, condition: impl Fn(&RunContext) -> bool + 'static) -> Trigger {
        Trigger {
            event_loop: self.event_loop.clone(),
            condition: Rc::new(condition),
            context: self.context.clone(),
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
