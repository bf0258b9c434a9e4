//! Ordered per-tick bindings.
//!
//! An [`EventLoop`] is a cheap shared handle: clones refer to the same
//! binding list. Bindings are append-only and run in registration order.
//! They never mutate the scheduler directly; each one records
//! [`Request`]s through the [`PollContext`] it is handed, and the scheduler
//! applies them after the whole poll has completed.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::context::RunContext;
use crate::ids::CommandId;
use crate::request::Request;

type Binding = Box<dyn FnMut(&mut PollContext<'_>)>;

#[derive(Clone, Default)]
pub struct EventLoop {
    bindings: Rc<RefCell<Vec<Binding>>>,
    last_context: Rc<RefCell<RunContext>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding. Bindings added while a poll is running take effect
    /// from the next poll.
    pub fn bind(&self, binding: impl FnMut(&mut PollContext<'_>) + 'static) {
        self.bindings.borrow_mut().push(Box::new(binding));
    }

    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Context of the most recent poll, or the default context before the
    /// first one. Used to evaluate conditions at bind time.
    pub fn last_context(&self) -> RunContext {
        self.last_context.borrow().clone()
    }

    /// Run every binding once, in order.
    pub(crate) fn poll(&self, ctx: &mut PollContext<'_>) {
        *self.last_context.borrow_mut() = ctx.run.clone();

        let mut running = Running {
            list: &self.bindings,
            taken: std::mem::take(&mut *self.bindings.borrow_mut()),
        };
        for binding in running.taken.iter_mut() {
            binding(ctx);
        }
    }
}

/// Bindings moved out for a poll. Dropping puts them back ahead of any
/// added during the poll, also when a binding unwinds.
struct Running<'a> {
    list: &'a RefCell<Vec<Binding>>,
    taken: Vec<Binding>,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        let mut bindings = self.list.borrow_mut();
        let added = std::mem::take(&mut *bindings);
        let mut restored = std::mem::take(&mut self.taken);
        restored.extend(added);
        *bindings = restored;
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("bindings", &self.len())
            .finish()
    }
}

/// Handed to each binding during a poll.
pub struct PollContext<'a> {
    run: &'a RunContext,
    requests: &'a mut Vec<Request>,
}

impl<'a> PollContext<'a> {
    pub(crate) fn new(run: &'a RunContext, requests: &'a mut Vec<Request>) -> Self {
        Self { run, requests }
    }

    #[inline]
    pub fn run_context(&self) -> &RunContext {
        self.run
    }

    pub fn schedule(&mut self, id: CommandId) {
        self.requests.push(Request::Schedule(id));
    }

    pub fn cancel(&mut self, id: CommandId) {
        self.requests.push(Request::Cancel(id));
    }

    /// Cancel `id` if it is scheduled, otherwise schedule it.
    pub fn toggle(&mut self, id: CommandId) {
        self.requests.push(Request::Toggle(id));
    }
}
