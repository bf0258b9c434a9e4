//! Deferred scheduling requests.
//!
//! Bindings and command hooks never touch scheduler state directly. They
//! record requests, and the scheduler applies them once the hook or poll
//! that raised them has returned.

use crate::ids::CommandId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Request {
    /// Queue for initialization; no-op if already scheduled or pending.
    Schedule(CommandId),
    /// Cancel synchronously; no-op if idle.
    Cancel(CommandId),
    /// Cancel if scheduled or pending, else queue.
    Toggle(CommandId),
}
