//! # trobotix command framework
//!
//! Cooperative, single-threaded scheduler that arbitrates robot behaviors
//! ("commands") over exclusive hardware resources ("subsystems").
//!
//! ## Building Blocks
//!
//! 1. **EventLoop**: ordered, append-only list of per-tick bindings
//! 2. **Trigger**: boolean condition + context with edge combinators
//! 3. **Command**: schedulable behavior with declared requirements
//! 4. **Subsystem**: exclusive resource with a periodic hook
//! 5. **CommandScheduler**: conflict resolution and tick execution
//! 6. **ProxyCommand**: schedules another command without its requirements
//!
//! ## Tick Order
//!
//! `CommandScheduler::run` performs, in order: subsystem periodics →
//! default event loop poll → default command fallback → initialization of
//! newly scheduled commands (conflict resolution) → execute/finish of every
//! scheduled command.
//!
//! Nothing here blocks. All state lives on the control thread; subsystem
//! state is shared with commands through `Rc<RefCell<_>>`.
//!
//! ```rust
//! use std::time::Duration;
//! use trobotix_command::prelude::*;
//!
//! let mut scheduler = CommandScheduler::new();
//! let blink = scheduler
//!     .add_command(InstantCommand::new(|| println!("blink")))
//!     .unwrap();
//!
//! let ctx = RunContext::new(Duration::ZERO)
//!     .with_op_mode("Drive")
//!     .with_enabled(true);
//! let button = Trigger::new(scheduler.default_loop(), |ctx| ctx.is_enabled(), TriggerContext::Always);
//! button.on_true(blink);
//!
//! scheduler.run(&ctx).unwrap();
//! ```

pub mod command;
pub mod context;
pub mod debouncer;
pub mod error;
pub mod event_loop;
pub mod ids;
pub mod library;
pub mod prelude;
pub mod proxy;
pub mod scheduler;
pub mod subsystem;
pub mod trigger;

mod request;

pub use error::SchedulerError;
