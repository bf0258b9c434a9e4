//! trobotix common library
//!
//! Shared building blocks for the trobotix workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Workspace-wide limits and defaults
//! - [`clock`] - Monotonic time sources for the control loop
//! - [`config`] - TOML configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use trobotix_common::prelude::*;
//!
//! let clock = ManualClock::new();
//! clock.advance(std::time::Duration::from_millis(20));
//! assert_eq!(clock.now().as_millis(), 20);
//! ```

pub mod clock;
pub mod config;
pub mod consts;
pub mod prelude;
