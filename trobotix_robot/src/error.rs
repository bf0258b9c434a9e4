//! Driver error type.

use thiserror::Error;
use trobotix_command::SchedulerError;
use trobotix_common::config::ConfigError;

#[derive(Debug, Error)]
pub enum DriverError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `cycle.max_consecutive_overruns` reached.
    #[error("{consecutive} consecutive cycle overruns (last {elapsed_us}µs, period {period_us}µs)")]
    CycleOverrun {
        consecutive: u32,
        elapsed_us: u64,
        period_us: u64,
    },

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Installing the Ctrl-C handler failed.
    #[error("signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("unknown op mode '{0}'")]
    UnknownOpMode(String),

    /// The hub has no device with this name.
    #[error("unknown hardware device '{0}'")]
    UnknownDevice(String),
}
