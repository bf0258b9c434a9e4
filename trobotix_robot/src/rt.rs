//! Control-thread preparation from `[cycle.rt]`.
//!
//! The configuration is turned into a list of [`RtStep`]s, run in order:
//! memory locking, CPU pinning, then `SCHED_FIFO`. Privileged steps need the
//! `rt` feature; without it they are skipped and reported as such, so the
//! simulator runs unprivileged with the same configuration file. The stack
//! prefault needs no privileges and always runs.

use std::hint::black_box;

#[cfg(not(feature = "rt"))]
use tracing::debug;
use tracing::info;

use crate::config::RtConfig;
use crate::error::DriverError;

const PAGE_BYTES: usize = 4096;

/// One privileged setup action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtStep {
    /// `mlockall(MCL_CURRENT | MCL_FUTURE)`.
    LockMemory,
    /// Pin the calling thread to one core.
    PinToCore(usize),
    /// `SCHED_FIFO` at this priority.
    FifoPriority(i32),
}

impl RtStep {
    /// Steps requested by `config`, in execution order.
    pub fn plan(config: &RtConfig) -> Vec<RtStep> {
        let mut steps = Vec::with_capacity(3);
        if config.lock_memory {
            steps.push(RtStep::LockMemory);
        }
        if let Some(core) = config.cpu_core {
            steps.push(RtStep::PinToCore(core));
        }
        if let Some(priority) = config.priority {
            steps.push(RtStep::FifoPriority(priority));
        }
        steps
    }

    #[cfg(feature = "rt")]
    fn apply(self) -> Result<(), DriverError> {
        use nix::sched::{CpuSet, sched_setaffinity};
        use nix::sys::mman::{MlockallFlags, mlockall};
        use nix::unistd::Pid;

        let failed = |what: &str, e: &dyn std::fmt::Display| {
            DriverError::RtSetup(format!("{self:?}: {what}: {e}"))
        };
        match self {
            RtStep::LockMemory => mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
                .map_err(|e| failed("mlockall", &e)),
            RtStep::PinToCore(core) => {
                let mut cpus = CpuSet::new();
                cpus.set(core).map_err(|e| failed("cpu set", &e))?;
                sched_setaffinity(Pid::from_raw(0), &cpus)
                    .map_err(|e| failed("sched_setaffinity", &e))
            }
            RtStep::FifoPriority(priority) => {
                let param = libc::sched_param {
                    sched_priority: priority,
                };
                // SAFETY: `param` is a valid sched_param for the duration of
                // the call; pid 0 is the calling thread.
                if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } == 0 {
                    Ok(())
                } else {
                    Err(failed(
                        "sched_setscheduler",
                        &std::io::Error::last_os_error(),
                    ))
                }
            }
        }
    }
}

/// What [`prepare_control_thread`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RtReport {
    pub applied: Vec<RtStep>,
    /// Requested but not available in this build.
    pub skipped: Vec<RtStep>,
    pub stack_prefault_kib: usize,
}

/// Prepare the calling thread for the cycle loop. Call once, on the thread
/// that will run it, before the first session.
///
/// # Errors
/// `RtSetup` naming the first step the OS refused.
pub fn prepare_control_thread(config: &RtConfig) -> Result<RtReport, DriverError> {
    let mut report = RtReport::default();
    for step in RtStep::plan(config) {
        #[cfg(feature = "rt")]
        {
            step.apply()?;
            report.applied.push(step);
        }
        #[cfg(not(feature = "rt"))]
        {
            debug!(?step, "Built without the rt feature, skipping");
            report.skipped.push(step);
        }
    }

    touch_stack(config.stack_prefault_kib * 1024);
    report.stack_prefault_kib = config.stack_prefault_kib;

    info!(
        applied = ?report.applied,
        skipped = report.skipped.len(),
        stack_kib = report.stack_prefault_kib,
        "Control thread prepared"
    );
    Ok(report)
}

/// Fault in `bytes` of stack below the caller, one page per frame.
#[inline(never)]
fn touch_stack(bytes: usize) {
    if bytes == 0 {
        return;
    }
    let mut page = [0u8; PAGE_BYTES];
    black_box(&mut page);
    touch_stack(bytes.saturating_sub(PAGE_BYTES));
    // Keeps the frame alive across the call.
    black_box(&page);
}
