//! Periodic op-mode driver.
//!
//! ## Cycle
//! 1. Bulk-read every hub input into the cache.
//! 2. Mark the robot enabled for the active op mode and stamp the time.
//! 3. Run the scheduler (subsystem periodics, triggers, commands).
//! 4. Feed the time since the previous cycle start to the encoder velocity
//!    estimators.
//! 5. Flush telemetry, record timing and sleep out the rest of the period.
//!    Overruns restart the deadline grid; `cycle.max_consecutive_overruns`
//!    in a row end the session with [`DriverError::CycleOverrun`].
//!
//! When the session ends the robot is disabled and the scheduler runs once
//! more, so every running command gets its `end(true)` before the op mode
//! is cleared.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};
use trobotix_command::prelude::{CommandScheduler, RunContext, SchedulerStats, Trigger};
use trobotix_common::clock::{Clock, MonotonicClock};

use crate::config::RobotConfig;
use crate::error::DriverError;
use crate::hardware::HardwareMap;
use crate::opmodes::{self, OpMode, OpModeContext};
use crate::robot::Robot;
use crate::telemetry::Telemetry;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Timing and scheduling record of one session.
///
/// Mean and deviation are kept with Welford's online update, so recording
/// stays O(1) for arbitrarily long sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleStats {
    pub cycle_count: u64,
    pub last_cycle: Duration,
    pub min_cycle: Duration,
    pub max_cycle: Duration,
    /// Largest delay of a cycle start behind its planned start.
    pub max_latency: Duration,
    /// Cycles that ran longer than the period.
    pub overruns: u64,
    /// Overruns in a row up to the latest cycle.
    pub overrun_streak: u32,
    /// Scheduler counters accumulated during the session, including the
    /// final disabled pass.
    pub scheduler: SchedulerStats,
    mean_ns: f64,
    m2_ns: f64,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one cycle. Returns true when it overran a nonzero `period`.
    pub fn record(&mut self, elapsed: Duration, latency: Duration, period: Duration) -> bool {
        self.cycle_count += 1;
        self.last_cycle = elapsed;
        self.min_cycle = if self.cycle_count == 1 {
            elapsed
        } else {
            self.min_cycle.min(elapsed)
        };
        self.max_cycle = self.max_cycle.max(elapsed);
        self.max_latency = self.max_latency.max(latency);

        let x = elapsed.as_nanos() as f64;
        let delta = x - self.mean_ns;
        self.mean_ns += delta / self.cycle_count as f64;
        self.m2_ns += delta * (x - self.mean_ns);

        let overran = !period.is_zero() && elapsed > period;
        if overran {
            self.overruns += 1;
            self.overrun_streak += 1;
        } else {
            self.overrun_streak = 0;
        }
        overran
    }

    pub fn mean_cycle(&self) -> Duration {
        Duration::from_nanos(self.mean_ns.round() as u64)
    }

    /// Population standard deviation of the cycle time.
    pub fn stddev_cycle(&self) -> Duration {
        if self.cycle_count == 0 {
            return Duration::ZERO;
        }
        let variance = self.m2_ns / self.cycle_count as f64;
        Duration::from_nanos(variance.max(0.0).sqrt().round() as u64)
    }
}

// ─── Pacing ─────────────────────────────────────────────────────────

/// Sleeps out the rest of each period.
///
/// `rt` builds sleep to absolute `CLOCK_MONOTONIC` deadlines spaced one
/// period apart, so wake-up jitter does not accumulate. Other builds sleep
/// for whatever is left of the current cycle.
struct Pacer {
    period: Duration,
    /// Planned start of the next cycle on the driver clock.
    next_start: Option<Duration>,
    #[cfg(feature = "rt")]
    next_wake: Option<nix::sys::time::TimeSpec>,
}

impl Pacer {
    fn new(period: Duration) -> Self {
        Self {
            period,
            next_start: None,
            #[cfg(feature = "rt")]
            next_wake: None,
        }
    }

    fn latency(&self, cycle_start: Duration) -> Duration {
        self.next_start
            .map_or(Duration::ZERO, |planned| cycle_start.saturating_sub(planned))
    }

    /// Forget the deadline grid after an overrun. The next cycle starts
    /// immediately and lays down a new one.
    fn resync(&mut self) {
        self.next_start = None;
        #[cfg(feature = "rt")]
        {
            self.next_wake = None;
        }
    }

    fn wait(&mut self, cycle_start: Duration, now: Duration) -> Result<(), DriverError> {
        if self.period.is_zero() {
            return Ok(());
        }
        let deadline = cycle_start + self.period;
        self.next_start = Some(deadline);
        self.sleep(deadline.saturating_sub(now))
    }

    #[cfg(not(feature = "rt"))]
    fn sleep(&mut self, remaining: Duration) -> Result<(), DriverError> {
        std::thread::sleep(remaining);
        Ok(())
    }

    #[cfg(feature = "rt")]
    fn sleep(&mut self, remaining: Duration) -> Result<(), DriverError> {
        use nix::errno::Errno;
        use nix::sys::time::TimeSpec;
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let wake = match self.next_wake {
            Some(last) => last + TimeSpec::from_duration(self.period),
            None => {
                let now = clock_gettime(clock)
                    .map_err(|e| DriverError::RtSetup(format!("clock_gettime: {e}")))?;
                now + TimeSpec::from_duration(remaining)
            }
        };
        self.next_wake = Some(wake);

        loop {
            match clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &wake) {
                Ok(_) => return Ok(()),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(DriverError::RtSetup(format!("clock_nanosleep: {e}"))),
            }
        }
    }
}

// ─── Op-Mode Runner ─────────────────────────────────────────────────

/// Owns the scheduler, the robot and the hardware, and runs op-mode
/// sessions one after another.
pub struct OpModeRunner<C: Clock = MonotonicClock> {
    scheduler: CommandScheduler,
    hardware: HardwareMap,
    telemetry: Telemetry,
    robot: Robot,
    config: RobotConfig,
    clock: C,
    context: RunContext,
    /// One `enabled()` trigger per op mode that has been initialized.
    enabled_triggers: HashMap<String, Trigger>,
    period: Duration,
}

impl OpModeRunner<MonotonicClock> {
    pub fn new(hardware: HardwareMap, config: RobotConfig) -> Result<Self, DriverError> {
        Self::with_clock(hardware, config, MonotonicClock::new())
    }
}

impl<C: Clock> OpModeRunner<C> {
    pub fn with_clock(
        hardware: HardwareMap,
        config: RobotConfig,
        clock: C,
    ) -> Result<Self, DriverError> {
        let mut scheduler = CommandScheduler::new();
        let telemetry = Telemetry::new();
        let robot = Robot::new(&mut scheduler, &hardware, &telemetry, &config)?;
        let period = Duration::from_micros(config.cycle.period_us);
        let context = RunContext::new(clock.now());

        Ok(Self {
            scheduler,
            hardware,
            telemetry,
            robot,
            config,
            clock,
            context,
            enabled_triggers: HashMap::new(),
            period,
        })
    }

    #[inline]
    pub fn scheduler(&self) -> &CommandScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    #[inline]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    #[inline]
    pub fn hardware(&self) -> &HardwareMap {
        &self.hardware
    }

    /// Context passed to the most recent scheduler run.
    #[inline]
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Names of the op modes initialized so far.
    pub fn initialized_op_modes(&self) -> impl Iterator<Item = &str> {
        self.enabled_triggers.keys().map(String::as_str)
    }

    /// Look up `name` in the op-mode registry and run it.
    pub fn run_named(
        &mut self,
        name: &str,
        should_stop: impl FnMut(&CycleStats) -> bool,
    ) -> Result<CycleStats, DriverError> {
        let mut op_mode = opmodes::op_mode(name)?;
        self.run_session(op_mode.as_mut(), should_stop)
    }

    /// Run `op_mode` until `should_stop` returns true. It is checked before
    /// every cycle with the statistics so far.
    pub fn run_session(
        &mut self,
        op_mode: &mut dyn OpMode,
        mut should_stop: impl FnMut(&CycleStats) -> bool,
    ) -> Result<CycleStats, DriverError> {
        let name = op_mode.name().to_owned();
        self.initialize(op_mode)?;
        self.context.set_op_mode(name.as_str());
        info!(op_mode = %name, period_us = self.period.as_micros() as u64, "Session starting");

        let before = *self.scheduler.stats();
        let mut stats = CycleStats::new();
        let result = self.cycle_loop(&mut stats, &mut should_stop);

        // Disabled pass: every command that cannot run disabled ends here.
        self.context.set_enabled(false);
        self.context.set_timestamp(self.clock.now());
        let shutdown = self.scheduler.run(&self.context);
        self.telemetry.flush();
        self.context.clear_op_mode();
        stats.scheduler = self.scheduler.stats().since(&before);

        result?;
        shutdown?;
        info!(
            op_mode = %name,
            cycles = stats.cycle_count,
            mean_us = stats.mean_cycle().as_micros() as u64,
            max_us = stats.max_cycle.as_micros() as u64,
            overruns = stats.overruns,
            commands = stats.scheduler.initialized,
            "Session ended"
        );
        Ok(stats)
    }

    fn initialize(&mut self, op_mode: &mut dyn OpMode) -> Result<(), DriverError> {
        let name = op_mode.name().to_owned();
        if self.enabled_triggers.contains_key(&name) {
            debug!(op_mode = %name, "Op mode already initialized");
            return Ok(());
        }

        let enabled = opmodes::enabled_trigger(&self.scheduler, &name);
        let mut ctx = OpModeContext::new(
            &mut self.scheduler,
            &self.robot,
            &self.config,
            enabled.clone(),
        );
        op_mode.initialize(&mut ctx)?;
        self.enabled_triggers.insert(name.clone(), enabled);
        debug!(op_mode = %name, bindings = self.scheduler.default_loop().len(), "Op mode initialized");
        Ok(())
    }

    fn cycle_loop(
        &mut self,
        stats: &mut CycleStats,
        should_stop: &mut impl FnMut(&CycleStats) -> bool,
    ) -> Result<(), DriverError> {
        let mut pacer = Pacer::new(self.period);
        let mut previous_start: Option<Duration> = None;
        let overrun_limit = self.config.cycle.max_consecutive_overruns;

        while !should_stop(stats) {
            let cycle_start = self.clock.now();
            let latency = pacer.latency(cycle_start);

            self.hardware.bulk_read();
            self.context.set_enabled(true);
            self.context.set_timestamp(cycle_start);
            self.scheduler.run(&self.context)?;

            if let Some(previous) = previous_start {
                let dt = cycle_start.saturating_sub(previous).as_secs_f64();
                if dt > 0.0 {
                    self.hardware.recalculate_velocity(dt);
                }
            }
            previous_start = Some(cycle_start);
            self.telemetry.flush();

            let now = self.clock.now();
            let elapsed = now.saturating_sub(cycle_start);
            if !stats.record(elapsed, latency, self.period) {
                pacer.wait(cycle_start, now)?;
                continue;
            }

            pacer.resync();
            let elapsed_us = elapsed.as_micros() as u64;
            let period_us = self.period.as_micros() as u64;
            if self.config.cycle.warn_on_overrun {
                warn!(
                    cycle = stats.cycle_count,
                    elapsed_us,
                    period_us,
                    streak = stats.overrun_streak,
                    "Cycle overrun"
                );
            }
            if overrun_limit > 0 && stats.overrun_streak >= overrun_limit {
                return Err(DriverError::CycleOverrun {
                    consecutive: stats.overrun_streak,
                    elapsed_us,
                    period_us,
                });
            }
        }
        Ok(())
    }
}
