//! # trobotix robot simulator
//!
//! Runs one op-mode session against the simulated hub: loads
//! `config/robot.toml`, performs RT setup, builds the robot and drives the
//! periodic loop until Ctrl-C or the configured cycle count.

use std::cell::RefCell;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use trobotix_common::config::{LogLevel, Validate, load_validated};
use trobotix_common::consts::DEFAULT_CONFIG_PATH;
use trobotix_robot::config::RobotConfig;
use trobotix_robot::driver::OpModeRunner;
use trobotix_robot::hardware::HardwareMap;
use trobotix_robot::hardware::sim::SimHub;
use trobotix_robot::opmodes::OP_MODES;
use trobotix_robot::rt::prepare_control_thread;

/// trobotix robot simulator: periodic op-mode driver on a simulated hub
#[derive(Parser, Debug)]
#[command(name = "trobotix_robot")]
#[command(author = "FTC 8696")]
#[command(version)]
#[command(about = "Cooperative command scheduler driving a simulated robot")]
struct Args {
    /// Path to the robot configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Op mode to run (overrides `session.op_mode`).
    #[arg(long)]
    op_mode: Option<String>,

    /// Stop after this many cycles (overrides `session.max_cycles`).
    #[arg(long)]
    ticks: Option<u64>,

    /// CPU core to pin the control thread to (overrides `cycle.rt.cpu_core`).
    #[arg(long)]
    cpu_core: Option<usize>,

    /// SCHED_FIFO priority (overrides `cycle.rt.priority`).
    #[arg(long)]
    rt_priority: Option<i32>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = load_validated::<RobotConfig>(&args.config);
    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("trobotix robot v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(Box::<dyn std::error::Error>::from)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("trobotix robot shutdown complete");
}

fn run(args: &Args, mut config: RobotConfig) -> Result<(), Box<dyn std::error::Error>> {
    let op_mode = args
        .op_mode
        .clone()
        .unwrap_or_else(|| config.session.op_mode.clone());
    let max_cycles = args.ticks.or(config.session.max_cycles);
    info!(
        "Config OK: service={}, period={}µs, op_mode={}, available={:?}",
        config.shared.service_name, config.cycle.period_us, op_mode, OP_MODES
    );

    if args.cpu_core.is_some() {
        config.cycle.rt.cpu_core = args.cpu_core;
    }
    if args.rt_priority.is_some() {
        config.cycle.rt.priority = args.rt_priority;
    }
    config.validate()?;
    let rt = prepare_control_thread(&config.cycle.rt)?;
    if !rt.skipped.is_empty() {
        info!("RT steps skipped (built without `rt`): {:?}", rt.skipped);
    }

    let hub = Rc::new(RefCell::new(SimHub::from_config(&config)));
    let mut runner = OpModeRunner::new(HardwareMap::new(hub), config)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let stats = runner.run_named(&op_mode, |stats| {
        !running.load(Ordering::SeqCst) || max_cycles.is_some_and(|n| stats.cycle_count >= n)
    })?;

    info!(
        "Cycles={} mean={}µs min={}µs max={}µs stddev={}µs overruns={} max_latency={}µs",
        stats.cycle_count,
        stats.mean_cycle().as_micros(),
        stats.min_cycle.as_micros(),
        stats.max_cycle.as_micros(),
        stats.stddev_cycle().as_micros(),
        stats.overruns,
        stats.max_latency.as_micros(),
    );
    let scheduler = &stats.scheduler;
    info!(
        "Scheduler: ticks={} initialized={} finished={} interrupted={} rejected={}",
        scheduler.ticks,
        scheduler.initialized,
        scheduler.finished,
        scheduler.interrupted,
        scheduler.rejected
    );
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and `shared.log_level`.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        log_level.as_directive().parse().unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
