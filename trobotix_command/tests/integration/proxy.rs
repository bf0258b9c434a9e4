//! Proxy hand-off between independently scheduled commands.

use trobotix_command::prelude::*;

use super::support::{Mechanism, Probe, journal, take, tick};

#[test]
fn proxy_finishes_with_target() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let s = scheduler
        .register_subsystem(Mechanism::handle("S", &log))
        .unwrap();
    let target = scheduler
        .add_command(Probe::new("T", &log).requiring(s).finish_after(2))
        .unwrap();
    let proxy = scheduler.proxy(target).unwrap();

    scheduler.schedule(proxy).unwrap();
    scheduler.run(&tick(1)).unwrap();
    assert!(scheduler.is_scheduled(proxy));
    assert!(scheduler.is_scheduled(target));
    // The proxy never owns the target's requirements.
    assert_eq!(scheduler.requiring(s), Some(target));

    scheduler.run(&tick(2)).unwrap();
    assert!(!scheduler.is_scheduled(target));
    scheduler.run(&tick(3)).unwrap();
    assert!(!scheduler.is_scheduled(proxy));
    assert_eq!(
        take(&log),
        [
            "S.periodic",
            "T.init",
            "T.exec",
            "S.periodic",
            "T.exec",
            "T.end(false)",
            "S.periodic",
        ]
    );
}

#[test]
fn interrupted_proxy_cancels_target() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let target = scheduler.add_command(Probe::new("T", &log)).unwrap();
    let proxy = scheduler.proxy(target).unwrap();

    scheduler.schedule(proxy).unwrap();
    scheduler.run(&tick(1)).unwrap();
    take(&log);

    scheduler.cancel(proxy).unwrap();
    assert!(!scheduler.is_scheduled(proxy));
    assert!(!scheduler.is_scheduled(target));
    assert_eq!(take(&log), ["T.end(true)"]);
}

#[test]
fn proxy_observes_target_cancelled_elsewhere() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let s = scheduler
        .register_subsystem(Mechanism::handle("S", &log))
        .unwrap();
    let target = scheduler
        .add_command(Probe::new("T", &log).requiring(s))
        .unwrap();
    let rival = scheduler
        .add_command(Probe::new("Rival", &log).requiring(s))
        .unwrap();
    let proxy = scheduler.proxy(target).unwrap();

    scheduler.schedule(proxy).unwrap();
    scheduler.run(&tick(1)).unwrap();
    scheduler.schedule(rival).unwrap();
    scheduler.run(&tick(2)).unwrap();

    assert!(scheduler.is_scheduled(rival));
    assert!(!scheduler.is_scheduled(target));
    assert!(!scheduler.is_scheduled(proxy));
    assert_eq!(scheduler.stats().finished, 1);
}

#[test]
fn proxy_runs_while_disabled() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let target = scheduler
        .add_command(RunCommand::new(|| {}).ignoring_disable().with_name("Hold"))
        .unwrap();
    let proxy = scheduler.proxy(target).unwrap();
    assert_eq!(scheduler.command_name(proxy), Some("Proxy(Hold)"));

    scheduler.schedule(proxy).unwrap();
    scheduler.run(&tick(1).with_enabled(false)).unwrap();
    assert!(scheduler.is_scheduled(proxy));
    assert!(scheduler.is_scheduled(target));
    assert!(take(&log).is_empty());
}

#[test]
fn proxy_of_disabled_target_finishes_immediately() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let target = scheduler.add_command(Probe::new("T", &log)).unwrap();
    let proxy = scheduler.proxy(target).unwrap();

    scheduler.schedule(proxy).unwrap();
    scheduler.run(&tick(1).with_enabled(false)).unwrap();

    assert!(!scheduler.is_scheduled(proxy));
    assert!(take(&log).is_empty());
    assert_eq!(scheduler.stats().rejected, 1);
}
