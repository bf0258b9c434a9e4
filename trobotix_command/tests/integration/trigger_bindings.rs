//! Trigger bindings driven through `CommandScheduler::run`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use trobotix_command::prelude::*;

use super::support::{Probe, journal, take, tick};

fn flag(scheduler: &CommandScheduler, context: TriggerContext) -> (Rc<Cell<bool>>, Trigger) {
    let value = Rc::new(Cell::new(false));
    let read = value.clone();
    let trigger = Trigger::new(scheduler.default_loop(), move |_| read.get(), context);
    (value, trigger)
}

#[test]
fn while_true_follows_condition() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let cmd = scheduler.add_command(Probe::new("C", &log)).unwrap();
    let (held, button) = flag(&scheduler, TriggerContext::Always);
    button.while_true(cmd);

    scheduler.run(&tick(1)).unwrap();
    assert!(!scheduler.is_scheduled(cmd));

    held.set(true);
    scheduler.run(&tick(2)).unwrap();
    assert!(scheduler.is_scheduled(cmd));
    for t in 3..6 {
        scheduler.run(&tick(t)).unwrap();
    }
    assert_eq!(
        take(&log),
        ["C.init", "C.exec", "C.exec", "C.exec", "C.exec"]
    );

    held.set(false);
    scheduler.run(&tick(6)).unwrap();
    assert!(!scheduler.is_scheduled(cmd));
    assert_eq!(take(&log), ["C.end(true)"]);
}

#[test]
fn toggle_on_true_twice_schedules_then_cancels() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let cmd = scheduler.add_command(Probe::new("C", &log)).unwrap();
    let (pressed, button) = flag(&scheduler, TriggerContext::Always);
    button.toggle_on_true(cmd);

    pressed.set(true);
    scheduler.run(&tick(1)).unwrap();
    assert!(scheduler.is_scheduled(cmd));

    pressed.set(false);
    scheduler.run(&tick(2)).unwrap();
    assert!(scheduler.is_scheduled(cmd));

    pressed.set(true);
    scheduler.run(&tick(3)).unwrap();
    assert!(!scheduler.is_scheduled(cmd));
    assert_eq!(
        take(&log),
        ["C.init", "C.exec", "C.exec", "C.end(true)"]
    );
}

#[test]
fn on_true_does_not_reschedule_running_command() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let cmd = scheduler.add_command(Probe::new("C", &log)).unwrap();
    let (pressed, button) = flag(&scheduler, TriggerContext::Always);
    button.on_true(cmd).on_change(cmd);

    pressed.set(true);
    scheduler.run(&tick(1)).unwrap();
    pressed.set(false);
    scheduler.run(&tick(2)).unwrap();

    assert_eq!(take(&log), ["C.init", "C.exec", "C.exec"]);
}

#[test]
fn op_mode_trigger_only_fires_in_its_op_mode() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let cmd = scheduler.add_command(Probe::new("C", &log)).unwrap();
    let (held, button) = flag(&scheduler, TriggerContext::op_mode("Drive"));
    button.while_true(cmd);
    held.set(true);

    scheduler.run(&tick(1)).unwrap();
    assert!(!scheduler.is_scheduled(cmd));

    let drive = RunContext::new(Duration::from_millis(20))
        .with_op_mode("Drive")
        .with_enabled(true);
    scheduler.run(&drive).unwrap();
    assert!(scheduler.is_scheduled(cmd));

    // Leaving the op mode reads as a falling edge.
    let mut idle = drive.clone();
    idle.clear_op_mode();
    scheduler.run(&idle).unwrap();
    assert!(!scheduler.is_scheduled(cmd));
}

#[test]
fn bindings_keep_independent_edge_state() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let first = scheduler.add_command(Probe::new("First", &log)).unwrap();
    let second = scheduler.add_command(Probe::new("Second", &log)).unwrap();
    let (pressed, button) = flag(&scheduler, TriggerContext::Always);

    button.on_true(first);
    pressed.set(true);
    // Bound while already true: this binding never sees the first edge.
    button.on_true(second);

    scheduler.run(&tick(1)).unwrap();
    assert!(scheduler.is_scheduled(first));
    assert!(!scheduler.is_scheduled(second));
}

#[test]
fn debounced_rising_edge() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let cmd = scheduler.add_command(Probe::new("C", &log)).unwrap();
    let (raw, button) = flag(&scheduler, TriggerContext::Always);
    button
        .debounce(Duration::from_millis(200), DebounceType::Rising)
        .on_true(cmd);

    let at = |ms: u64| {
        RunContext::new(Duration::from_millis(ms)).with_enabled(true)
    };

    raw.set(true);
    for ms in [50, 100, 150] {
        scheduler.run(&at(ms)).unwrap();
        assert!(!scheduler.is_scheduled(cmd), "fired early at {ms} ms");
    }
    scheduler.run(&at(250)).unwrap();
    assert!(scheduler.is_scheduled(cmd));
    scheduler.run(&at(300)).unwrap();
    assert!(scheduler.is_scheduled(cmd));
}

#[test]
fn debounce_timer_resets_on_drop() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let cmd = scheduler.add_command(Probe::new("C", &log)).unwrap();
    let (raw, button) = flag(&scheduler, TriggerContext::Always);
    button
        .debounce(Duration::from_millis(200), DebounceType::Rising)
        .on_true(cmd);

    let at = |ms: u64| {
        RunContext::new(Duration::from_millis(ms)).with_enabled(true)
    };

    raw.set(true);
    scheduler.run(&at(50)).unwrap();
    scheduler.run(&at(150)).unwrap();
    raw.set(false);
    scheduler.run(&at(200)).unwrap();
    raw.set(true);
    scheduler.run(&at(250)).unwrap();
    scheduler.run(&at(300)).unwrap();
    assert!(!scheduler.is_scheduled(cmd));

    scheduler.run(&at(450)).unwrap();
    assert!(scheduler.is_scheduled(cmd));
}

#[test]
fn app_event_loop_is_polled_on_demand() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let cmd = scheduler.add_command(Probe::new("C", &log)).unwrap();

    let custom = EventLoop::new();
    let pressed = Rc::new(Cell::new(false));
    let read = pressed.clone();
    Trigger::new(&custom, move |_| read.get(), TriggerContext::Always).on_true(cmd);

    pressed.set(true);
    scheduler.run(&tick(1)).unwrap();
    assert_eq!(scheduler.state(cmd), Some(CommandState::Idle));

    scheduler.poll(&custom).unwrap();
    assert_eq!(scheduler.state(cmd), Some(CommandState::Pending));
    scheduler.run(&tick(2)).unwrap();
    assert!(scheduler.is_scheduled(cmd));
}

#[test]
fn foreign_command_handle_surfaces_as_error() {
    let log = journal();
    let mut other = CommandScheduler::new();
    other.add_command(Probe::new("A", &log)).unwrap();
    let foreign = other.add_command(Probe::new("B", &log)).unwrap();

    let mut scheduler = CommandScheduler::new();
    Trigger::new(scheduler.default_loop(), |ctx| ctx.is_enabled(), TriggerContext::Always)
        .on_true(foreign);

    assert_eq!(
        scheduler.run(&tick(1)),
        Err(SchedulerError::UnknownCommand(foreign))
    );
}
