//! Conflict resolution, default commands and tick ordering.

use trobotix_command::prelude::*;

use super::support::{Mechanism, Probe, journal, take, tick};

#[test]
fn default_command_yields_and_resumes() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let s = scheduler
        .register_subsystem(Mechanism::handle("S", &log))
        .unwrap();
    let d = scheduler
        .add_command(Probe::new("D", &log).requiring(s))
        .unwrap();
    let x = scheduler
        .add_command(Probe::new("X", &log).requiring(s).finish_after(3))
        .unwrap();
    scheduler.set_default_command(s, d).unwrap();

    scheduler.run(&tick(1)).unwrap();
    assert_eq!(take(&log), ["S.periodic", "D.init", "D.exec"]);
    scheduler.run(&tick(2)).unwrap();
    assert_eq!(take(&log), ["S.periodic", "D.exec"]);
    assert_eq!(scheduler.requiring(s), Some(d));

    scheduler.schedule(x).unwrap();
    scheduler.run(&tick(3)).unwrap();
    assert_eq!(
        take(&log),
        ["S.periodic", "D.end(true)", "X.init", "X.exec"]
    );
    assert_eq!(scheduler.requiring(s), Some(x));

    scheduler.run(&tick(4)).unwrap();
    assert_eq!(take(&log), ["S.periodic", "X.exec"]);
    scheduler.run(&tick(5)).unwrap();
    assert_eq!(take(&log), ["S.periodic", "X.exec", "X.end(false)"]);
    assert_eq!(scheduler.requiring(s), None);

    scheduler.run(&tick(6)).unwrap();
    assert_eq!(take(&log), ["S.periodic", "D.init", "D.exec"]);
    assert_eq!(scheduler.requiring(s), Some(d));
}

#[test]
fn cancellable_owner_is_replaced() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let r = scheduler
        .register_subsystem(Mechanism::handle("R", &log))
        .unwrap();
    let a = scheduler.add_command(Probe::new("A", &log).requiring(r)).unwrap();
    let b = scheduler.add_command(Probe::new("B", &log).requiring(r)).unwrap();

    scheduler.schedule(a).unwrap();
    scheduler.run(&tick(1)).unwrap();
    take(&log);

    scheduler.schedule(b).unwrap();
    scheduler.run(&tick(2)).unwrap();

    let events = take(&log);
    assert_eq!(events.iter().filter(|e| *e == "A.end(true)").count(), 1);
    assert!(!events.contains(&"A.exec".to_string()));
    assert!(!scheduler.is_scheduled(a));
    assert!(scheduler.is_scheduled(b));
    assert_eq!(scheduler.requiring(r), Some(b));
    assert_eq!(scheduler.stats().interrupted, 1);
}

#[test]
fn cancel_incoming_owner_blocks_conflict() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let r = scheduler
        .register_subsystem(Mechanism::handle("R", &log))
        .unwrap();
    let a = scheduler
        .add_command(Probe::new("A", &log).requiring(r).cancel_incoming())
        .unwrap();
    let b = scheduler.add_command(Probe::new("B", &log).requiring(r)).unwrap();

    scheduler.schedule(a).unwrap();
    scheduler.run(&tick(1)).unwrap();
    take(&log);

    scheduler.schedule(b).unwrap();
    scheduler.run(&tick(2)).unwrap();

    assert_eq!(take(&log), ["R.periodic", "A.exec"]);
    assert!(scheduler.is_scheduled(a));
    assert!(!scheduler.is_scheduled(b));
    assert_eq!(scheduler.state(b), Some(CommandState::Idle));
    assert_eq!(scheduler.requiring(r), Some(a));
    assert_eq!(scheduler.stats().rejected, 1);
}

#[test]
fn incoming_policy_does_not_protect_owner() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let r = scheduler
        .register_subsystem(Mechanism::handle("R", &log))
        .unwrap();
    let a = scheduler.add_command(Probe::new("A", &log).requiring(r)).unwrap();
    let b = scheduler
        .add_command(Probe::new("B", &log).requiring(r).cancel_incoming())
        .unwrap();

    scheduler.schedule(a).unwrap();
    scheduler.run(&tick(1)).unwrap();
    scheduler.schedule(b).unwrap();
    scheduler.run(&tick(2)).unwrap();

    // Only the existing owner's policy counts: A yields even though B
    // itself would refuse to be interrupted.
    assert!(!scheduler.is_scheduled(a));
    assert_eq!(scheduler.requiring(r), Some(b));
}

#[test]
fn one_blocking_owner_rejects_without_side_effects() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let r1 = scheduler
        .register_subsystem(Mechanism::handle("R1", &log))
        .unwrap();
    let r2 = scheduler
        .register_subsystem(Mechanism::handle("R2", &log))
        .unwrap();
    let soft = scheduler.add_command(Probe::new("Soft", &log).requiring(r1)).unwrap();
    let hard = scheduler
        .add_command(Probe::new("Hard", &log).requiring(r2).cancel_incoming())
        .unwrap();
    let both = scheduler
        .add_command(Probe::new("Both", &log).requiring(r1).requiring(r2))
        .unwrap();

    scheduler.schedule(soft).unwrap();
    scheduler.schedule(hard).unwrap();
    scheduler.run(&tick(1)).unwrap();
    scheduler.schedule(both).unwrap();
    scheduler.run(&tick(2)).unwrap();

    assert!(scheduler.is_scheduled(soft));
    assert!(scheduler.is_scheduled(hard));
    assert!(!scheduler.is_scheduled(both));
    assert!(!take(&log).contains(&"Soft.end(true)".to_string()));
}

#[test]
fn multi_requirement_command_cancels_every_owner_once() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let r1 = scheduler
        .register_subsystem(Mechanism::handle("R1", &log))
        .unwrap();
    let r2 = scheduler
        .register_subsystem(Mechanism::handle("R2", &log))
        .unwrap();
    let wide = scheduler
        .add_command(Probe::new("Wide", &log).requiring(r1).requiring(r2))
        .unwrap();
    let other = scheduler
        .add_command(Probe::new("Other", &log).requiring(r1).requiring(r2))
        .unwrap();

    scheduler.schedule(wide).unwrap();
    scheduler.run(&tick(1)).unwrap();
    take(&log);
    scheduler.schedule(other).unwrap();
    scheduler.run(&tick(2)).unwrap();

    let events = take(&log);
    assert_eq!(events.iter().filter(|e| *e == "Wide.end(true)").count(), 1);
    assert_eq!(scheduler.requiring(r1), Some(other));
    assert_eq!(scheduler.requiring(r2), Some(other));
}

#[test]
fn empty_requirements_coexist() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let a = scheduler.add_command(Probe::new("A", &log)).unwrap();
    let b = scheduler.add_command(Probe::new("B", &log)).unwrap();

    scheduler.schedule(a).unwrap();
    scheduler.schedule(b).unwrap();
    scheduler.run(&tick(1)).unwrap();

    assert_eq!(scheduler.scheduled_commands(), [a, b]);
    assert_eq!(take(&log), ["A.init", "B.init", "A.exec", "B.exec"]);
}

#[test]
fn pending_request_beats_default_fallback() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let s = scheduler
        .register_subsystem(Mechanism::handle("S", &log))
        .unwrap();
    let d = scheduler.add_command(Probe::new("D", &log).requiring(s)).unwrap();
    let x = scheduler.add_command(Probe::new("X", &log).requiring(s)).unwrap();
    scheduler.set_default_command(s, d).unwrap();

    scheduler.schedule(x).unwrap();
    scheduler.run(&tick(1)).unwrap();

    assert_eq!(take(&log), ["S.periodic", "X.init", "X.exec"]);
}

#[test]
fn rejected_request_does_not_starve_default() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let s1 = scheduler
        .register_subsystem(Mechanism::handle("S1", &log))
        .unwrap();
    let s2 = scheduler
        .register_subsystem(Mechanism::handle("S2", &log))
        .unwrap();
    let b = scheduler
        .add_command(Probe::new("B", &log).requiring(s1).cancel_incoming())
        .unwrap();
    let d = scheduler.add_command(Probe::new("D", &log).requiring(s2)).unwrap();
    let x = scheduler
        .add_command(Probe::new("X", &log).requiring(s1).requiring(s2))
        .unwrap();
    scheduler.set_default_command(s2, d).unwrap();

    // X claims S2 when defaults are picked, then B turns it away.
    scheduler.schedule(b).unwrap();
    scheduler.schedule(x).unwrap();
    scheduler.run(&tick(1)).unwrap();
    assert_eq!(
        take(&log),
        ["S1.periodic", "S2.periodic", "B.init", "D.init", "B.exec", "D.exec"]
    );
    assert_eq!(scheduler.requiring(s1), Some(b));
    assert_eq!(scheduler.requiring(s2), Some(d));

    // Re-requested every tick, X never displaces D either.
    scheduler.default_loop().bind(move |ctx| ctx.schedule(x));
    for n in 2..5 {
        scheduler.run(&tick(n)).unwrap();
        assert_eq!(
            take(&log),
            ["S1.periodic", "S2.periodic", "B.exec", "D.exec"]
        );
        assert_eq!(scheduler.requiring(s2), Some(d));
    }
    assert!(!scheduler.is_scheduled(x));
    assert_eq!(scheduler.stats().rejected, 4);
}

#[test]
fn blocked_default_is_tried_once_per_tick() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let s1 = scheduler
        .register_subsystem(Mechanism::handle("S1", &log))
        .unwrap();
    let s2 = scheduler
        .register_subsystem(Mechanism::handle("S2", &log))
        .unwrap();
    let b = scheduler
        .add_command(Probe::new("B", &log).requiring(s1).cancel_incoming())
        .unwrap();
    let d = scheduler
        .add_command(Probe::new("D", &log).requiring(s1).requiring(s2))
        .unwrap();
    scheduler.set_default_command(s2, d).unwrap();

    scheduler.schedule(b).unwrap();
    scheduler.run(&tick(1)).unwrap();
    scheduler.run(&tick(2)).unwrap();

    assert_eq!(scheduler.requiring(s2), None);
    assert_eq!(scheduler.stats().rejected, 2);
}

#[test]
fn removed_default_no_longer_runs() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let s = scheduler
        .register_subsystem(Mechanism::handle("S", &log))
        .unwrap();
    let d = scheduler.add_command(Probe::new("D", &log).requiring(s)).unwrap();
    scheduler.set_default_command(s, d).unwrap();
    assert_eq!(scheduler.remove_default_command(s).unwrap(), Some(d));

    scheduler.run(&tick(1)).unwrap();
    assert_eq!(take(&log), ["S.periodic"]);
}

/// Schedules `target` from `execute`.
struct Launcher {
    target: CommandId,
}

impl Command for Launcher {
    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        ctx.schedule(self.target);
    }

    fn is_finished(&mut self, _ctx: &CommandContext<'_>) -> bool {
        true
    }
}

#[test]
fn schedule_from_execute_starts_next_tick() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let target = scheduler.add_command(Probe::new("T", &log)).unwrap();
    let launcher = scheduler.add_command(Launcher { target }).unwrap();

    scheduler.schedule(launcher).unwrap();
    scheduler.run(&tick(1)).unwrap();
    assert!(take(&log).is_empty());
    assert_eq!(scheduler.state(target), Some(CommandState::Pending));

    scheduler.run(&tick(2)).unwrap();
    assert_eq!(take(&log), ["T.init", "T.exec"]);
}

#[test]
fn session_end_gives_final_clean_end() {
    let log = journal();
    let mut scheduler = CommandScheduler::new();
    let s = scheduler
        .register_subsystem(Mechanism::handle("S", &log))
        .unwrap();
    let d = scheduler.add_command(Probe::new("D", &log).requiring(s)).unwrap();
    scheduler.set_default_command(s, d).unwrap();

    scheduler.run(&tick(1)).unwrap();
    take(&log);

    let disabled = tick(2).with_enabled(false);
    scheduler.run(&disabled).unwrap();
    assert_eq!(take(&log), ["S.periodic", "D.end(true)"]);

    // Disabled defaults are not re-queued.
    scheduler.run(&tick(3).with_enabled(false)).unwrap();
    assert_eq!(take(&log), ["S.periodic"]);
    assert_eq!(scheduler.stats().rejected, 0);
}
