//! Op-mode bindings under the driver.

use trobotix_robot::hardware::gamepad::{Buttons, GamepadState};

use super::support::*;

fn full_forward() -> GamepadState {
    GamepadState {
        left_y: -1.0,
        ..GamepadState::default()
    }
}

#[test]
fn drive_maps_left_stick_to_full_speed() {
    let (sim, mut runner) = runner();
    set_gamepad(&sim, 0, full_forward());

    let mut observed = Vec::new();
    runner
        .run_named("Drive", |s| {
            if s.cycle_count > 0 {
                observed.push((power(&sim, FRONT_LEFT), power(&sim, BACK_RIGHT)));
            }
            s.cycle_count >= 3
        })
        .unwrap();

    assert_eq!(observed.len(), 3);
    for (front_left, back_right) in observed {
        assert_close(front_left, 1.0);
        assert_close(back_right, -1.0);
    }
}

#[test]
fn drive_a_button_toggles_the_test_motor() {
    let (sim, mut runner) = runner();
    set_gamepad(
        &sim,
        1,
        GamepadState {
            right_trigger: 0.5,
            ..GamepadState::default()
        },
    );
    let pressed = GamepadState {
        buttons: Buttons::A,
        ..GamepadState::default()
    };

    let mut checks = Vec::new();
    runner
        .run_named("Drive", |s| {
            match s.cycle_count {
                2 | 4 => set_gamepad(&sim, 0, pressed),
                3 => {
                    checks.push(power(&sim, TEST_MOTOR));
                    set_gamepad(&sim, 0, GamepadState::default());
                }
                5 => checks.push(power(&sim, TEST_MOTOR)),
                _ => {}
            }
            s.cycle_count >= 6
        })
        .unwrap();

    // 0.5 * 12 V is under the stall limit, so it passes through unchanged.
    assert_close(checks[0], 0.5);
    // Second press cancels it and the default command zeroes the output.
    assert_close(checks[1], 0.0);
}

#[test]
fn bindings_of_other_op_modes_stay_dormant() {
    let (sim, mut runner) = runner();
    set_gamepad(&sim, 0, full_forward());
    runner.run_named("Drive", |s| s.cycle_count >= 2).unwrap();
    assert_close(power(&sim, FRONT_LEFT), 1.0);

    let mut observed = Vec::new();
    runner
        .run_named("DrivetrainTest", |s| {
            if s.cycle_count > 0 {
                observed.push(power(&sim, FRONT_LEFT));
            }
            s.cycle_count >= 3
        })
        .unwrap();

    // Forward only, 1 m/s of 1.5 m/s. Drive's own binding never fires here.
    assert_eq!(observed.len(), 3);
    for front_left in observed {
        assert_close(front_left, 1.0 / 1.5);
    }
    assert_eq!(runner.initialized_op_modes().count(), 2);
}

#[test]
fn back_to_back_sessions_restart_the_drive_command() {
    let (sim, mut runner) = runner();
    set_gamepad(&sim, 0, full_forward());
    runner.run_named("DrivetrainTest", |s| s.cycle_count >= 2).unwrap();
    runner.run_named("Drive", |s| s.cycle_count >= 2).unwrap();
    assert_close(power(&sim, FRONT_LEFT), 1.0);

    runner.run_named("DrivetrainTest", |s| s.cycle_count >= 2).unwrap();
    assert_close(power(&sim, FRONT_LEFT), 1.0 / 1.5);
    assert_close(power(&sim, BACK_LEFT), 1.0 / 1.5);
}
