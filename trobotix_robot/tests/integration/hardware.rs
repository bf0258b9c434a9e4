//! Hardware map against the simulated hub.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use trobotix_robot::DriverError;
use trobotix_robot::hardware::HardwareMap;
use trobotix_robot::hardware::encoder::counts_per_rev;
use trobotix_robot::hardware::sim::{SimHub, SimMotorSpec};

fn hardware() -> (Rc<RefCell<SimHub>>, HardwareMap) {
    let mut hub = SimHub::new(12.0);
    hub.add_motor("Left", SimMotorSpec::default());
    hub.add_motor("Right", SimMotorSpec::default());
    let sim = Rc::new(RefCell::new(hub));
    (sim.clone(), HardwareMap::new(sim))
}

#[test]
fn encoder_velocity_tracks_rotor_speed() {
    let (sim, hw) = hardware();
    let mut motor = hw.motor("Left").unwrap();
    let encoder = hw.encoder("Left", counts_per_rev::GOBILDA_6000RPM).unwrap();

    motor.set(1.0);
    for _ in 0..200 {
        hw.bulk_read();
        hw.recalculate_velocity(0.01);
    }

    let rotor = sim.borrow().speed(0) / TAU;
    let measured = encoder.velocity();
    assert!(
        (measured - rotor).abs() / rotor < 0.03,
        "encoder {measured} rot/s vs rotor {rotor} rot/s"
    );
    assert!(encoder.position() > 0.0);
}

#[test]
fn inverted_encoder_reads_negative() {
    let (_sim, hw) = hardware();
    let mut motor = hw.motor("Right").unwrap();
    let encoder = hw.encoder("Right", counts_per_rev::GOBILDA_6000RPM).unwrap();
    encoder.set_inverted(true);

    motor.set(0.5);
    for _ in 0..20 {
        hw.bulk_read();
        hw.recalculate_velocity(0.01);
    }
    assert!(encoder.position() < 0.0);
    assert!(encoder.velocity() < 0.0);

    // Clones share inversion.
    let copy = encoder.clone();
    copy.set_inverted(false);
    assert!(encoder.position() > 0.0);
}

#[test]
fn unknown_device_is_reported_by_name() {
    let (_sim, hw) = hardware();
    assert!(matches!(
        hw.motor("Arm"),
        Err(DriverError::UnknownDevice(name)) if name == "Arm"
    ));
    assert!(hw.encoder("Arm", 28.0).is_err());
    assert_eq!(hw.port("Right").unwrap(), 1);
    assert_eq!(hw.bus_voltage(), 12.0);
}
