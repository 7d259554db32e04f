//! # Controller Integration Tests
//!
//! Exercises the controller end-to-end over the simulation backend:
//!
//! - actuator writes reflected by the immediately following snapshot
//! - caller errors leave the hardware untouched
//! - sensor exhaustion degrades the snapshot instead of failing it
//! - concurrent callers never observe a snapshot inconsistent with their
//!   own just-applied write

use std::sync::Arc;
use std::thread;

use domo_common::config::NodeConfig;
use domo_common::error::HwError;
use domo_common::io::line::Device;
use domo_common::io::registry::LineRegistry;
use domo_common::snapshot::StatusSnapshot;
use domo_hal::Controller;
use domo_hal::backends::sim::{SimBackend, SimHandle};

// ─── Helpers ────────────────────────────────────────────────────────

/// Build a controller over a fresh simulation backend with a fast retry
/// policy (tests never wait out real sensor delays).
fn controller_with(attempts: u32) -> (Controller, SimHandle, NodeConfig) {
    let mut config = NodeConfig::default();
    config.sensor.attempts = attempts;
    config.sensor.retry_delay_ms = 0;
    let registry = Arc::new(LineRegistry::from_config(&config).unwrap());
    let (backend, handle) = SimBackend::with_handle();
    let controller = Controller::new(registry, Box::new(backend), &config).unwrap();
    (controller, handle, config)
}

fn led_state(snapshot: &StatusSnapshot, device: Device) -> bool {
    match device {
        Device::LedRed => snapshot.led_red,
        Device::LedYellow => snapshot.led_yellow,
        Device::LedGreen => snapshot.led_green,
        other => panic!("{other} is not an actuator"),
    }
}

// ─── Actuator round-trips ───────────────────────────────────────────

#[test]
fn red_led_on_then_off() {
    let (controller, _handle, _config) = controller_with(1);

    // initial state: everything off
    let snapshot = controller.get_status().unwrap();
    assert!(!snapshot.led_red);
    assert!(!snapshot.led_yellow);
    assert!(!snapshot.led_green);

    controller.set_actuator("ledRed", true).unwrap();
    let snapshot = controller.get_status().unwrap();
    assert!(snapshot.led_red);
    assert!(!snapshot.led_yellow);
    assert!(!snapshot.led_green);

    controller.set_actuator("ledRed", false).unwrap();
    let snapshot = controller.get_status().unwrap();
    assert!(!snapshot.led_red);
}

#[test]
fn every_actuator_tracks_its_last_applied_action() {
    let (controller, _handle, _config) = controller_with(1);
    for device in Device::ACTUATORS {
        for on in [true, false, true] {
            controller.set_actuator(device.wire_name(), on).unwrap();
            let snapshot = controller.get_status().unwrap();
            assert_eq!(led_state(&snapshot, device), on, "{device} should be {on}");
        }
        controller.set_actuator(device.wire_name(), false).unwrap();
    }
}

#[test]
fn repeating_an_action_is_idempotent() {
    let (controller, handle, _config) = controller_with(1);
    let first = controller.set_actuator("ledGreen", true).unwrap();
    let second = controller.set_actuator("ledGreen", true).unwrap();
    assert!(first.led_green);
    assert!(second.led_green);
    assert_eq!(handle.output(24), Some(true));
}

#[test]
fn inputs_are_read_live() {
    let (controller, handle, _config) = controller_with(1);
    assert!(!controller.get_status().unwrap().button);
    handle.set_input(20, true); // button pin
    handle.set_input(16, true); // PIR pin
    let snapshot = controller.get_status().unwrap();
    assert!(snapshot.button);
    assert!(snapshot.motion_sensor);
}

// ─── Caller errors ──────────────────────────────────────────────────

#[test]
fn unknown_device_is_rejected_without_mutation() {
    let (controller, handle, _config) = controller_with(1);
    let err = controller.set_actuator("ledBlue", true).unwrap_err();
    assert!(matches!(err, HwError::UnknownDevice(_)));
    for pin in [13, 23, 24] {
        assert_eq!(handle.output(pin), Some(false));
    }
}

#[test]
fn input_lines_are_invalid_actuator_targets() {
    let (controller, _handle, _config) = controller_with(1);
    for name in ["button", "motionSensor"] {
        let err = controller.set_actuator(name, true).unwrap_err();
        assert!(matches!(err, HwError::InvalidTarget(_)), "{name}");
    }
}

// ─── Sensor degradation ─────────────────────────────────────────────

#[test]
fn sensor_exhaustion_degrades_the_snapshot() {
    let (controller, handle, _config) = controller_with(3);
    handle.clear_climate();

    let snapshot = controller.get_status().unwrap();
    assert!(!snapshot.sensor_ok);
    assert_eq!(snapshot.temperature, None);
    assert_eq!(snapshot.humidity, None);
    // every snapshot runs its own fresh attempt sequence
    assert_eq!(handle.sample_calls(), 3);
}

#[test]
fn sensor_failure_does_not_block_actuator_control() {
    let (controller, handle, _config) = controller_with(2);
    handle.clear_climate();

    let snapshot = controller.set_actuator("ledYellow", true).unwrap();
    assert!(snapshot.led_yellow);
    assert!(!snapshot.sensor_ok);
    assert_eq!(handle.output(23), Some(true));
}

#[test]
fn sensor_recovery_is_observed_per_request() {
    let (controller, handle, _config) = controller_with(2);
    handle.clear_climate();
    assert!(!controller.get_status().unwrap().sensor_ok);

    handle.set_climate(18.5, 52.0);
    let snapshot = controller.get_status().unwrap();
    assert!(snapshot.sensor_ok);
    assert_eq!(snapshot.temperature, Some(18.5));
    assert_eq!(snapshot.humidity, Some(52.0));
}

// ─── Concurrency ────────────────────────────────────────────────────

/// Each `set_actuator` holds the bus lock across its write and the snapshot
/// it returns, so every caller must see its own write reflected — no matter
/// how many other callers are hammering the same lines.
#[test]
fn concurrent_callers_get_write_consistent_snapshots() {
    let (controller, _handle, _config) = controller_with(1);
    const ITERS: usize = 40;

    thread::scope(|scope| {
        for device in Device::ACTUATORS {
            let controller = controller.clone();
            scope.spawn(move || {
                for i in 0..ITERS {
                    let on = i % 2 == 0;
                    let snapshot = controller.set_actuator(device.wire_name(), on).unwrap();
                    assert_eq!(
                        led_state(&snapshot, device),
                        on,
                        "snapshot must reflect this caller's own write"
                    );
                }
            });
        }
        for _ in 0..2 {
            let controller = controller.clone();
            scope.spawn(move || {
                for _ in 0..ITERS {
                    let snapshot = controller.get_status().unwrap();
                    assert!(snapshot.sensor_ok);
                }
            });
        }
    });

    // last iteration of every writer was i = ITERS-1 (odd) → off
    let snapshot = controller.get_status().unwrap();
    assert!(!snapshot.led_red);
    assert!(!snapshot.led_yellow);
    assert!(!snapshot.led_green);
}
