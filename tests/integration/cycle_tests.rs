//! Integration tests for the scheduler → cycle → device pipeline.

use smartheat::app::commands::AppCommand;
use smartheat::app::events::AppEvent;
use smartheat::app::ports::NumericDomain;
use smartheat::config::ControllerConfig;
use smartheat::control::offset::OffsetReason;
use smartheat::error::HardwareFault;
use smartheat::fsm::StateId;
use smartheat::zones::{FloorZone, RadiatorZone, Valve};

use crate::mock_device::started;

const WAM: &str = "input_number.sh_wam_value";
const OFFSET: &str = "input_number.sh_setpoint_offset";
const THERMOSTAT: &str = "number.thermostat_setpoint";

fn outputs(events: &[AppEvent]) -> Vec<&smartheat::app::events::OutputReport> {
    events
        .iter()
        .filter_map(|e| match e {
            AppEvent::OutputChanged(o) => Some(o),
            _ => None,
        })
        .collect()
}

// ── Nominal cycle ─────────────────────────────────────────────

#[test]
fn quiet_house_writes_zero_offset_and_holds_thermostat() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    assert_eq!(app.state(), StateId::Idle);
    assert!(dev
        .writes
        .contains(&("input_boolean.temporary_ww".to_owned(), "off".to_owned())));

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.cycle_count(), 1);
    assert_eq!(app.state(), StateId::Idle);
    assert_eq!(dev.values_for(WAM), vec![0.0]);
    assert_eq!(dev.values_for(OFFSET), vec![0.0]);
    assert_eq!(dev.domain_for(OFFSET), Some(NumericDomain::InputNumber));
    assert!(dev.values_for(THERMOSTAT).is_empty(), "gate should hold");
    assert!(dev.presets().is_empty());

    let reports = outputs(&sink.events);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].offset, 0.0);
    assert_eq!(reports[0].setpoint, 21.0);
    assert!(!reports[0].written);
    assert!(reports[0].reasons.is_empty());
}

#[test]
fn first_cycle_waits_one_full_period() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    app.poll(59.0, &mut dev, &mut sink);
    assert_eq!(app.cycle_count(), 0);
    app.poll(1.0, &mut dev, &mut sink);
    assert_eq!(app.cycle_count(), 1);
}

#[test]
fn run_cycle_command_runs_immediately() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    app.handle_command(AppCommand::RunCycle, &mut dev, &mut sink);
    assert_eq!(app.cycle_count(), 1);
    assert!(app.last_decision().is_some());
}

#[test]
fn unchanged_outputs_are_reported_once() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    let points = app.settings().points.clone();

    app.poll(60.0, &mut dev, &mut sink);
    app.poll(60.0, &mut dev, &mut sink);
    assert_eq!(outputs(&sink.events).len(), 1);
    assert_eq!(dev.values_for(OFFSET).len(), 2, "offset is written every cycle");

    dev.set_floor(&points, FloorZone::LivingRoom, 0.7);
    app.poll(60.0, &mut dev, &mut sink);

    let reports = outputs(&sink.events);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].offset, 0.1);
    assert_eq!(reports[1].reasons.as_slice(), &[OffsetReason::Wam]);
}

#[test]
fn thermostat_written_when_candidate_moves_past_threshold() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    dev.set(THERMOSTAT, "20");

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(dev.values_for(THERMOSTAT), vec![21.0]);
    assert_eq!(dev.domain_for(THERMOSTAT), Some(NumericDomain::Number));
    assert!(outputs(&sink.events)[0].written);
}

#[test]
fn thermostat_write_is_floored() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    dev.set("input_number.corridor_setpoint", "10");
    dev.set(THERMOSTAT, "20");

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(dev.values_for(THERMOSTAT), vec![15.0]);
    assert_eq!(outputs(&sink.events)[0].setpoint, 10.0);
}

#[test]
fn forced_burn_lifts_offset_and_setpoint() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    let points = app.settings().points.clone();
    dev.set_floor(&points, FloorZone::Corridor, -1.0);
    dev.set_radiator(&points, RadiatorZone::Office, 2.0);

    app.poll(60.0, &mut dev, &mut sink);

    let decision = app.last_decision().expect("decision");
    assert_eq!(decision.wam, -0.14);
    assert_eq!(decision.offset, 0.4);
    assert_eq!(
        decision.reasons.as_slice(),
        &[OffsetReason::Wam, OffsetReason::ForcedBurn]
    );
    let written = dev.values_for(THERMOSTAT);
    assert_eq!(written.len(), 1);
    assert!((written[0] - 22.4).abs() < 1e-9);
}

#[test]
fn unavailable_sensors_fall_back_to_defaults() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    let points = app.settings().points.clone();
    dev.set(&points.floor_errors[FloorZone::LivingRoom.index()], "unavailable");
    dev.set(&points.valve_positions[Valve::Garage.index()], "unknown");
    dev.states.remove(&points.warm_flag);

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.state(), StateId::Idle);
    assert_eq!(app.fault_flags(), 0);
    assert_eq!(dev.values_for(OFFSET), vec![0.0]);
}

// ── Boost ─────────────────────────────────────────────────────

#[test]
fn cold_zone_with_closed_valve_is_boosted_every_cycle() {
    let mut config = ControllerConfig::sample();
    config.tuning.radiator_boost_threshold = Some(30.0);
    let (mut app, mut dev, mut sink) = started(&config);
    let points = app.settings().points.clone();

    dev.set_radiator(&points, RadiatorZone::Office, 0.8);
    dev.set_position(&points, Valve::Office, 10.0);
    dev.set_radiator(&points, RadiatorZone::Bedroom, 0.8);
    dev.set_position(&points, Valve::BedroomLeft, 10.0);
    dev.set_position(&points, Valve::BedroomRight, 60.0);

    app.poll(60.0, &mut dev, &mut sink);
    assert_eq!(
        dev.presets(),
        vec![
            ("climate.office_trv", "boost"),
            ("climate.bedroom_left_trv", "boost"),
        ]
    );

    dev.clear();
    app.poll(60.0, &mut dev, &mut sink);
    assert_eq!(dev.presets().len(), 2);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn rejected_write_latches_safe_and_cancels_timers() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    dev.reject(OFFSET);

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.state(), StateId::Safe);
    assert_eq!(app.fault_flags(), HardwareFault::DeviceCallFailed.mask());
    assert!(!app.cycle_timer_active());
    assert!(!app.heartbeat_timer_active());
    assert_eq!(dev.values_for(WAM), vec![0.0], "writes before the failure stand");
    assert!(sink
        .events
        .contains(&AppEvent::FaultDetected(HardwareFault::DeviceCallFailed)));
    assert!(sink.events.contains(&AppEvent::EnteredSafeState(
        HardwareFault::DeviceCallFailed.mask()
    )));
    assert!(sink.events.contains(&AppEvent::StateChanged {
        from: StateId::Idle,
        to: StateId::Safe,
    }));
    assert!(outputs(&sink.events).is_empty());

    dev.clear();
    app.poll(3600.0, &mut dev, &mut sink);
    app.handle_command(AppCommand::RunCycle, &mut dev, &mut sink);
    assert_eq!(app.cycle_count(), 1);
    assert!(dev.calls.is_empty(), "no actuation once safe");
    assert_eq!(app.state(), StateId::Safe);
}

#[test]
fn non_numeric_thermostat_target_is_unsupported() {
    let mut config = ControllerConfig::sample();
    config.points.thermostat_setpoint = Some("climate.thermostat".to_owned());
    let (mut app, mut dev, mut sink) = started(&config);
    dev.set("climate.thermostat", "20");

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.state(), StateId::Safe);
    assert_eq!(app.fault_flags(), HardwareFault::UnsupportedTarget.mask());
    assert_eq!(dev.values_for(OFFSET), vec![0.0]);
}

#[test]
fn unsupported_diagnostics_target_faults_before_any_write() {
    let mut config = ControllerConfig::sample();
    config.points.wam_value = Some("sensor.sh_wam".to_owned());
    let (mut app, mut dev, mut sink) = started(&config);

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.state(), StateId::Safe);
    assert!(dev.calls.is_empty());
}

#[test]
fn huge_zone_errors_never_write_non_finite_values() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    let points = app.settings().points.clone();
    for entity in &points.floor_errors {
        dev.set(entity, "1e308");
    }

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.state(), StateId::Idle);
    assert_eq!(app.fault_flags(), 0);
    let values = dev.all_values();
    assert!(!values.is_empty());
    assert!(values.iter().all(|v| v.is_finite()), "wrote {values:?}");
}

#[test]
fn overflowing_setpoint_faults_without_writes() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    let points = app.settings().points.clone();
    for entity in &points.floor_errors {
        dev.set(entity, "1e308");
    }
    dev.set(&points.floor_errors[FloorZone::Corridor.index()], "-1e308");
    dev.set(&points.corridor_setpoint, "1e308");
    dev.clear();

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.state(), StateId::Safe);
    assert_eq!(app.fault_flags(), HardwareFault::OutputNotFinite.mask());
    assert!(dev.calls.is_empty());
    assert!(!app.cycle_timer_active());
    assert!(!app.heartbeat_timer_active());
    assert!(outputs(&sink.events).is_empty());
}

#[test]
fn undefined_vote_latches_safe_without_writes() {
    // Negative factors are accepted as long as the sum is positive, so a
    // large error on an amplified zone can overflow the mean.
    let mut config = ControllerConfig::sample();
    let factors = config.floor_factors.as_mut().unwrap();
    for v in factors.values_mut() {
        *v = 0.0;
    }
    factors.insert("livingroom".into(), 3.0);
    factors.insert("bathroom".into(), -2.0);
    let (mut app, mut dev, mut sink) = started(&config);
    let points = app.settings().points.clone();
    dev.set(&points.floor_errors[FloorZone::LivingRoom.index()], "1e308");
    dev.clear();

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.state(), StateId::Safe);
    assert_eq!(app.fault_flags(), HardwareFault::WamUndefined.mask());
    assert!(dev.calls.is_empty(), "no offset or setpoint change");
    assert!(dev.values_for(THERMOSTAT).is_empty());
    assert!(!app.cycle_timer_active());
    assert!(!app.heartbeat_timer_active());
    assert!(app.last_decision().is_none());
    assert!(sink
        .events
        .contains(&AppEvent::FaultDetected(HardwareFault::WamUndefined)));
    assert!(sink.events.contains(&AppEvent::StateChanged {
        from: StateId::Idle,
        to: StateId::Safe,
    }));

    app.poll(600.0, &mut dev, &mut sink);
    assert_eq!(app.cycle_count(), 1);
}

#[test]
fn panicking_cycle_is_caught_and_latches_safe() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    let points = app.settings().points.clone();
    dev.panic_on_read(&points.corridor_setpoint);
    dev.clear();

    app.poll(60.0, &mut dev, &mut sink);

    assert_eq!(app.state(), StateId::Safe);
    assert_eq!(app.fault_flags(), HardwareFault::CycleAborted.mask());
    assert!(dev.calls.is_empty());
    assert!(!app.cycle_timer_active());
    assert!(!app.heartbeat_timer_active());
    assert!(sink
        .events
        .contains(&AppEvent::FaultDetected(HardwareFault::CycleAborted)));
    assert!(sink.events.contains(&AppEvent::EnteredSafeState(
        HardwareFault::CycleAborted.mask()
    )));

    // Later commands are still handled after the caught panic.
    app.handle_command(AppCommand::RunCycle, &mut dev, &mut sink);
    assert_eq!(app.cycle_count(), 1);
    assert_eq!(app.state(), StateId::Safe);
}

// ── Heartbeat ─────────────────────────────────────────────────

#[test]
fn heartbeat_reports_last_outputs() {
    let mut config = ControllerConfig::sample();
    config.tuning.heartbeat_interval_secs = Some(120);
    let (mut app, mut dev, mut sink) = started(&config);

    app.poll(60.0, &mut dev, &mut sink);
    app.poll(60.0, &mut dev, &mut sink);

    let beats: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Heartbeat(h) => Some(h),
            _ => None,
        })
        .collect();
    assert_eq!(beats.len(), 1);
    assert_eq!(beats[0].last_offset, Some(0.0));
    assert_eq!(beats[0].last_setpoint, Some(21.0));
    assert_eq!(beats[0].reasons_text(), "none");
    assert!(beats[0].loop_age_secs.is_some());
    assert!(beats[0].loop_duration_secs.is_some());
}

#[test]
fn heartbeat_before_any_cycle_has_no_data() {
    let mut config = ControllerConfig::sample();
    config.tuning.cycle_time_secs = Some(600);
    config.tuning.heartbeat_interval_secs = Some(60);
    let (mut app, mut dev, mut sink) = started(&config);

    app.poll(60.0, &mut dev, &mut sink);

    let beat = sink.events.iter().find_map(|e| match e {
        AppEvent::Heartbeat(h) => Some(h),
        _ => None,
    });
    let beat = beat.expect("heartbeat");
    assert_eq!(beat.last_offset, None);
    assert_eq!(beat.loop_age_secs, None);
}
