//! Integration tests for entity state-change handling: flag logging,
//! setpoint relay and startup failures.

use smartheat::app::commands::AppCommand;
use smartheat::app::events::AppEvent;
use smartheat::app::service::HeatingService;
use smartheat::config::ControllerConfig;
use smartheat::error::{Error, HardwareFault};
use smartheat::fsm::StateId;

use crate::mock_device::{started, MockDevice, RecordingSink};

fn changed(entity: &str, old: Option<&str>, new: Option<&str>) -> AppCommand {
    AppCommand::StateChanged {
        entity: entity.to_owned(),
        old: old.map(str::to_owned),
        new: new.map(str::to_owned),
    }
}

fn flag_events(sink: &RecordingSink) -> usize {
    sink.count(|e| matches!(e, AppEvent::FlagChanged { .. }))
}

// ── Flags ─────────────────────────────────────────────────────

#[test]
fn flag_transition_is_reported() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());

    app.handle_command(
        changed("input_boolean.make_warm", Some("off"), Some("on")),
        &mut dev,
        &mut sink,
    );

    assert!(sink.events.contains(&AppEvent::FlagChanged {
        entity: "input_boolean.make_warm".to_owned(),
        old: Some("off".to_owned()),
        new: Some("on".to_owned()),
    }));
}

#[test]
fn flag_between_unavailable_states_is_silent() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());

    app.handle_command(
        changed("input_boolean.force_flow", Some("unavailable"), Some("unknown")),
        &mut dev,
        &mut sink,
    );
    app.handle_command(
        changed("input_boolean.force_flow", None, Some("unavailable")),
        &mut dev,
        &mut sink,
    );
    assert_eq!(flag_events(&sink), 0);

    app.handle_command(
        changed("input_boolean.force_flow", Some("unavailable"), Some("on")),
        &mut dev,
        &mut sink,
    );
    assert_eq!(flag_events(&sink), 1);
}

#[test]
fn unrelated_entities_are_ignored() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    sink.clear();

    app.handle_command(
        changed("sensor.kitchen_humidity", Some("40"), Some("41")),
        &mut dev,
        &mut sink,
    );

    assert!(sink.events.is_empty());
    assert!(dev.calls.is_empty());
}

// ── Setpoint relay ────────────────────────────────────────────

#[test]
fn zone_setpoint_is_relayed_to_every_valve() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());

    app.handle_command(
        changed("input_number.bedroom_setpoint", Some("19"), Some("19.5")),
        &mut dev,
        &mut sink,
    );

    assert_eq!(
        dev.temperatures(),
        vec![
            ("climate.bedroom_left_trv", 19.5),
            ("climate.bedroom_right_trv", 19.5),
        ]
    );
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SetpointRelayed { .. })),
        2
    );
}

#[test]
fn invalid_setpoint_is_not_relayed() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());

    for new in [Some("unavailable"), None, Some("warm")] {
        app.handle_command(
            changed("input_number.office_setpoint", Some("20"), new),
            &mut dev,
            &mut sink,
        );
    }

    assert!(dev.temperatures().is_empty());
}

#[test]
fn failed_relay_is_not_a_fault() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    dev.reject("climate.bedroom_left_trv");

    app.handle_command(
        changed("input_number.bedroom_setpoint", Some("19"), Some("21")),
        &mut dev,
        &mut sink,
    );

    assert_eq!(dev.temperatures(), vec![("climate.bedroom_right_trv", 21.0)]);
    assert_eq!(app.state(), StateId::Idle);
    assert_eq!(app.fault_flags(), 0);
}

#[test]
fn relay_keeps_working_in_safe_state() {
    let (mut app, mut dev, mut sink) = started(&ControllerConfig::sample());
    dev.reject("input_number.sh_wam_value");
    app.poll(60.0, &mut dev, &mut sink);
    assert_eq!(app.state(), StateId::Safe);

    app.handle_command(
        changed("input_number.garage_setpoint", Some("12"), Some("14")),
        &mut dev,
        &mut sink,
    );

    assert_eq!(dev.temperatures(), vec![("climate.garage_trv", 14.0)]);
}

#[test]
fn watched_entities_cover_every_listener() {
    let app = HeatingService::from_config(&ControllerConfig::sample()).expect("valid config");
    let watched = app.watched_entities();

    for entity in [
        "input_boolean.make_warm",
        "input_boolean.freezing_forecast",
        "input_boolean.force_flow",
        "input_boolean.temporary_ww",
        "input_number.office_setpoint",
        "input_number.garage_setpoint",
    ] {
        assert!(watched.iter().any(|w| w == entity), "{entity} not watched");
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_fails_when_warm_water_request_cannot_be_reset() {
    let mut app = HeatingService::from_config(&ControllerConfig::sample()).expect("valid config");
    let mut dev = MockDevice::healthy(&app.settings().points);
    dev.reject("input_boolean.temporary_ww");
    let mut sink = RecordingSink::new();

    let result = app.start(&mut dev, &mut sink);

    assert_eq!(
        result,
        Err(Error::Hardware(HardwareFault::DeviceCallFailed))
    );
    assert!(!sink.events.iter().any(|e| matches!(e, AppEvent::Started(_))));
}

#[test]
fn invalid_config_is_rejected_before_start() {
    let mut config = ControllerConfig::sample();
    config.points.corridor_setpoint = None;
    assert!(HeatingService::from_config(&config).is_err());
}
