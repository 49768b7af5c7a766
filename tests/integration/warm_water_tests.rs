//! Integration tests for the temporary warm-water timer.

use smartheat::app::commands::AppCommand;
use smartheat::app::events::AppEvent;
use smartheat::config::ControllerConfig;

use crate::mock_device::{started, MockDevice, RecordingSink};

const REQUEST: &str = "input_boolean.temporary_ww";
const STATE: &str = "input_boolean.ww_state";

fn config() -> ControllerConfig {
    // Keep the control cycle and heartbeat out of the way.
    let mut config = ControllerConfig::sample();
    config.tuning.cycle_time_secs = Some(3600);
    config.tuning.heartbeat_interval_secs = Some(3600);
    config
}

fn request(
    app: &mut smartheat::app::service::HeatingService,
    dev: &mut MockDevice,
    sink: &mut RecordingSink,
    old: &str,
    new: &str,
) {
    app.handle_command(
        AppCommand::StateChanged {
            entity: REQUEST.to_owned(),
            old: Some(old.to_owned()),
            new: Some(new.to_owned()),
        },
        dev,
        sink,
    );
}

#[test]
fn request_expires_after_duration() {
    let (mut app, mut dev, mut sink) = started(&config());

    request(&mut app, &mut dev, &mut sink, "off", "on");
    assert!(app.warm_water_active());
    assert!(sink
        .events
        .contains(&AppEvent::WarmWaterStarted { duration_secs: 900 }));
    assert!(dev.turned_off().is_empty(), "start issues no device call");

    app.poll(899.0, &mut dev, &mut sink);
    assert!(dev.turned_off().is_empty());

    app.poll(1.0, &mut dev, &mut sink);
    assert_eq!(dev.turned_off(), vec![STATE]);
    assert!(!app.warm_water_active());
    assert!(sink
        .events
        .contains(&AppEvent::WarmWaterStopped { expired: true }));
}

#[test]
fn clearing_request_turns_off_immediately() {
    let (mut app, mut dev, mut sink) = started(&config());

    request(&mut app, &mut dev, &mut sink, "off", "on");
    app.poll(300.0, &mut dev, &mut sink);
    request(&mut app, &mut dev, &mut sink, "on", "off");

    assert_eq!(dev.turned_off(), vec![STATE]);
    assert!(!app.warm_water_active());
    assert!(sink
        .events
        .contains(&AppEvent::WarmWaterStopped { expired: false }));

    // The cancelled timer never fires.
    app.poll(900.0, &mut dev, &mut sink);
    assert_eq!(dev.turned_off().len(), 1);
}

#[test]
fn repeated_request_restarts_the_timer() {
    let (mut app, mut dev, mut sink) = started(&config());

    request(&mut app, &mut dev, &mut sink, "off", "on");
    app.poll(600.0, &mut dev, &mut sink);
    request(&mut app, &mut dev, &mut sink, "off", "on");

    app.poll(600.0, &mut dev, &mut sink);
    assert!(dev.turned_off().is_empty(), "restart resets the countdown");
    assert!(app.warm_water_active());

    app.poll(300.0, &mut dev, &mut sink);
    assert_eq!(dev.turned_off(), vec![STATE]);
}

#[test]
fn other_transitions_are_ignored() {
    let (mut app, mut dev, mut sink) = started(&config());
    sink.clear();

    request(&mut app, &mut dev, &mut sink, "on", "on");
    request(&mut app, &mut dev, &mut sink, "unavailable", "on");
    request(&mut app, &mut dev, &mut sink, "off", "unknown");

    assert!(!app.warm_water_active());
    assert!(sink.events.is_empty());
    assert!(dev.calls.is_empty());
}

#[test]
fn configured_duration_is_used() {
    let mut cfg = config();
    cfg.tuning.warm_water_duration_secs = Some(120);
    let (mut app, mut dev, mut sink) = started(&cfg);

    request(&mut app, &mut dev, &mut sink, "off", "on");
    app.poll(120.0, &mut dev, &mut sink);

    assert_eq!(dev.turned_off(), vec![STATE]);
}
