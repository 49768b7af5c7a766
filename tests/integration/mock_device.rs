//! Mock device adapter for integration tests.
//!
//! Records every service call and direct state write so tests can
//! assert on the full command history.  Entities can be told to reject
//! writes to exercise the fault path.

use std::collections::{HashMap, HashSet};

use smartheat::app::events::AppEvent;
use smartheat::app::ports::{DeviceError, DevicePort, EventSink, NumericDomain, ServiceCall};
use smartheat::app::service::HeatingService;
use smartheat::config::{ControllerConfig, PointTable};
use smartheat::zones::{FloorZone, RadiatorZone, Valve};

// ── MockDevice ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDevice {
    pub states: HashMap<String, String>,
    pub calls: Vec<ServiceCall>,
    pub writes: Vec<(String, String)>,
    reject: HashSet<String>,
    panic_on: HashSet<String>,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A quiet house: every error 0, corridor and thermostat at 21,
    /// valves half open, flags off.
    pub fn healthy(points: &PointTable) -> Self {
        let mut dev = Self::new();
        for entity in points.floor_errors.iter().chain(&points.radiator_errors) {
            dev.set(entity, "0");
        }
        for entity in &points.valve_positions {
            dev.set(entity, "50");
        }
        for entity in [&points.warm_flag, &points.freezing_flag, &points.force_flow_flag] {
            dev.set(entity, "off");
        }
        dev.set(&points.corridor_setpoint, "21");
        dev.set(&points.thermostat_setpoint, "21");
        dev
    }

    pub fn set(&mut self, entity: &str, state: &str) {
        self.states.insert(entity.to_owned(), state.to_owned());
    }

    pub fn set_floor(&mut self, points: &PointTable, zone: FloorZone, value: f64) {
        self.set(&points.floor_errors[zone.index()], &value.to_string());
    }

    pub fn set_radiator(&mut self, points: &PointTable, zone: RadiatorZone, value: f64) {
        self.set(&points.radiator_errors[zone.index()], &value.to_string());
    }

    pub fn set_position(&mut self, points: &PointTable, valve: Valve, value: f64) {
        self.set(&points.valve_positions[valve.index()], &value.to_string());
    }

    /// Make every call or write to `entity` fail.
    pub fn reject(&mut self, entity: &str) {
        self.reject.insert(entity.to_owned());
    }

    /// Panic whenever `entity` is read.
    pub fn panic_on_read(&mut self, entity: &str) {
        self.panic_on.insert(entity.to_owned());
    }

    /// Every numeric value written, to any entity.
    pub fn all_values(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServiceCall::SetValue { value, .. } => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Numeric values written to `entity`, oldest first.
    pub fn values_for(&self, entity: &str) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServiceCall::SetValue { entity: e, value, .. } if e == entity => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn domain_for(&self, entity: &str) -> Option<NumericDomain> {
        self.calls.iter().find_map(|c| match c {
            ServiceCall::SetValue { entity: e, domain, .. } if e == entity => Some(*domain),
            _ => None,
        })
    }

    pub fn presets(&self) -> Vec<(&str, &str)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServiceCall::SetPresetMode { entity, preset } => {
                    Some((entity.as_str(), preset.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn temperatures(&self) -> Vec<(&str, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServiceCall::SetTemperature {
                    entity,
                    temperature,
                } => Some((entity.as_str(), *temperature)),
                _ => None,
            })
            .collect()
    }

    pub fn turned_off(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServiceCall::TurnOff { entity } => Some(entity.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
        self.writes.clear();
    }
}

impl DevicePort for MockDevice {
    fn state(&self, entity: &str) -> Option<String> {
        if self.panic_on.contains(entity) {
            panic!("sensor driver crashed reading {entity}");
        }
        self.states.get(entity).cloned()
    }

    fn call_service(&mut self, call: &ServiceCall) -> Result<(), DeviceError> {
        if self.reject.contains(call.entity()) {
            return Err(DeviceError::Rejected(format!("{} refused", call.service())));
        }
        self.calls.push(call.clone());
        Ok(())
    }

    fn set_state(&mut self, entity: &str, state: &str) -> Result<(), DeviceError> {
        if self.reject.contains(entity) {
            return Err(DeviceError::Rejected(format!("{entity} is read-only")));
        }
        self.writes.push((entity.to_owned(), state.to_owned()));
        self.set(entity, state);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

/// Validate `config`, seed a healthy device and start the service.
pub fn started(config: &ControllerConfig) -> (HeatingService, MockDevice, RecordingSink) {
    let mut app = HeatingService::from_config(config).expect("valid config");
    let mut dev = MockDevice::healthy(&app.settings().points);
    let mut sink = RecordingSink::new();
    app.start(&mut dev, &mut sink).expect("start");
    (app, dev, sink)
}
