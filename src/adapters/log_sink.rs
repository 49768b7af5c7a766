//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade, one `TAG | key=value` line per event.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::control::offset::reasons_text;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn or_na(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_owned(), |v| format!("{v:.decimals$}"))
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={state:?}");
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {from:?} -> {to:?}");
            }
            AppEvent::OutputChanged(o) => {
                info!(
                    "OUTPUT | offset={} thermostat_setpoint={} written={} | reason={} | \
                     corridor_setpoint={} wam={} max_rads_error={} force_flow_flag={}",
                    o.offset,
                    o.setpoint,
                    o.written,
                    reasons_text(&o.reasons),
                    o.corridor_setpoint,
                    o.wam,
                    o.max_radiator_error,
                    o.force_flow,
                );
            }
            AppEvent::FaultDetected(fault) => {
                error!("FAULT | detected: {fault} (0b{:08b})", fault.mask());
            }
            AppEvent::EnteredSafeState(flags) => {
                error!("SAFE | actuation stopped, faults=0b{flags:08b}");
            }
            AppEvent::Heartbeat(h) => {
                info!(
                    "HEARTBEAT | last_offset={} last_setpoint={} last_reasons={} | \
                     loop_age_s={} loop_duration_s={}",
                    or_na(h.last_offset, 1),
                    or_na(h.last_setpoint, 2),
                    h.reasons_text(),
                    or_na(h.loop_age_secs, 1),
                    or_na(h.loop_duration_secs, 3),
                );
            }
            AppEvent::FlagChanged { entity, old, new } => {
                info!(
                    "FLAG | {entity} {} -> {}",
                    old.as_deref().unwrap_or("none"),
                    new.as_deref().unwrap_or("none")
                );
            }
            AppEvent::SetpointRelayed {
                entity,
                temperature,
            } => {
                info!("SETPOINT | {entity} <- {temperature}");
            }
            AppEvent::WarmWaterStarted { duration_secs } => {
                info!("WARM_WATER | on for {duration_secs}s");
            }
            AppEvent::WarmWaterStopped { expired } => {
                if *expired {
                    info!("WARM_WATER | off (expired)");
                } else {
                    warn!("WARM_WATER | off (cancelled)");
                }
            }
        }
    }
}
