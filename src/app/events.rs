//! Outbound application events.
//!
//! The [`HeatingService`](super::service::HeatingService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use crate::control::offset::Reasons;
use crate::diagnostics::HeartbeatData;
use crate::error::HardwareFault;
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A cycle finished and its outputs changed since the last report.
    OutputChanged(OutputReport),

    /// A hardware fault was raised.
    FaultDetected(HardwareFault),

    /// Safe state entered; carries the latched fault mask.
    EnteredSafeState(u8),

    /// Periodic health report.
    Heartbeat(HeartbeatData),

    /// One of the operator/forecast flags changed.
    FlagChanged {
        entity: String,
        old: Option<String>,
        new: Option<String>,
    },

    /// A zone setpoint was forwarded to a valve.
    SetpointRelayed { entity: String, temperature: f64 },

    /// Temporary warm water was requested; expires after `duration_secs`.
    WarmWaterStarted { duration_secs: u32 },

    /// Temporary warm water ended (cancelled or expired).
    WarmWaterStopped { expired: bool },
}

/// Summary of one cycle's outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputReport {
    pub offset: f64,
    /// Candidate thermostat setpoint.
    pub setpoint: f64,
    /// Whether the setpoint was written.
    pub written: bool,
    pub reasons: Reasons,
    pub corridor_setpoint: f64,
    pub wam: f64,
    pub max_radiator_error: f64,
    pub force_flow: bool,
}
