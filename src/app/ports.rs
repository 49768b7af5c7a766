//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HeatingService (domain)
//! ```
//!
//! Driven adapters (home-automation state store, event sinks, config files)
//! implement these traits.  The [`HeatingService`](super::service::HeatingService)
//! consumes them via generics, so the domain core never touches a device
//! directly.
//!
//! All port errors are typed: callers must handle every variant explicitly.

use core::fmt;

use crate::config::ControllerConfig;

// ───────────────────────────────────────────────────────────────
// Device port (driven adapter: domain ↔ state store / service bus)
// ───────────────────────────────────────────────────────────────

/// States a device reports when it cannot be read.
pub const UNAVAILABLE_STATES: [&str; 2] = ["unknown", "unavailable"];

/// `true` for a missing state or one of [`UNAVAILABLE_STATES`].
pub fn is_unavailable(state: Option<&str>) -> bool {
    match state {
        None => true,
        Some(s) => UNAVAILABLE_STATES.contains(&s),
    }
}

/// A request on the platform's service bus.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    /// `input_number/set_value` or `number/set_value`.
    SetValue {
        domain: NumericDomain,
        entity: String,
        value: f64,
    },
    /// `climate/set_preset_mode`.
    SetPresetMode { entity: String, preset: String },
    /// `climate/set_temperature`.
    SetTemperature { entity: String, temperature: f64 },
    /// `input_boolean/turn_off`.
    TurnOff { entity: String },
}

/// Entity domains that accept numeric writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericDomain {
    InputNumber,
    Number,
}

impl NumericDomain {
    /// Domain of `entity` (the part before the first `.`), if it is numeric.
    pub fn of(entity: &str) -> Option<Self> {
        match entity.split_once('.').map(|(domain, _)| domain) {
            Some("input_number") => Some(Self::InputNumber),
            Some("number") => Some(Self::Number),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputNumber => "input_number",
            Self::Number => "number",
        }
    }
}

impl ServiceCall {
    /// `domain/service` name as the platform knows it.
    pub fn service(&self) -> &'static str {
        match self {
            Self::SetValue {
                domain: NumericDomain::InputNumber,
                ..
            } => "input_number/set_value",
            Self::SetValue {
                domain: NumericDomain::Number,
                ..
            } => "number/set_value",
            Self::SetPresetMode { .. } => "climate/set_preset_mode",
            Self::SetTemperature { .. } => "climate/set_temperature",
            Self::TurnOff { .. } => "input_boolean/turn_off",
        }
    }

    /// Target entity id.
    pub fn entity(&self) -> &str {
        match self {
            Self::SetValue { entity, .. }
            | Self::SetPresetMode { entity, .. }
            | Self::SetTemperature { entity, .. }
            | Self::TurnOff { entity } => entity,
        }
    }
}

/// Read/write access to the platform.
///
/// Reads never fail: an entity that does not exist reads as `None`.
/// Writes can be rejected by the platform.
pub trait DevicePort {
    /// Current state of `entity`.
    fn state(&self, entity: &str) -> Option<String>;

    /// Issue a service call.
    fn call_service(&mut self, call: &ServiceCall) -> Result<(), DeviceError>;

    /// Create or overwrite an entity's state directly.
    fn set_state(&mut self, entity: &str, state: &str) -> Result<(), DeviceError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: file → domain)
// ───────────────────────────────────────────────────────────────

/// Loads the raw controller configuration.
///
/// Implementations only parse.  Validation happens in
/// [`ControllerConfig::validate`], so every source is checked the same way.
pub trait ConfigPort {
    fn load(&self) -> Result<ControllerConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) knows nothing about
/// control cycles or warm water; it only reports labels.
pub trait SchedulerDelegate {
    /// Called when a schedule fires.
    ///
    /// * `label`: the label the schedule was registered with.
    /// * `kind`: whether it was a periodic or one-shot fire.
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    /// A recurring periodic schedule fired.
    Periodic,
    /// A one-shot schedule fired (auto-removed after).
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No configuration at the given location.
    NotFound,
    /// Content could not be parsed.
    Corrupted(String),
    /// File extension names no known format.
    UnsupportedFormat,
    /// Generic I/O error from the backing store.
    IoError(String),
}

/// Errors from [`DevicePort`] write operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The platform refused the call.
    Rejected(String),
    /// The platform could not be reached or persisted.
    IoError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted(msg) => write!(f, "config corrupted: {msg}"),
            Self::UnsupportedFormat => write!(f, "unsupported config format"),
            Self::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(msg) => write!(f, "call rejected: {msg}"),
            Self::IoError(msg) => write!(f, "device I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for DeviceError {}
