//! Unified error types for the heating controller.
//!
//! Two fault classes exist and they are handled very differently:
//!
//! - [`ConfigFault`]: raised while turning the configuration file into
//!   [`Settings`](crate::config::Settings).  Always fatal: the controller
//!   never starts running cycles.
//! - [`HardwareFault`]: raised inside a running cycle.  Latched by the
//!   [`SafetySupervisor`](crate::safety::SafetySupervisor); the controller
//!   enters `Safe` and stops commanding actuators until restarted.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Startup-time configuration problem.
    Config(ConfigFault),
    /// Cycle-time device or computation problem.
    Hardware(HardwareFault),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigFault {
    /// A required factor map is absent or empty.
    MissingFactors(&'static str),
    /// A factor map lacks an entry for one zone.
    MissingFactor { map: &'static str, zone: &'static str },
    /// The factors of a map do not sum to a positive number.
    NonPositiveFactorSum(&'static str),
    /// A factor is NaN or infinite.
    NonFiniteFactor { map: &'static str, zone: &'static str },
    /// A required point (entity id) mapping is missing or blank.
    MissingPoint { section: &'static str, key: &'static str },
    /// A tunable is outside its accepted range.
    InvalidValue(&'static str),
    /// The file could not be parsed at all.
    Parse(String),
}

impl fmt::Display for ConfigFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFactors(map) => write!(f, "missing factor map '{map}'"),
            Self::MissingFactor { map, zone } => write!(f, "missing factor '{map}.{zone}'"),
            Self::NonPositiveFactorSum(map) => {
                write!(f, "sum of factors in '{map}' must be > 0")
            }
            Self::NonFiniteFactor { map, zone } => {
                write!(f, "factor '{map}.{zone}' is not a finite number")
            }
            Self::MissingPoint { section, key } => {
                write!(f, "missing point mapping '{section}.{key}'")
            }
            Self::InvalidValue(msg) => write!(f, "invalid value: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl From<ConfigFault> for Error {
    fn from(e: ConfigFault) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware faults
// ---------------------------------------------------------------------------

/// Runtime faults.  Accumulated as a bitmask by the safety supervisor so
/// that several faults raised in the same cycle are all reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HardwareFault {
    /// The weighted error mean could not be computed.
    WamUndefined = 0b0000_0001,
    /// A numeric write targeted an entity outside `input_number`/`number`.
    UnsupportedTarget = 0b0000_0010,
    /// The device interface rejected a service call.
    DeviceCallFailed = 0b0000_0100,
    /// A point id was blank at read or write time.
    MissingPoint = 0b0000_1000,
    /// The cycle panicked.
    CycleAborted = 0b0001_0000,
    /// The offset or setpoint candidate overflowed to a non-finite value.
    OutputNotFinite = 0b0010_0000,
}

impl HardwareFault {
    /// Every fault, in bit order.
    pub const ALL: [Self; 6] = [
        Self::WamUndefined,
        Self::UnsupportedTarget,
        Self::DeviceCallFailed,
        Self::MissingPoint,
        Self::CycleAborted,
        Self::OutputNotFinite,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WamUndefined => write!(f, "weighted error mean undefined"),
            Self::UnsupportedTarget => write!(f, "unsupported actuation target"),
            Self::DeviceCallFailed => write!(f, "device call failed"),
            Self::MissingPoint => write!(f, "point id missing"),
            Self::CycleAborted => write!(f, "cycle aborted"),
            Self::OutputNotFinite => write!(f, "offset or setpoint not finite"),
        }
    }
}

impl From<HardwareFault> for Error {
    fn from(e: HardwareFault) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
