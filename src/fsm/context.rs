//! Shared context threaded through every FSM handler.
//!
//! `CycleContext` is the blackboard the state handlers read from and write
//! to: the validated settings, the rule evaluators built from them, the
//! input snapshot for the current cycle, the decision produced from it and
//! the latched fault mask.

use crate::config::Settings;
use crate::control::boost::BoostPolicy;
use crate::control::gate::ActuationGate;
use crate::control::offset::OffsetRuleChain;
use crate::control::CycleDecision;
use crate::zones::{FloorValues, FloorZone, RadiatorValues, RadiatorZone, ValveValues, Valve};

/// Position assumed for a valve whose position cannot be read.
pub const DEFAULT_VALVE_POSITION: f64 = 50.0;

// ---------------------------------------------------------------------------
// Input snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// Operator and forecast flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Operator asked for more heat.
    pub warm: bool,
    /// Weather forecast predicts frost.
    pub freezing: bool,
    /// Safety request to keep water flowing through the bedroom radiators.
    pub force_flow: bool,
}

/// A point-in-time snapshot of every input the decision needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleInputs {
    /// Setpoint currently applied to the boiler thermostat.
    pub thermostat_setpoint: f64,
    /// Setpoint requested for the corridor (reference zone).
    pub corridor_setpoint: f64,
    pub floor_errors: FloorValues,
    pub radiator_errors: RadiatorValues,
    pub flags: Flags,
    pub valve_positions: ValveValues,
}

impl Default for CycleInputs {
    fn default() -> Self {
        Self {
            thermostat_setpoint: 0.0,
            corridor_setpoint: 0.0,
            floor_errors: [0.0; FloorZone::COUNT],
            radiator_errors: [0.0; RadiatorZone::COUNT],
            flags: Flags::default(),
            valve_positions: [DEFAULT_VALVE_POSITION; Valve::COUNT],
        }
    }
}

impl CycleInputs {
    pub fn floor_error(&self, zone: FloorZone) -> f64 {
        self.floor_errors[zone.index()]
    }

    pub fn radiator_error(&self, zone: RadiatorZone) -> f64 {
        self.radiator_errors[zone.index()]
    }

    pub fn valve_position(&self, valve: Valve) -> f64 {
        self.valve_positions[valve.index()]
    }

    /// Corridor error; the corridor is the thermostat's reference zone.
    pub fn corridor_error(&self) -> f64 {
        self.floor_error(FloorZone::Corridor)
    }

    /// Largest radiator zone error.
    pub fn max_radiator_error(&self) -> f64 {
        self.radiator_errors
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

// ---------------------------------------------------------------------------
// CycleContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct CycleContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Configuration --
    pub settings: Settings,
    pub chain: OffsetRuleChain,
    pub boost: BoostPolicy,
    pub gate: ActuationGate,

    // -- Cycle data --
    /// Inputs of the cycle being evaluated.  Written before `Running`.
    pub inputs: CycleInputs,
    /// Result of the last successful evaluation; cleared on `Safe`.
    pub decision: Option<CycleDecision>,

    // -- Safety --
    /// Latched hardware-fault bitmask (see `HardwareFault::mask()`).
    pub fault_flags: u8,
}

impl CycleContext {
    /// Create a new context and build the evaluators from `settings`.
    pub fn new(settings: Settings) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            chain: OffsetRuleChain::new(&settings),
            boost: BoostPolicy::new(settings.radiator_boost_threshold),
            gate: ActuationGate::new(settings.update_threshold),
            settings,
            inputs: CycleInputs::default(),
            decision: None,
            fault_flags: 0,
        }
    }

    /// Returns `true` if **any** hardware fault is latched.
    pub fn has_faults(&self) -> bool {
        self.fault_flags != 0
    }

    /// Check whether a specific fault flag is set.
    pub fn has_fault(&self, fault: crate::error::HardwareFault) -> bool {
        self.fault_flags & fault.mask() != 0
    }
}
