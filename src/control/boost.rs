//! Valve boost policy.
//!
//! Stateless: every cycle each valve is judged on its zone's error and its
//! own position.  Repeating a boost command for a valve already in boost is
//! harmless, so nothing is remembered between cycles.

use crate::fsm::context::CycleInputs;
use crate::zones::Valve;

/// Zone error above which a valve may be boosted.
pub const BOOST_ERROR_THRESHOLD: f64 = 0.5;

/// Per-valve boost decision, indexed by [`Valve::index`].
pub type ValveBoosts = [bool; Valve::COUNT];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostPolicy {
    /// Positions strictly below this are considered closed enough to boost.
    position_threshold: f64,
}

impl BoostPolicy {
    pub const fn new(position_threshold: f64) -> Self {
        Self { position_threshold }
    }

    /// Decide a single valve.
    pub fn should_boost(&self, inputs: &CycleInputs, valve: Valve) -> bool {
        inputs.radiator_error(valve.zone()) > BOOST_ERROR_THRESHOLD
            && inputs.valve_position(valve) < self.position_threshold
    }

    /// Decide every valve.
    pub fn decide(&self, inputs: &CycleInputs) -> ValveBoosts {
        let mut boosts = [false; Valve::COUNT];
        for valve in Valve::ALL {
            boosts[valve.index()] = self.should_boost(inputs, valve);
        }
        boosts
    }
}
