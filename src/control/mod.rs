//! Decision engine.
//!
//! Pure functions only: given a snapshot of inputs and the evaluators built
//! from settings, produce everything a cycle wants to actuate.  Nothing here
//! touches a device.

pub mod boost;
pub mod gate;
pub mod offset;
pub mod wam;

use crate::error::HardwareFault;
use crate::fsm::context::CycleInputs;

use self::boost::{BoostPolicy, ValveBoosts};
use self::gate::{ActuationGate, GateDecision};
use self::offset::{OffsetRuleChain, Reasons};

/// Everything one cycle decided.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleDecision {
    /// Voting value (rounded to 2 decimals).
    pub wam: f64,
    /// Final offset rounded to 1 decimal; this is what gets written.
    pub offset: f64,
    pub reasons: Reasons,
    pub boosts: ValveBoosts,
    pub gate: GateDecision,
}

/// Run the rule chain, the boost policy and the gate over `inputs`.
///
/// A non-finite offset or candidate setpoint fails the whole decision, so
/// nothing from this snapshot is written.
pub fn evaluate(
    chain: &OffsetRuleChain,
    boost: &BoostPolicy,
    gate: &ActuationGate,
    inputs: &CycleInputs,
) -> Result<CycleDecision, HardwareFault> {
    let outcome = chain.evaluate(inputs)?;
    let offset = wam::round_to(outcome.offset, 1);
    if !offset.is_finite() {
        return Err(HardwareFault::OutputNotFinite);
    }

    let boosts = boost.decide(inputs);
    let gate = gate.decide(
        inputs.thermostat_setpoint,
        inputs.corridor_setpoint,
        inputs.corridor_error(),
        offset,
    );
    if !gate.candidate.is_finite() {
        return Err(HardwareFault::OutputNotFinite);
    }

    Ok(CycleDecision {
        wam: outcome.wam,
        offset,
        reasons: outcome.reasons,
        boosts,
        gate,
    })
}
