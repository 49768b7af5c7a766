//! Offset rule chain.
//!
//! Five ordered stages fold into one running offset:
//!
//! ```text
//!   0.0 ─▶ wam ─▶ warm_flag ─▶ freezing_flag ─▶ forced_burn ─▶ force_flow ─▶ offset
//!          (+)      (+)           (+)              (+)            (=)
//! ```
//!
//! The first four accumulate.  `force_flow` is the safety-priority rule:
//! when it fires it replaces everything computed before it.

use core::fmt;

use log::debug;

use crate::config::{FloorWeights, RadiatorWeights, Settings};
use crate::error::HardwareFault;
use crate::fsm::context::CycleInputs;
use crate::zones::RadiatorZone;

use super::wam::{round_to, weighted_mean};

/// Which stage moved the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetReason {
    Wam,
    WarmFlag,
    FreezingFlag,
    ForcedBurn,
    ForceFlow,
}

impl OffsetReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wam => "wam",
            Self::WarmFlag => "warm_flag",
            Self::FreezingFlag => "freezing_flag",
            Self::ForcedBurn => "forced_burn",
            Self::ForceFlow => "force_flow",
        }
    }
}

impl fmt::Display for OffsetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons recorded during one evaluation, in stage order.
pub type Reasons = heapless::Vec<OffsetReason, 5>;

/// Render reasons as `a,b,c`, or `none`.
pub fn reasons_text(reasons: &[OffsetReason]) -> String {
    if reasons.is_empty() {
        return "none".to_owned();
    }
    reasons
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Result of running the whole chain.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetOutcome {
    /// Rounded weighted error mean produced by the voting stage.
    pub wam: f64,
    /// Final offset after all five stages (not yet rounded for output).
    pub offset: f64,
    pub reasons: Reasons,
}

/// The rule chain, built once from validated settings.
#[derive(Debug, Clone)]
pub struct OffsetRuleChain {
    floor_weights: FloorWeights,
    radiator_weights: RadiatorWeights,
    warm_flag_offset: f64,
    freezing_flag_offset: f64,
    forced_burn_factor: f64,
    forced_burn_threshold: f64,
    force_flow_offset: f64,
}

impl OffsetRuleChain {
    pub fn new(settings: &Settings) -> Self {
        Self {
            floor_weights: settings.floor_weights,
            radiator_weights: settings.radiator_weights,
            warm_flag_offset: settings.warm_flag_offset,
            freezing_flag_offset: settings.freezing_flag_offset,
            forced_burn_factor: settings.forced_burn_factor,
            forced_burn_threshold: settings.forced_burn_threshold,
            force_flow_offset: settings.force_flow_offset,
        }
    }

    /// Run all five stages against one input snapshot.
    ///
    /// An undefined vote aborts the chain; nothing downstream may see a
    /// partial offset.
    pub fn evaluate(&self, inputs: &CycleInputs) -> Result<OffsetOutcome, HardwareFault> {
        let mut reasons = Reasons::new();
        let mut offset = 0.0;

        let wam = self.vote(&inputs.floor_errors)?;
        offset = Self::step(&mut reasons, OffsetReason::Wam, offset, offset + wam);
        debug!("Offset after WAM: {offset}");

        offset = Self::step(
            &mut reasons,
            OffsetReason::WarmFlag,
            offset,
            self.warm_flag(inputs, offset),
        );
        debug!("Offset after warm flag: {offset}");

        offset = Self::step(
            &mut reasons,
            OffsetReason::FreezingFlag,
            offset,
            self.freezing_flag(inputs, offset),
        );
        debug!("Offset after freezing flag: {offset}");

        offset = Self::step(
            &mut reasons,
            OffsetReason::ForcedBurn,
            offset,
            self.forced_burn(inputs, offset),
        );
        debug!("Offset after forced burn: {offset}");

        offset = Self::step(
            &mut reasons,
            OffsetReason::ForceFlow,
            offset,
            self.force_flow(inputs, offset),
        );
        debug!("Offset after force flow: {offset}");

        Ok(OffsetOutcome {
            wam,
            offset,
            reasons,
        })
    }

    /// Stage 1: weighted mean of the floor errors, rounded to 2 decimals.
    pub fn vote(&self, floor_errors: &[f64]) -> Result<f64, HardwareFault> {
        weighted_mean(floor_errors, self.floor_weights.as_slice())
            .map(|wam| round_to(wam, 2))
            .ok_or(HardwareFault::WamUndefined)
    }

    /// Stage 2: operator warm request.
    pub fn warm_flag(&self, inputs: &CycleInputs, offset: f64) -> f64 {
        if inputs.flags.warm {
            offset + self.warm_flag_offset
        } else {
            offset
        }
    }

    /// Stage 3: freezing forecast.
    pub fn freezing_flag(&self, inputs: &CycleInputs, offset: f64) -> f64 {
        if inputs.flags.freezing {
            offset + self.freezing_flag_offset
        } else {
            offset
        }
    }

    /// Stage 4: extra heat when the corridor would cool down while some
    /// radiator zone is well below its setpoint.
    pub fn forced_burn(&self, inputs: &CycleInputs, offset: f64) -> f64 {
        let corridor_cooling = inputs.corridor_error() + offset < 0.0;
        let radiator_cold = inputs
            .radiator_errors
            .iter()
            .any(|&e| e > self.forced_burn_threshold);
        if !(corridor_cooling && radiator_cold) {
            return offset;
        }

        let demand: f64 = RadiatorZone::ALL
            .iter()
            .map(|&z| inputs.radiator_error(z).max(0.0) * self.radiator_weights.get(z.index()))
            .sum();
        let forced_burn = demand * self.forced_burn_factor;
        debug!("Forced burn {forced_burn}");
        offset + forced_burn
    }

    /// Stage 5: keep the bedroom flowing when it is cold and flow is forced.
    pub fn force_flow(&self, inputs: &CycleInputs, offset: f64) -> f64 {
        if inputs.radiator_error(RadiatorZone::Bedroom) > 0.0 && inputs.flags.force_flow {
            self.force_flow_offset
        } else {
            offset
        }
    }

    fn step(reasons: &mut Reasons, reason: OffsetReason, before: f64, after: f64) -> f64 {
        if after != before {
            let _ = reasons.push(reason);
        }
        after
    }
}
