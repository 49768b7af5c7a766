//! Actuation gate.
//!
//! Hysteresis on the thermostat setpoint: a new value is written only when
//! it differs from the applied one by at least `update_threshold`.  Written
//! values never go below [`MIN_SETPOINT`].

/// Lowest setpoint ever commanded to the thermostat.
pub const MIN_SETPOINT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    /// `(corridor_setpoint - corridor_error) + offset`, unclamped.
    pub candidate: f64,
    /// Value to write, already clamped.  `None` when the gate holds.
    pub setpoint: Option<f64>,
}

impl GateDecision {
    pub const fn write(&self) -> bool {
        self.setpoint.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationGate {
    update_threshold: f64,
}

impl ActuationGate {
    pub const fn new(update_threshold: f64) -> Self {
        Self { update_threshold }
    }

    /// Setpoint the corridor would need for `offset` to take effect.
    pub fn candidate(corridor_setpoint: f64, corridor_error: f64, offset: f64) -> f64 {
        (corridor_setpoint - corridor_error) + offset
    }

    /// Compare `candidate` with the currently applied setpoint.
    pub fn check(&self, current: f64, candidate: f64) -> GateDecision {
        let setpoint = ((current - candidate).abs() >= self.update_threshold)
            .then(|| candidate.max(MIN_SETPOINT));
        GateDecision {
            candidate,
            setpoint,
        }
    }

    pub fn decide(
        &self,
        current: f64,
        corridor_setpoint: f64,
        corridor_error: f64,
        offset: f64,
    ) -> GateDecision {
        self.check(current, Self::candidate(corridor_setpoint, corridor_error, offset))
    }
}
