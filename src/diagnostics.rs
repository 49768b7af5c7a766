//! Runtime diagnostics.
//!
//! Loop timing, the last reported outputs and the heartbeat snapshot built
//! from them.  Nothing in here influences control decisions; it only feeds
//! logging.

use std::any::Any;
use std::time::{Duration, Instant};

use crate::control::offset::{reasons_text, Reasons};

// ───────────────────────────────────────────────────────────────
// Loop timing
// ───────────────────────────────────────────────────────────────

/// End time and duration of the most recent cycle, faulted or not.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopTiming {
    last_end: Option<Instant>,
    last_duration: Option<Duration>,
}

impl LoopTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cycle that started at `start` and ends now.
    pub fn record(&mut self, start: Instant) {
        let end = Instant::now();
        self.last_end = Some(end);
        self.last_duration = Some(end.saturating_duration_since(start));
    }

    /// Seconds since the last cycle ended.
    pub fn age_secs(&self) -> Option<f64> {
        self.last_end.map(|end| end.elapsed().as_secs_f64())
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.last_duration.map(|d| d.as_secs_f64())
    }
}

// ───────────────────────────────────────────────────────────────
// Output memory
// ───────────────────────────────────────────────────────────────

/// What the controller last decided and what it last reported.
///
/// Reset at startup; updated only after a cycle produced a decision.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OutputMemory {
    /// Offset of the last successful cycle.
    pub last_offset: Option<f64>,
    /// Candidate setpoint of the last successful cycle.
    pub last_setpoint: Option<f64>,
    pub last_reasons: Reasons,
    /// Offset in the last `OutputChanged` report.
    reported_offset: Option<f64>,
    /// Setpoint in the last report that actually wrote one.
    reported_setpoint: Option<f64>,
}

impl OutputMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a cycle's outputs.  Returns `true` when they differ from
    /// what was last reported and should be logged.
    pub fn update(&mut self, offset: f64, setpoint: f64, written: bool, reasons: &Reasons) -> bool {
        self.last_offset = Some(offset);
        self.last_setpoint = Some(setpoint);
        self.last_reasons = reasons.clone();

        let offset_changed = self.reported_offset != Some(offset);
        let setpoint_changed = written && self.reported_setpoint != Some(setpoint);
        if !(offset_changed || setpoint_changed) {
            return false;
        }

        self.reported_offset = Some(offset);
        if written {
            self.reported_setpoint = Some(setpoint);
        }
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Heartbeat
// ───────────────────────────────────────────────────────────────

/// Periodic health snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatData {
    pub last_offset: Option<f64>,
    pub last_setpoint: Option<f64>,
    pub last_reasons: Reasons,
    pub loop_age_secs: Option<f64>,
    pub loop_duration_secs: Option<f64>,
}

impl HeartbeatData {
    pub fn collect(outputs: &OutputMemory, timing: &LoopTiming) -> Self {
        Self {
            last_offset: outputs.last_offset,
            last_setpoint: outputs.last_setpoint,
            last_reasons: outputs.last_reasons.clone(),
            loop_age_secs: timing.age_secs(),
            loop_duration_secs: timing.duration_secs(),
        }
    }

    /// `last_reasons` rendered for a log line.
    pub fn reasons_text(&self) -> String {
        reasons_text(&self.last_reasons)
    }
}

// ───────────────────────────────────────────────────────────────
// Panic payloads
// ───────────────────────────────────────────────────────────────

/// Best-effort message from a caught panic payload.
pub fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
