//! Tick-driven timers.
//!
//! Drives the control cycle, the heartbeat and the temporary warm-water
//! expiry from one tick source.  The scheduler notifies a
//! [`SchedulerDelegate`] when schedules fire; the service collects the
//! labels and dispatches them after the tick.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │     ┌────────────┐     ┌────────────┐     ┌────────────┐     │
//! │     │ main_loop  │     │ heartbeat  │     │temporary_ww│     │
//! │     │ (periodic) │     │ (periodic) │     │ (one-shot) │     │
//! │     └─────┬──────┘     └─────┬──────┘     └─────┬──────┘     │
//! │           │                  │                  │            │
//! │           ▼                  ▼                  ▼            │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              SchedulerDelegate                         │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          │                                   │
//! │                          ▼                                   │
//! │                 HeatingService dispatch                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// What to run and when.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Label reported to the delegate (e.g., "main_loop").
    pub label: &'static str,
    pub kind: ScheduleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Fire every `interval_secs` seconds.
    Periodic { interval_secs: u32 },
    /// Fire once after `delay_secs`, then free the slot.
    OneShot { delay_secs: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Main loop, heartbeat and warm water, plus one spare.
const MAX_SCHEDULES: usize = 4;

/// Handle returned by [`Scheduler::add`]; pass it to
/// [`Scheduler::remove`] to cancel.
pub type ScheduleSlot = usize;

/// Fixed set of timer slots.  Firing only reports to a
/// [`SchedulerDelegate`]; the scheduler never runs work itself.
pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Seconds accumulated since registration or the last fire.
    elapsed_secs: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: core::array::from_fn(|_| None),
        }
    }

    /// Register a schedule in the first free slot.  `None` when full.
    pub fn add(&mut self, schedule: Schedule) -> Option<ScheduleSlot> {
        let Some(slot) = self.schedules.iter().position(Option::is_none) else {
            warn!("Scheduler: no free slot for '{}'", schedule.label);
            return None;
        };
        info!("Scheduler: '{}' registered in slot {slot}", schedule.label);
        self.schedules[slot] = Some(ScheduleEntry {
            schedule,
            elapsed_secs: 0.0,
        });
        Some(slot)
    }

    /// Cancel a schedule by slot index.  Returns `true` if it was live.
    pub fn remove(&mut self, slot: ScheduleSlot) -> bool {
        match self.schedules.get_mut(slot).and_then(Option::take) {
            Some(e) => {
                info!("Scheduler: removed '{}' from slot {}", e.schedule.label, slot);
                true
            }
            None => false,
        }
    }

    /// Whether `slot` still holds a schedule.
    pub fn is_live(&self, slot: ScheduleSlot) -> bool {
        self.schedules.get(slot).is_some_and(Option::is_some)
    }

    /// Advance every schedule by `tick_secs` seconds.
    ///
    /// When a schedule fires, `delegate.on_schedule_fired()` is called
    /// with the schedule label and fire kind.  A periodic schedule fires
    /// at most once per tick even when the tick is longer than its
    /// interval.
    pub fn tick(&mut self, tick_secs: f64, delegate: &mut dyn SchedulerDelegate) {
        for slot in self.schedules.iter_mut() {
            let Some(entry) = slot else {
                continue;
            };

            entry.elapsed_secs += tick_secs;
            let label = entry.schedule.label;

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_secs } => {
                    let interval = f64::from(interval_secs);
                    if entry.elapsed_secs >= interval {
                        debug!("Scheduler: '{label}' periodic fire (every {interval_secs}s)");
                        delegate.on_schedule_fired(label, ScheduleFiredKind::Periodic);
                        // Carry the overshoot so the period does not drift.
                        entry.elapsed_secs = if interval > 0.0 {
                            entry.elapsed_secs % interval
                        } else {
                            0.0
                        };
                    }
                }

                ScheduleKind::OneShot { delay_secs } => {
                    if entry.elapsed_secs >= f64::from(delay_secs) {
                        info!("Scheduler: '{label}' one-shot fired (after {delay_secs}s)");
                        delegate.on_schedule_fired(label, ScheduleFiredKind::OneShot);
                        *slot = None; // Auto-remove.
                    }
                }
            }
        }
    }

    /// Number of live schedules.
    pub fn active_count(&self) -> usize {
        self.schedules.iter().filter(|s| s.is_some()).count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
