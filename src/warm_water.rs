//! Temporary warm water.
//!
//! The operator flips a request toggle on to get warm water for a fixed
//! time.  Switching it on (re)starts a one-shot timer; switching it off
//! cancels the timer and ends warm water at once.  Expiry ends it too.
//! Whoever owns the device turns the warm-water state off; this module
//! only tracks the timer.

use log::info;

use crate::scheduler::{Schedule, ScheduleKind, ScheduleSlot, Scheduler};

/// Scheduler label of the expiry timer.
pub const WARM_WATER_LABEL: &str = "temporary_ww";

/// What a request transition asks the owner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmWaterAction {
    /// Timer (re)started.
    Started,
    /// Timer cancelled; turn warm water off now.
    Stop,
    /// Not a transition this timer reacts to.
    Ignore,
}

#[derive(Debug)]
pub struct WarmWaterTimer {
    duration_secs: u32,
    slot: Option<ScheduleSlot>,
}

impl WarmWaterTimer {
    pub const fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            slot: None,
        }
    }

    pub const fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Whether an expiry is pending.
    pub fn is_running(&self, sched: &Scheduler) -> bool {
        self.slot.is_some_and(|s| sched.is_live(s))
    }

    /// React to a request toggle transition.
    pub fn on_request(
        &mut self,
        old: Option<&str>,
        new: Option<&str>,
        sched: &mut Scheduler,
    ) -> WarmWaterAction {
        match (old, new) {
            (Some("off"), Some("on")) => {
                info!(
                    "Warm water requested: enabling for {} minutes",
                    self.duration_secs / 60
                );
                self.cancel(sched);
                self.slot = sched.add(Schedule {
                    label: WARM_WATER_LABEL,
                    kind: ScheduleKind::OneShot {
                        delay_secs: self.duration_secs,
                    },
                });
                WarmWaterAction::Started
            }
            (Some("on"), Some("off")) => {
                info!("Warm water request cleared: turning off immediately");
                self.cancel(sched);
                WarmWaterAction::Stop
            }
            _ => WarmWaterAction::Ignore,
        }
    }

    /// The expiry timer fired; its slot is already free.
    pub fn on_expired(&mut self) {
        self.slot = None;
    }

    fn cancel(&mut self, sched: &mut Scheduler) {
        if let Some(slot) = self.slot.take() {
            sched.remove(slot);
        }
    }
}
