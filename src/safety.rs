//! Safety supervisor.
//!
//! Collects [`HardwareFault`]s raised while a cycle runs and latches them
//! in a bitmask.  Nothing ever clears a bit: once the controller has seen a
//! hardware fault it stays in `Safe` until the process is restarted.
//!
//! ## Fault lifecycle
//!
//! 1. A read, write or evaluation step fails with a [`HardwareFault`].
//! 2. The service hands it to [`SafetySupervisor::record`], which sets the
//!    bit and logs it once.
//! 3. The FSM is forced into `Safe`; `safe_enter` drops pending commands
//!    and the service cancels the cycle and heartbeat timers.
//!
//! Several faults raised by the same cycle are all kept in the mask.

use log::error;

use crate::error::HardwareFault;

/// Latching fault supervisor.
#[derive(Debug, Default)]
pub struct SafetySupervisor {
    /// Latched fault bitmask.
    faults: u8,
}

impl SafetySupervisor {
    pub const fn new() -> Self {
        Self { faults: 0 }
    }

    /// Latch `fault`.  Returns `true` when the bit was not already set.
    pub fn record(&mut self, fault: HardwareFault, detail: &str) -> bool {
        let fresh = self.faults & fault.mask() == 0;
        if fresh {
            error!("SAFETY FAULT SET: {fault} ({detail})");
        }
        self.faults |= fault.mask();
        fresh
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is latched.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is latched.
    pub fn has_fault(&self, fault: HardwareFault) -> bool {
        self.faults & fault.mask() != 0
    }

    /// Faults in the mask, in bit order.
    pub fn active(&self) -> impl Iterator<Item = HardwareFault> + '_ {
        HardwareFault::ALL
            .into_iter()
            .filter(move |f| self.has_fault(*f))
    }
}
