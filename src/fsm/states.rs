//! Concrete state handler functions and table builder.
//!
//! ```text
//!  IDLE ──[cycle timer]──▶ RUNNING ──[decided]──▶ IDLE
//!                              │
//!                          [fault]
//!                              ▼
//!  Any state ──[fault]──▶ SAFE   (latched until restart)
//! ```

use super::context::CycleContext;
use super::{StateDescriptor, StateId, StateTable};
use crate::control;
use log::{debug, error, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> StateTable {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: None,
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Running
        StateDescriptor {
            id: StateId::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running_update,
        },
        // Index 2: Safe
        StateDescriptor {
            id: StateId::Safe,
            name: "Safe",
            on_enter: Some(safe_enter),
            on_exit: None,
            on_update: safe_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut CycleContext) -> Option<StateId> {
    if ctx.has_faults() {
        return Some(StateId::Safe);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING state: one evaluation of the decision engine
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut CycleContext) {
    ctx.decision = None;
    debug!("RUNNING: evaluating cycle {}", ctx.total_ticks);
}

fn running_update(ctx: &mut CycleContext) -> Option<StateId> {
    if ctx.has_faults() {
        return Some(StateId::Safe);
    }

    match control::evaluate(&ctx.chain, &ctx.boost, &ctx.gate, &ctx.inputs) {
        Ok(decision) => {
            ctx.decision = Some(decision);
            Some(StateId::Idle)
        }
        Err(fault) => {
            error!("RUNNING: cycle aborted: {fault}");
            ctx.fault_flags |= fault.mask();
            Some(StateId::Safe)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SAFE state: stop acting
// ═══════════════════════════════════════════════════════════════════════════

fn safe_enter(ctx: &mut CycleContext) {
    ctx.decision = None;
    info!(
        "SAFE: actuation stopped, faults=0b{:08b}; restart required",
        ctx.fault_flags
    );
}

fn safe_update(_ctx: &mut CycleContext) -> Option<StateId> {
    None
}
