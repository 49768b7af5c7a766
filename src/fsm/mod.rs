//! Cycle state machine.
//!
//! Three states driven by a table of plain function pointers:
//!
//! ```text
//!            cycle timer            decision stored
//!   Idle ───────────────▶ Running ─────────────────▶ Idle
//!                           │
//!                           │ fault
//!                           ▼
//!                          Safe   (latched until restart)
//! ```
//!
//! [`Fsm::tick`] runs the current state's update handler.  When the
//! handler names another state the engine leaves the current one
//! (`on_exit`) and enters the next (`on_enter`).  Handlers share one
//! [`CycleContext`].

pub mod context;
pub mod states;

use context::CycleContext;
use log::{debug, info};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Controller states.  Discriminants index the state table built by
/// [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Waiting for the next cycle timer.
    Idle = 0,
    /// Evaluating one cycle.
    Running = 1,
    /// Latched after a hardware fault.  Inert until restart.
    Safe = 2,
}

impl StateId {
    pub const COUNT: usize = 3;

    /// Table index back to a state.  Anything unknown is `Safe`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Safe,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Safe
            }
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// State table
// ---------------------------------------------------------------------------

/// Entry or exit hook.
pub type StateActionFn = fn(&mut CycleContext);

/// Per-tick handler.  `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut CycleContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

pub type StateTable = [StateDescriptor; StateId::COUNT];

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    table: StateTable,
    state: StateId,
    ticks: u64,
    entered_at: u64,
    transitions: u64,
}

impl Fsm {
    pub fn new(table: StateTable, initial: StateId) -> Self {
        Self {
            table,
            state: initial,
            ticks: 0,
            entered_at: 0,
            transitions: 0,
        }
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.table[id.index()]
    }

    /// Enter the initial state.  Call once before the first tick.
    pub fn start(&mut self, ctx: &mut CycleContext) {
        info!("Cycle FSM starting in {}", self.current_name());
        if let Some(enter) = self.row(self.state).on_enter {
            enter(ctx);
        }
    }

    /// Run the current state's update handler once and follow any
    /// transition it requests.
    pub fn tick(&mut self, ctx: &mut CycleContext) {
        self.ticks += 1;
        ctx.total_ticks = self.ticks;
        ctx.ticks_in_state = self.ticks - self.entered_at;

        if let Some(next) = (self.row(self.state).on_update)(ctx) {
            self.switch_to(next, ctx);
        }
    }

    /// Switch state from outside the update handlers (cycle timer, fault
    /// path).  Staying in the same state runs no hooks.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut CycleContext) {
        if next != self.state {
            self.switch_to(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        self.state
    }

    pub fn current_name(&self) -> &'static str {
        self.row(self.state).name
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.ticks - self.entered_at
    }

    /// Transitions taken since construction.
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    fn switch_to(&mut self, next: StateId, ctx: &mut CycleContext) {
        let from = self.state;
        if from == StateId::Safe || next == StateId::Safe {
            info!("FSM: {} -> {}", self.row(from).name, self.row(next).name);
        } else {
            debug!("FSM: {} -> {}", self.row(from).name, self.row(next).name);
        }

        if let Some(exit) = self.row(from).on_exit {
            exit(ctx);
        }
        self.state = next;
        self.entered_at = self.ticks;
        self.transitions += 1;
        ctx.ticks_in_state = 0;
        if let Some(enter) = self.row(next).on_enter {
            enter(ctx);
        }
    }
}
