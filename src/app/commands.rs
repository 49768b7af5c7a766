//! Inbound commands to the application service.
//!
//! These represent notifications from the outside world that the
//! [`HeatingService`](super::service::HeatingService) interprets and acts
//! upon.  Timer expiries are not commands; they come from the scheduler.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// An entity the service watches changed state.
    StateChanged {
        entity: String,
        old: Option<String>,
        new: Option<String>,
    },

    /// Run a control cycle now, outside the main timer.
    RunCycle,
}
