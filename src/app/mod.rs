//! Application core: pure domain logic, zero I/O.
//!
//! The business rules of the heating controller: cycle orchestration,
//! state-change listeners and the temporary warm-water timer.  All
//! interaction with the platform happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without a live system.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
