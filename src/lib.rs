//! SmartHeat controller library.
//!
//! Closed-loop offset controller for a central thermostat: aggregates
//! per-zone temperature errors into a weighted mean, runs the offset rule
//! chain, boosts cold radiator valves and gates thermostat writes.  All
//! platform I/O goes through the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod fsm;
pub mod hal;
pub mod safety;
pub mod scheduler;
pub mod warm_water;
pub mod zones;

pub mod adapters;
