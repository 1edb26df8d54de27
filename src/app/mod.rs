//! Application core — orchestration with zero direct I/O.
//!
//! Runs the control cycle (gate, safety evaluation, charge state machine)
//! and interprets external commands. All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without a real charger.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
