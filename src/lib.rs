//! chargectl — safety-gated battery charge controller core.
//!
//! The control loop is strictly ordered each cycle:
//!
//! ```text
//!  raw sample ─▶ plausibility gate ─▶ safety supervisor ─▶ charge FSM ─▶ outputs
//!                  (sensors)           (safety, faults)      (fsm)
//! ```
//!
//! Everything except the `adapters` module is free of I/O; the
//! [`app::service::ChargeService`] talks to the world only through the
//! port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod faults;
pub mod fsm;
pub mod plausibility;
pub mod safety;
pub mod sensors;
