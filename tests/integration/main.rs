//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the service pipeline
//! against mock or simulated adapters. All tests run on the host with no
//! real hardware required.

mod charge_sequence_tests;
mod fault_override_tests;
mod sensor_gate_tests;
