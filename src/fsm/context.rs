//! Per-cycle inputs and outputs of the charge state machine, and the
//! context that owns its state.
//!
//! `SensorFrame` and `ActuatorCmd` are plain values: the frame is built
//! fresh each cycle from gated readings, and the command is recomputed in
//! full each cycle. Neither carries anything over from the previous cycle.

use log::{info, warn};
use serde::Serialize;

use super::{ChargeState, transition};
use crate::config::ChargeProfile;
use crate::error::{Error, Result};
use crate::faults::FaultSet;

// ---------------------------------------------------------------------------
// Sensor frame (gated inputs for one cycle)
// ---------------------------------------------------------------------------

/// Validated sensor snapshot for one control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorFrame {
    /// Pack voltage (V).
    pub voltage: f32,
    /// Pack current (A), positive into the pack.
    pub current: f32,
    /// Pack temperature (°C).
    pub temp_c: f32,
    /// Charger presence input.
    pub charger_connected: bool,
}

// ---------------------------------------------------------------------------
// Actuator command (output for one cycle)
// ---------------------------------------------------------------------------

/// Current and voltage limits handed to the charger hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActuatorCmd {
    /// Current limit (A).
    pub current_limit: f32,
    /// Voltage limit (V).
    pub voltage_limit: f32,
}

impl ActuatorCmd {
    /// Zero current, zero voltage.
    pub const ZERO: Self = Self {
        current_limit: 0.0,
        voltage_limit: 0.0,
    };

    pub const fn new(current_limit: f32, voltage_limit: f32) -> Self {
        Self {
            current_limit,
            voltage_limit,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.current_limit == 0.0 && self.voltage_limit == 0.0
    }
}

// ---------------------------------------------------------------------------
// ChargeContext
// ---------------------------------------------------------------------------

/// Owner of the charge state.
///
/// The state is only ever changed inside [`step`](Self::step) (once per
/// cycle) or by an explicit [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct ChargeContext {
    state: ChargeState,
    /// Thresholds and commanded limits for the active chemistry.
    pub profile: ChargeProfile,
    cycles_in_state: u64,
    total_cycles: u64,
}

impl ChargeContext {
    /// New context in `Idle`.
    pub fn new(profile: ChargeProfile) -> Self {
        Self {
            state: ChargeState::Idle,
            profile,
            cycles_in_state: 0,
            total_cycles: 0,
        }
    }

    /// Run one control cycle.
    ///
    /// The fault verdict is consulted before the transition table, so a
    /// critical fault forces `Fault` no matter what the sensors say. The
    /// returned command belongs entirely to the state the context is in
    /// after this call.
    pub fn step(&mut self, sensors: &SensorFrame, faults: &FaultSet) -> ActuatorCmd {
        self.total_cycles = self.total_cycles.wrapping_add(1);

        let (next, cmd) = transition(self.state, sensors, faults, &self.profile);

        if next == self.state {
            self.cycles_in_state = self.cycles_in_state.saturating_add(1);
        } else {
            if next == ChargeState::Fault {
                warn!(
                    "FSM transition: {} -> {} (faults: {})",
                    self.state, next, faults
                );
            } else {
                info!("FSM transition: {} -> {}", self.state, next);
            }
            self.state = next;
            self.cycles_in_state = 0;
        }

        cmd
    }

    /// External reset back to `Idle`.
    ///
    /// Refused while any critical fault is active, so a reset can never
    /// bypass the fault override.
    pub fn reset(&mut self, faults: &FaultSet) -> Result<()> {
        if faults.should_open_contactors() {
            warn!("FSM reset refused: critical faults active ({faults})");
            return Err(Error::ResetInhibited);
        }
        if self.state != ChargeState::Idle {
            info!("FSM transition: {} -> {} (reset)", self.state, ChargeState::Idle);
        }
        self.state = ChargeState::Idle;
        self.cycles_in_state = 0;
        Ok(())
    }

    /// The current state.
    pub fn state(&self) -> ChargeState {
        self.state
    }

    /// Cycles completed in the current state without a transition.
    pub fn cycles_in_state(&self) -> u64 {
        self.cycles_in_state
    }

    /// Total cycles executed.
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }
}
