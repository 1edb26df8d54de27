//! Concrete state handlers and the static state table.
//!
//! Each state is two plain `fn` items: an update handler that decides the
//! next state from the gated frame, and a command builder. No closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  IDLE ──[connected, V < exit]──▶ PRECHARGE ──[V ≥ exit]──┐
//!    │                                                      ▼
//!    └────────[connected, V ≥ exit]──────────────▶ CONSTANT_CURRENT
//!                                                           │
//!                                                     [V ≥ target]
//!                                                           ▼
//!  COMPLETE ◀──────────[I < termination]────────── CONSTANT_VOLTAGE
//!
//!  Any state ──[critical fault]──▶ FAULT (absorbing until reset)
//! ```
//!
//! The fault override lives in [`super::transition`], not here: handlers
//! only ever see cycles on which no critical fault is active.

use super::context::{ActuatorCmd, SensorFrame};
use super::{ChargeState, StateDescriptor};
use crate::config::ChargeProfile;

// ═══════════════════════════════════════════════════════════════════════════
//  Table
// ═══════════════════════════════════════════════════════════════════════════

/// Indexed by `ChargeState as usize`.
pub static STATE_TABLE: [StateDescriptor; ChargeState::COUNT] = [
    StateDescriptor {
        state: ChargeState::Idle,
        name: "Idle",
        on_update: idle_update,
        command: zero_command,
    },
    StateDescriptor {
        state: ChargeState::Precharge,
        name: "Precharge",
        on_update: precharge_update,
        command: precharge_command,
    },
    StateDescriptor {
        state: ChargeState::ConstantCurrent,
        name: "ConstantCurrent",
        on_update: constant_current_update,
        command: constant_current_command,
    },
    StateDescriptor {
        state: ChargeState::ConstantVoltage,
        name: "ConstantVoltage",
        on_update: constant_voltage_update,
        command: constant_voltage_command,
    },
    StateDescriptor {
        state: ChargeState::Complete,
        name: "Complete",
        on_update: hold,
        command: zero_command,
    },
    StateDescriptor {
        state: ChargeState::Fault,
        name: "Fault",
        on_update: hold,
        command: zero_command,
    },
];

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(frame: &SensorFrame, profile: &ChargeProfile) -> Option<ChargeState> {
    if !frame.charger_connected {
        return None;
    }

    // Deeply discharged packs are trickle charged first.
    if frame.voltage < profile.precharge_exit_v {
        Some(ChargeState::Precharge)
    } else {
        Some(ChargeState::ConstantCurrent)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PRECHARGE
// ═══════════════════════════════════════════════════════════════════════════

fn precharge_command(profile: &ChargeProfile) -> ActuatorCmd {
    ActuatorCmd::new(profile.precharge_current_a, profile.nominal_voltage_limit_v)
}

fn precharge_update(frame: &SensorFrame, profile: &ChargeProfile) -> Option<ChargeState> {
    (frame.voltage >= profile.precharge_exit_v).then_some(ChargeState::ConstantCurrent)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONSTANT CURRENT
// ═══════════════════════════════════════════════════════════════════════════

fn constant_current_command(profile: &ChargeProfile) -> ActuatorCmd {
    ActuatorCmd::new(profile.fast_charge_current_a, profile.nominal_voltage_limit_v)
}

fn constant_current_update(frame: &SensorFrame, profile: &ChargeProfile) -> Option<ChargeState> {
    (frame.voltage >= profile.target_v).then_some(ChargeState::ConstantVoltage)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONSTANT VOLTAGE
// ═══════════════════════════════════════════════════════════════════════════

fn constant_voltage_command(profile: &ChargeProfile) -> ActuatorCmd {
    // Ceiling only; the pack draws less as it tapers.
    ActuatorCmd::new(profile.cv_max_current_a, profile.cv_voltage_limit_v)
}

fn constant_voltage_update(frame: &SensorFrame, profile: &ChargeProfile) -> Option<ChargeState> {
    (frame.current < profile.termination_a).then_some(ChargeState::Complete)
}

// ═══════════════════════════════════════════════════════════════════════════
//  COMPLETE / FAULT
// ═══════════════════════════════════════════════════════════════════════════

/// Terminal states leave only through an external reset.
fn hold(_frame: &SensorFrame, _profile: &ChargeProfile) -> Option<ChargeState> {
    None
}

fn zero_command(_profile: &ChargeProfile) -> ActuatorCmd {
    ActuatorCmd::ZERO
}
