//! Table-driven charge state machine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  STATE_TABLE (indexed by ChargeState as usize)             │
//! │  ┌─────────────────┬──────────────────────┬─────────────┐  │
//! │  │ ChargeState     │ on_update            │ command     │  │
//! │  ├─────────────────┼──────────────────────┼─────────────┤  │
//! │  │ Idle            │ fn(frame, profile)   │ fn(profile) │  │
//! │  │ Precharge       │   -> Option<next>    │  -> Cmd     │  │
//! │  │ ConstantCurrent │                      │             │  │
//! │  │ ConstantVoltage │                      │             │  │
//! │  │ Complete        │                      │             │  │
//! │  │ Fault           │                      │             │  │
//! │  └─────────────────┴──────────────────────┴─────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each cycle [`transition`] first checks the fault verdict. A critical
//! fault forces `Fault` and the table is not consulted. Otherwise the
//! current state's `on_update` picks the next state (or `None` to stay),
//! and the **next** state's `command` produces the output. A cycle can
//! therefore never emit a mix of two states' commands.

pub mod context;
pub mod states;

use core::fmt;

use serde::Serialize;

use crate::config::ChargeProfile;
use crate::faults::FaultSet;
use context::{ActuatorCmd, SensorFrame};
use states::STATE_TABLE;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state the charger can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ChargeState {
    Idle = 0,
    Precharge = 1,
    ConstantCurrent = 2,
    ConstantVoltage = 3,
    Complete = 4,
    Fault = 5,
}

impl ChargeState {
    /// Number of states; sizes the state table.
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Idle,
        Self::Precharge,
        Self::ConstantCurrent,
        Self::ConstantVoltage,
        Self::Complete,
        Self::Fault,
    ];

    /// Short human-readable name.
    pub fn name(self) -> &'static str {
        STATE_TABLE[self as usize].name
    }

    /// States in which the charger may be delivering current.
    pub const fn is_charging(self) -> bool {
        matches!(
            self,
            Self::Precharge | Self::ConstantCurrent | Self::ConstantVoltage
        )
    }
}

impl fmt::Display for ChargeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Handler signatures
// ---------------------------------------------------------------------------

/// Per-cycle update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&SensorFrame, &ChargeProfile) -> Option<ChargeState>;

/// Output builder: the command a state emits every cycle it is active.
pub type StateCommandFn = fn(&ChargeProfile) -> ActuatorCmd;

/// Static descriptor for a single state (one row of the table).
pub struct StateDescriptor {
    pub state: ChargeState,
    pub name: &'static str,
    pub on_update: StateUpdateFn,
    pub command: StateCommandFn,
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

/// Compute the next state and the command it emits.
///
/// Pure: same inputs, same outputs. [`ChargeContext::step`] applies the
/// result.
///
/// [`ChargeContext::step`]: context::ChargeContext::step
pub fn transition(
    current: ChargeState,
    sensors: &SensorFrame,
    faults: &FaultSet,
    profile: &ChargeProfile,
) -> (ChargeState, ActuatorCmd) {
    let next = if faults.should_open_contactors() {
        ChargeState::Fault
    } else {
        (STATE_TABLE[current as usize].on_update)(sensors, profile).unwrap_or(current)
    };

    (next, (STATE_TABLE[next as usize].command)(profile))
}
