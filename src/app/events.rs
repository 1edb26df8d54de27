//! Outbound application events.
//!
//! The [`ChargeService`](super::service::ChargeService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: log to console, print JSON lines,
//! forward to a CAN or serial link.

use serde::Serialize;

use crate::error::{FaultKind, RejectReason};
use crate::faults::FaultSet;
use crate::fsm::ChargeState;
use crate::sensors::Channel;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started { state: ChargeState },

    /// The state machine moved between states.
    StateChanged { from: ChargeState, to: ChargeState },

    /// A fault kind became active.
    FaultRaised { kind: FaultKind, active: FaultSet },

    /// A fault kind is no longer active.
    FaultCleared { kind: FaultKind, active: FaultSet },

    /// A raw sample was refused by the plausibility gate.
    SampleRejected {
        channel: Channel,
        reason: RejectReason,
        raw: f32,
        held: f32,
    },

    /// Power contactors were opened.
    ContactorsOpened { faults: FaultSet },

    /// A reset request was refused.
    ResetRefused { faults: FaultSet },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryData {
    pub cycle: u64,
    pub state: ChargeState,
    pub voltage: f32,
    pub current: f32,
    pub temp_c: f32,
    pub charger_connected: bool,
    pub current_limit: f32,
    pub voltage_limit: f32,
    pub contactors_closed: bool,
    pub faults: FaultSet,
}
