//! Runtime diagnostics.
//!
//! Counters for everything the control loop rejects or raises, plus a
//! fixed-size ring of the most recent notable records (transitions and
//! fault edges). Both live in RAM only; nothing here allocates.

use heapless::HistoryBuffer;
use serde::Serialize;

use crate::error::{FaultKind, RejectReason};
use crate::fsm::ChargeState;
use crate::sensors::Channel;

/// Number of records retained in the history ring.
pub const HISTORY_DEPTH: usize = 16;

/// One entry in the history ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Record {
    Transition {
        cycle: u64,
        from: ChargeState,
        to: ChargeState,
    },
    FaultRaised {
        cycle: u64,
        kind: FaultKind,
    },
    FaultCleared {
        cycle: u64,
        kind: FaultKind,
    },
    ResetRefused {
        cycle: u64,
    },
}

/// Aggregated counters and recent history.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Rejections per channel, indexed by `Channel::index`.
    rejections: [[u32; RejectReason::COUNT]; Channel::COUNT],
    /// Times each fault kind was raised, indexed by `FaultKind::index`.
    fault_raises: [u32; FaultKind::COUNT],
    transitions: u32,
    history: HistoryBuffer<Record, HISTORY_DEPTH>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rejection(&mut self, channel: Channel, reason: RejectReason) {
        let slot = &mut self.rejections[channel.index()][reason.index()];
        *slot = slot.saturating_add(1);
    }

    pub fn record_transition(&mut self, cycle: u64, from: ChargeState, to: ChargeState) {
        self.transitions = self.transitions.saturating_add(1);
        self.history.write(Record::Transition { cycle, from, to });
    }

    pub fn record_fault_raised(&mut self, cycle: u64, kind: FaultKind) {
        let slot = &mut self.fault_raises[kind.index()];
        *slot = slot.saturating_add(1);
        self.history.write(Record::FaultRaised { cycle, kind });
    }

    pub fn record_fault_cleared(&mut self, cycle: u64, kind: FaultKind) {
        self.history.write(Record::FaultCleared { cycle, kind });
    }

    pub fn record_reset_refused(&mut self, cycle: u64) {
        self.history.write(Record::ResetRefused { cycle });
    }

    pub fn rejections(&self, channel: Channel, reason: RejectReason) -> u32 {
        self.rejections[channel.index()][reason.index()]
    }

    /// All rejections on `channel`, regardless of reason.
    pub fn channel_rejections(&self, channel: Channel) -> u32 {
        self.rejections[channel.index()].iter().sum()
    }

    pub fn total_rejections(&self) -> u32 {
        self.rejections.iter().flatten().sum()
    }

    pub fn fault_raises(&self, kind: FaultKind) -> u32 {
        self.fault_raises[kind.index()]
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Recent records, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Record> + '_ {
        self.history.oldest_ordered()
    }

    /// Point-in-time summary for telemetry or a CLI report.
    pub fn summary(&self) -> DiagnosticsSummary {
        DiagnosticsSummary {
            transitions: self.transitions,
            voltage_rejections: self.channel_rejections(Channel::Voltage),
            current_rejections: self.channel_rejections(Channel::Current),
            temperature_rejections: self.channel_rejections(Channel::Temperature),
            fault_raises: self.fault_raises,
        }
    }
}

/// Serializable digest of [`Diagnostics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSummary {
    pub transitions: u32,
    pub voltage_rejections: u32,
    pub current_rejections: u32,
    pub temperature_rejections: u32,
    /// Indexed by `FaultKind::index`.
    pub fault_raises: [u32; FaultKind::COUNT],
}
