//! Unified error types for the charge controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! can be passed through the supervisor and state machine without
//! allocation.

use core::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor sample was rejected by the plausibility gate.
    Sensor(RejectReason),
    /// A fault condition blocks the requested operation.
    Fault(FaultKind),
    /// A reset was requested while a critical fault is still active.
    ResetInhibited,
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Fault(e) => write!(f, "fault: {e}"),
            Self::ResetInhibited => write!(f, "reset inhibited: critical fault active"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Plausibility rejections
// ---------------------------------------------------------------------------

/// Why the plausibility gate refused a raw reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RejectReason {
    /// Reading is NaN or infinite.
    NonFinite,
    /// Magnitude exceeds the channel's hardware range.
    OutOfRange,
    /// Change since the last accepted value exceeds the physical slew limit.
    SlewExceeded,
}

impl RejectReason {
    pub const COUNT: usize = 3;

    pub const ALL: [Self; Self::COUNT] = [Self::NonFinite, Self::OutOfRange, Self::SlewExceeded];

    /// Dense index, used to address per-reason counters.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite => write!(f, "non-finite reading"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::SlewExceeded => write!(f, "slew rate exceeded"),
        }
    }
}

impl From<RejectReason> for Error {
    fn from(e: RejectReason) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Fault kinds
// ---------------------------------------------------------------------------

/// Independent fault conditions tracked by the fault manager.
///
/// Each kind owns exactly one bit of a [`FaultSet`](crate::faults::FaultSet),
/// so several faults can be active at once and cleared individually. The
/// enumeration is closed: an out-of-range kind cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum FaultKind {
    /// Pack voltage above the protection limit.
    OverVoltage = 0b0000_0001,
    /// Pack voltage below the protection limit.
    UnderVoltage = 0b0000_0010,
    /// Pack temperature above the protection limit.
    OverTemp = 0b0000_0100,
    /// Sensor data went stale or a link dropped. Diagnostic only.
    CommLoss = 0b0000_1000,
}

impl FaultKind {
    pub const COUNT: usize = 4;

    pub const ALL: [Self; Self::COUNT] = [
        Self::OverVoltage,
        Self::UnderVoltage,
        Self::OverTemp,
        Self::CommLoss,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Bit position of this fault, used to address per-kind counters.
    pub const fn index(self) -> usize {
        (self as u8).trailing_zeros() as usize
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverVoltage => write!(f, "over voltage"),
            Self::UnderVoltage => write!(f, "under voltage"),
            Self::OverTemp => write!(f, "over temperature"),
            Self::CommLoss => write!(f, "communication loss"),
        }
    }
}

impl From<FaultKind> for Error {
    fn from(e: FaultKind) -> Self {
        Self::Fault(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
