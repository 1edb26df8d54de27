//! Sensor plausibility gate.
//!
//! [`validate`] accepts one raw reading only if it is finite, within the
//! channel's hardware range, and consistent with the maximum physical rate
//! of change since the last accepted reading. Checks run in that order and
//! stop at the first failure.
//!
//! On rejection the channel's [`PlausibilityState`] is left untouched: the
//! gate holds the last good value and reports *why* it refused. Whether to
//! reuse the held value or escalate after repeated rejections is the
//! caller's decision; the gate keeps no rejection history.
//!
//! ## Startup bias
//!
//! An uninitialised state is seeded with `0.0` on the first call, so the
//! very first reading is slew-checked against zero. A large legitimate
//! startup value (e.g. a pack already sitting at 40 V with a 5 V/call slew
//! limit) is rejected until the limit allows it. This is intentionally
//! conservative. Use [`PlausibilityState::with_baseline`] when the expected
//! startup value is known.

use serde::{Deserialize, Serialize};

use crate::error::RejectReason;

/// Per-channel plausibility limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeLimits {
    /// Largest magnitude the hardware can physically report.
    pub max_abs_value: f32,
    /// Largest change allowed between two consecutive accepted samples.
    pub max_slew_per_call: f32,
}

impl RangeLimits {
    pub const fn new(max_abs_value: f32, max_slew_per_call: f32) -> Self {
        Self {
            max_abs_value,
            max_slew_per_call,
        }
    }
}

/// Memory of one monitored channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlausibilityState {
    last_valid: f32,
    initialized: bool,
}

impl PlausibilityState {
    /// Uninitialised channel; the first [`validate`] call seeds `0.0`.
    pub const fn new() -> Self {
        Self {
            last_valid: 0.0,
            initialized: false,
        }
    }

    /// Channel seeded with a known starting value.
    pub const fn with_baseline(baseline: f32) -> Self {
        Self {
            last_valid: baseline,
            initialized: true,
        }
    }

    /// The most recently accepted value (or the seed).
    pub const fn last_valid(&self) -> f32 {
        self.last_valid
    }

    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Validate one raw reading against `limits` and the channel's history.
///
/// Returns the accepted value, which is also stored as the new
/// `last_valid`. On `Err` the state is not modified.
pub fn validate(
    raw: f32,
    state: &mut PlausibilityState,
    limits: RangeLimits,
) -> Result<f32, RejectReason> {
    if !state.initialized {
        state.last_valid = 0.0;
        state.initialized = true;
    }

    if !raw.is_finite() {
        return Err(RejectReason::NonFinite);
    }

    if raw.abs() > limits.max_abs_value {
        return Err(RejectReason::OutOfRange);
    }

    if (raw - state.last_valid).abs() > limits.max_slew_per_call {
        return Err(RejectReason::SlewExceeded);
    }

    state.last_valid = raw;
    Ok(raw)
}
