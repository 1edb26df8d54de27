//! One gated analog channel.
//!
//! Wraps the plausibility gate with the bookkeeping the caller owns:
//! the rejection streak and whether the channel has ever produced an
//! accepted value. The gate itself stays oblivious to both.

use core::fmt;

use log::warn;
use serde::Serialize;

use crate::config::ChannelConfig;
use crate::error::RejectReason;
use crate::plausibility::{self, PlausibilityState, RangeLimits};

/// Identity of an analog input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Voltage,
    Current,
    Temperature,
}

impl Channel {
    pub const COUNT: usize = 3;

    pub const ALL: [Self; Self::COUNT] = [Self::Voltage, Self::Current, Self::Temperature];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voltage => write!(f, "voltage"),
            Self::Current => write!(f, "current"),
            Self::Temperature => write!(f, "temperature"),
        }
    }
}

/// Outcome of sampling one channel for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading {
    /// Value to use downstream: the accepted raw value, or the held one.
    pub value: f32,
    /// Set when the raw value was refused this cycle.
    pub rejected: Option<RejectReason>,
}

/// A plausibility-gated channel with caller-side rejection tracking.
#[derive(Debug, Clone)]
pub struct GatedChannel {
    channel: Channel,
    state: PlausibilityState,
    limits: RangeLimits,
    reject_streak: u32,
    trusted: bool,
}

impl GatedChannel {
    pub fn new(channel: Channel, config: &ChannelConfig) -> Self {
        Self {
            channel,
            state: config.initial_state(),
            limits: config.limits,
            reject_streak: 0,
            // A baseline only seeds the slew reference; trust needs a measurement.
            trusted: false,
        }
    }

    /// Run one raw value through the gate.
    ///
    /// Rejections hold the last valid value.
    pub fn sample(&mut self, raw: f32) -> ChannelReading {
        match plausibility::validate(raw, &mut self.state, self.limits) {
            Ok(value) => {
                self.reject_streak = 0;
                self.trusted = true;
                ChannelReading {
                    value,
                    rejected: None,
                }
            }
            Err(reason) => {
                self.reject_streak = self.reject_streak.saturating_add(1);
                let held = self.state.last_valid();
                warn!(
                    "{} sample {} rejected ({}), holding {:.3} [streak {}]",
                    self.channel, raw, reason, held, self.reject_streak
                );
                ChannelReading {
                    value: held,
                    rejected: Some(reason),
                }
            }
        }
    }

    /// Replace the limits (hot reload). Held history is kept.
    pub fn set_limits(&mut self, limits: RangeLimits) {
        self.limits = limits;
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn limits(&self) -> RangeLimits {
        self.limits
    }

    /// Consecutive rejections since the last accepted value.
    pub fn reject_streak(&self) -> u32 {
        self.reject_streak
    }

    /// Whether this channel has ever accepted a measured value.
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    pub fn last_valid(&self) -> f32 {
        self.state.last_valid()
    }
}
