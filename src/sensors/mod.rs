//! Sensor subsystem: per-channel plausibility gating and the aggregating
//! [`SensorGate`].
//!
//! The gate owns one [`GatedChannel`] per analog input and turns each raw
//! acquisition into a [`SensorFrame`] for the state machine. Rejected
//! values never reach the frame; the channel's last valid value is used
//! in their place.

pub mod channel;

use heapless::Vec;
use serde::{Deserialize, Serialize};

pub use channel::{Channel, ChannelReading, GatedChannel};

use crate::config::SystemConfig;
use crate::error::RejectReason;
use crate::fsm::context::SensorFrame;

/// One unvalidated acquisition, straight from the ADC layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub voltage: f32,
    pub current: f32,
    pub temp_c: f32,
    pub charger_connected: bool,
}

/// A single refused value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rejection {
    pub channel: Channel,
    pub reason: RejectReason,
    pub raw: f32,
    /// The value substituted into the frame.
    pub held: f32,
}

/// Result of gating one [`RawSample`].
#[derive(Debug, Clone, PartialEq)]
pub struct GatedFrame {
    pub frame: SensorFrame,
    pub rejections: Vec<Rejection, { Channel::COUNT }>,
    trusted: [bool; Channel::COUNT],
    /// Longest consecutive-rejection streak over all channels.
    pub max_reject_streak: u32,
}

impl GatedFrame {
    /// Whether `channel` has ever produced a known-good value.
    pub fn is_trusted(&self, channel: Channel) -> bool {
        self.trusted[channel.index()]
    }

    pub fn all_trusted(&self) -> bool {
        self.trusted.iter().all(|t| *t)
    }
}

/// Aggregates the gated channels and produces a frame per cycle.
#[derive(Debug, Clone)]
pub struct SensorGate {
    channels: [GatedChannel; Channel::COUNT],
}

impl SensorGate {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            channels: [
                GatedChannel::new(Channel::Voltage, &config.voltage_channel),
                GatedChannel::new(Channel::Current, &config.current_channel),
                GatedChannel::new(Channel::Temperature, &config.temperature_channel),
            ],
        }
    }

    /// Gate every analog value in `raw` and assemble the frame.
    ///
    /// A flaky channel never stalls the loop: its rejection is reported
    /// and the held value stands in.
    pub fn gate(&mut self, raw: &RawSample) -> GatedFrame {
        let mut rejections = Vec::new();
        let mut values = [0.0_f32; Channel::COUNT];

        for (ch, raw_value) in self
            .channels
            .iter_mut()
            .zip([raw.voltage, raw.current, raw.temp_c])
        {
            let reading = ch.sample(raw_value);
            values[ch.channel().index()] = reading.value;
            if let Some(reason) = reading.rejected {
                // Capacity equals channel count; push cannot overflow.
                let _ = rejections.push(Rejection {
                    channel: ch.channel(),
                    reason,
                    raw: raw_value,
                    held: reading.value,
                });
            }
        }

        GatedFrame {
            frame: SensorFrame {
                voltage: values[Channel::Voltage.index()],
                current: values[Channel::Current.index()],
                temp_c: values[Channel::Temperature.index()],
                charger_connected: raw.charger_connected,
            },
            rejections,
            trusted: self.channels.each_ref().map(GatedChannel::is_trusted),
            max_reject_streak: self.max_reject_streak(),
        }
    }

    /// Push new channel limits from a reloaded config.
    pub fn apply_config(&mut self, config: &SystemConfig) {
        self.channels[Channel::Voltage.index()].set_limits(config.voltage_channel.limits);
        self.channels[Channel::Current.index()].set_limits(config.current_channel.limits);
        self.channels[Channel::Temperature.index()].set_limits(config.temperature_channel.limits);
    }

    pub fn channel(&self, channel: Channel) -> &GatedChannel {
        &self.channels[channel.index()]
    }

    pub fn max_reject_streak(&self) -> u32 {
        self.channels
            .iter()
            .map(GatedChannel::reject_streak)
            .max()
            .unwrap_or(0)
    }
}
