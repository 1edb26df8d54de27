//! System configuration parameters
//!
//! All tunable parameters for the charge controller. Thresholds are kept
//! out of the state machine so a deployment can retune them per cell
//! chemistry. Values can be overridden from a JSON file at startup or hot
//! reloaded through `AppCommand::UpdateConfig`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::plausibility::{PlausibilityState, RangeLimits};

/// Charging thresholds and commanded limits for one cell chemistry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeProfile {
    /// Below this voltage the pack is trickle charged (V).
    pub precharge_exit_v: f32,
    /// Constant-current phase ends at this voltage (V).
    pub target_v: f32,
    /// Constant-voltage phase ends when current tapers below this (A).
    pub termination_a: f32,

    /// Current limit during precharge (A).
    pub precharge_current_a: f32,
    /// Current limit during constant-current fast charge (A).
    pub fast_charge_current_a: f32,
    /// Current ceiling during constant-voltage; the pack draws less (A).
    pub cv_max_current_a: f32,
    /// Voltage limit during precharge and constant current (V).
    pub nominal_voltage_limit_v: f32,
    /// Voltage held strictly during constant voltage (V).
    pub cv_voltage_limit_v: f32,
}

impl Default for ChargeProfile {
    fn default() -> Self {
        Self {
            precharge_exit_v: 3.0,
            target_v: 4.2,
            termination_a: 0.5,

            precharge_current_a: 0.5,
            fast_charge_current_a: 10.0,
            cv_max_current_a: 10.0,
            nominal_voltage_limit_v: 4.2,
            cv_voltage_limit_v: 4.2,
        }
    }
}

/// Protection limits evaluated by the safety supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectionLimits {
    /// Raise `OverVoltage` above this (V).
    pub over_voltage_v: f32,
    /// Raise `UnderVoltage` below this (V).
    pub under_voltage_v: f32,
    /// Raise `OverTemp` above this (°C).
    pub temp_max_c: f32,
    /// Consecutive in-range cycles before a condition fault is cleared.
    pub fault_clear_cycles: u32,
    /// Consecutive rejections on one channel before `CommLoss` is raised.
    /// `0` disables the escalation.
    pub stale_reject_limit: u32,
}

impl Default for ProtectionLimits {
    fn default() -> Self {
        Self {
            over_voltage_v: 4.35,
            under_voltage_v: 2.0,
            temp_max_c: 45.0,
            fault_clear_cycles: 100, // 1 s at 100 Hz
            stale_reject_limit: 100,
        }
    }
}

/// Plausibility configuration for one analog channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub limits: RangeLimits,
    /// Known starting value. `None` seeds the gate with `0.0`.
    #[serde(default)]
    pub baseline: Option<f32>,
}

impl ChannelConfig {
    pub const fn new(max_abs_value: f32, max_slew_per_call: f32) -> Self {
        Self {
            limits: RangeLimits::new(max_abs_value, max_slew_per_call),
            baseline: None,
        }
    }

    /// Fresh gate state for this channel.
    pub fn initial_state(&self) -> PlausibilityState {
        match self.baseline {
            Some(b) => PlausibilityState::with_baseline(b),
            None => PlausibilityState::new(),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Charging ---
    pub profile: ChargeProfile,

    // --- Safety ---
    pub protection: ProtectionLimits,

    // --- Plausibility ---
    pub voltage_channel: ChannelConfig,
    pub current_channel: ChannelConfig,
    pub temperature_channel: ChannelConfig,

    // --- Timing ---
    /// Control loop period (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Cycles between telemetry reports
    pub telemetry_interval_cycles: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            profile: ChargeProfile::default(),
            protection: ProtectionLimits::default(),

            voltage_channel: ChannelConfig::new(10.0, 5.0),
            current_channel: ChannelConfig::new(1000.0, 100.0),
            temperature_channel: ChannelConfig::new(150.0, 30.0),

            control_loop_interval_ms: 10, // 100 Hz
            telemetry_interval_cycles: 100,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed JSON config"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject unsafe or inconsistent values. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        let p = &self.profile;
        let guard = &self.protection;

        let all_finite = [
            p.precharge_exit_v,
            p.target_v,
            p.termination_a,
            p.precharge_current_a,
            p.fast_charge_current_a,
            p.cv_max_current_a,
            p.nominal_voltage_limit_v,
            p.cv_voltage_limit_v,
            guard.over_voltage_v,
            guard.under_voltage_v,
            guard.temp_max_c,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(Error::Config("thresholds must be finite"));
        }

        if p.precharge_exit_v <= 0.0 || p.precharge_exit_v >= p.target_v {
            return Err(Error::Config("precharge_exit_v must be in (0, target_v)"));
        }
        if p.termination_a <= 0.0 {
            return Err(Error::Config("termination_a must be positive"));
        }
        if p.precharge_current_a <= 0.0 || p.precharge_current_a > p.fast_charge_current_a {
            return Err(Error::Config(
                "precharge_current_a must be in (0, fast_charge_current_a]",
            ));
        }
        if p.cv_max_current_a < p.termination_a {
            return Err(Error::Config("cv_max_current_a must be >= termination_a"));
        }
        if p.nominal_voltage_limit_v <= 0.0 || p.cv_voltage_limit_v <= 0.0 {
            return Err(Error::Config("voltage limits must be positive"));
        }
        if p.cv_voltage_limit_v >= guard.over_voltage_v
            || p.nominal_voltage_limit_v >= guard.over_voltage_v
        {
            return Err(Error::Config("voltage limits must be below over_voltage_v"));
        }
        if p.target_v >= guard.over_voltage_v {
            return Err(Error::Config("target_v must be below over_voltage_v"));
        }
        if guard.under_voltage_v <= 0.0 || guard.under_voltage_v >= p.precharge_exit_v {
            return Err(Error::Config(
                "under_voltage_v must be in (0, precharge_exit_v)",
            ));
        }

        for ch in [
            &self.voltage_channel,
            &self.current_channel,
            &self.temperature_channel,
        ] {
            let l = ch.limits;
            if !(l.max_abs_value.is_finite() && l.max_abs_value > 0.0) {
                return Err(Error::Config("channel max_abs_value must be positive"));
            }
            if !(l.max_slew_per_call.is_finite() && l.max_slew_per_call > 0.0) {
                return Err(Error::Config("channel max_slew_per_call must be positive"));
            }
            if let Some(b) = ch.baseline {
                if !b.is_finite() || b.abs() > l.max_abs_value {
                    return Err(Error::Config("channel baseline must lie within range"));
                }
            }
        }
        if self.voltage_channel.limits.max_abs_value <= guard.over_voltage_v {
            return Err(Error::Config(
                "voltage channel range must cover over_voltage_v",
            ));
        }
        if self.temperature_channel.limits.max_abs_value <= guard.temp_max_c {
            return Err(Error::Config(
                "temperature channel range must cover temp_max_c",
            ));
        }

        if self.control_loop_interval_ms == 0 {
            return Err(Error::Config("control_loop_interval_ms must be non-zero"));
        }
        Ok(())
    }

    /// Duration of one control cycle in seconds.
    pub fn cycle_secs(&self) -> f32 {
        self.control_loop_interval_ms as f32 / 1000.0
    }
}
