//! Simulated battery pack.
//!
//! A first-order cell model behind [`SensorPort`] and [`ActuatorPort`],
//! used by the host simulator and by integration tests. The pack has an
//! open-circuit voltage that rises with delivered charge, a series
//! resistance, and a lumped thermal mass that heats with I²R and cools
//! toward ambient.
//!
//! Faults are injected rather than modelled: a one-shot non-finite
//! current reading, a ramping thermal runaway, or a charger disconnect.

use log::{debug, info};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::fsm::context::ActuatorCmd;
use crate::sensors::RawSample;

/// Physical parameters of the simulated pack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackModel {
    /// Series resistance (Ω).
    pub resistance_ohm: f32,
    /// Open-circuit voltage gained per ampere-second delivered (V/As).
    pub volts_per_amp_sec: f32,
    /// Ambient temperature (°C).
    pub ambient_c: f32,
    /// Temperature rise per joule dissipated (°C/J).
    pub heat_per_joule: f32,
    /// Fraction of the gap to ambient closed per second.
    pub cooling_per_sec: f32,
    /// Temperature rise per second while a runaway is injected (°C/s).
    pub runaway_c_per_sec: f32,
}

impl Default for PackModel {
    fn default() -> Self {
        Self {
            resistance_ohm: 0.05,
            volts_per_amp_sec: 0.02,
            ambient_c: 25.0,
            heat_per_joule: 0.05,
            cooling_per_sec: 0.05,
            runaway_c_per_sec: 200.0,
        }
    }
}

/// Simulated pack and charger hardware.
#[derive(Debug, Clone)]
pub struct SimulatedPack {
    model: PackModel,
    ocv: f32,
    current: f32,
    terminal_v: f32,
    temp_c: f32,
    charger_connected: bool,
    contactors_closed: bool,
    limits: ActuatorCmd,
    glitch_pending: bool,
    runaway: bool,
}

impl SimulatedPack {
    /// A pack resting at `ocv` volts, at ambient temperature, with the
    /// charger connected and the contactors open.
    pub fn new(ocv: f32, model: PackModel) -> Self {
        Self {
            model,
            ocv,
            current: 0.0,
            terminal_v: ocv,
            temp_c: model.ambient_c,
            charger_connected: true,
            contactors_closed: false,
            limits: ActuatorCmd::ZERO,
            glitch_pending: false,
            runaway: false,
        }
    }

    /// Advance the model by `dt` seconds under the current limits.
    pub fn advance(&mut self, dt: f32) {
        let m = self.model;
        let lim = self.limits;

        let (current, terminal_v) = if self.contactors_closed && self.charger_connected {
            // The charger is a CC/CV source: whichever limit binds first wins.
            let headroom = (lim.voltage_limit - self.ocv) / m.resistance_ohm;
            if headroom <= lim.current_limit {
                (headroom.max(0.0), lim.voltage_limit.max(self.ocv))
            } else {
                (lim.current_limit, self.ocv + lim.current_limit * m.resistance_ohm)
            }
        } else {
            (0.0, self.ocv)
        };

        self.current = current;
        self.terminal_v = terminal_v;
        self.ocv += current * m.volts_per_amp_sec * dt;

        let heating = current * current * m.resistance_ohm * m.heat_per_joule;
        let cooling = (self.temp_c - m.ambient_c) * m.cooling_per_sec;
        self.temp_c += (heating - cooling) * dt;
        if self.runaway {
            self.temp_c += m.runaway_c_per_sec * dt;
        }
    }

    /// Corrupt the next current reading with a NaN.
    pub fn inject_glitch(&mut self) {
        info!("sim: glitch injected on current channel");
        self.glitch_pending = true;
    }

    /// Start a thermal runaway: temperature climbs every step.
    pub fn inject_overtemp(&mut self) {
        info!("sim: thermal runaway injected");
        self.runaway = true;
    }

    /// Stop an injected runaway and let the pack cool.
    pub fn stop_overtemp(&mut self) {
        self.runaway = false;
    }

    pub fn set_charger_connected(&mut self, connected: bool) {
        self.charger_connected = connected;
    }

    pub fn open_circuit_voltage(&self) -> f32 {
        self.ocv
    }

    pub fn temperature(&self) -> f32 {
        self.temp_c
    }

    pub fn contactors_closed(&self) -> bool {
        self.contactors_closed
    }

    pub fn limits(&self) -> ActuatorCmd {
        self.limits
    }
}

impl SensorPort for SimulatedPack {
    fn read_raw(&mut self) -> RawSample {
        let current = if self.glitch_pending {
            self.glitch_pending = false;
            f32::NAN
        } else {
            self.current
        };
        RawSample {
            voltage: self.terminal_v,
            current,
            temp_c: self.temp_c,
            charger_connected: self.charger_connected,
        }
    }
}

impl ActuatorPort for SimulatedPack {
    fn apply(&mut self, cmd: &ActuatorCmd) {
        if *cmd != self.limits {
            debug!(
                "sim: limits {:.2}A/{:.2}V",
                cmd.current_limit, cmd.voltage_limit
            );
        }
        self.limits = *cmd;
    }

    fn set_contactors(&mut self, closed: bool) {
        debug!("sim: contactors {}", if closed { "closed" } else { "open" });
        self.contactors_closed = closed;
    }
}
