//! Application service — the hexagonal core.
//!
//! [`ChargeService`] owns the sensor gate, safety supervisor, and charge
//! state machine. It exposes a hardware-agnostic API. All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │        ChargeService          │
//! ActuatorPort ◀──│  Gate · Safety · Charge FSM   │
//!                 └──────────────────────────────┘
//!                              ▲
//!                        FaultLatch (ISR)
//! ```
//!
//! Each cycle runs strictly in order: acquire, gate, evaluate faults,
//! step the state machine, drive outputs. The state machine always sees
//! the fault verdict computed from the same cycle's readings.

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::faults::{FaultLatch, FaultSet};
use crate::fsm::ChargeState;
use crate::fsm::context::{ActuatorCmd, ChargeContext, SensorFrame};
use crate::safety::SafetySupervisor;
use crate::sensors::SensorGate;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// ChargeService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
#[derive(Debug)]
pub struct ChargeService {
    config: SystemConfig,
    gate: SensorGate,
    safety: SafetySupervisor,
    ctx: ChargeContext,
    latch: Option<&'static FaultLatch>,
    diagnostics: Diagnostics,
    faults: FaultSet,
    frame: SensorFrame,
    command: ActuatorCmd,
    contactors_closed: bool,
    start_inhibited: bool,
    cycle: u64,
}

impl ChargeService {
    /// Construct the service from a validated configuration.
    pub fn new(config: SystemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gate: SensorGate::new(&config),
            safety: SafetySupervisor::new(config.protection),
            ctx: ChargeContext::new(config.profile),
            config,
            latch: None,
            diagnostics: Diagnostics::new(),
            faults: FaultSet::new(),
            frame: SensorFrame::default(),
            command: ActuatorCmd::ZERO,
            contactors_closed: false,
            start_inhibited: false,
            cycle: 0,
        })
    }

    /// Drain `latch` at the start of every cycle.
    pub fn attach_latch(&mut self, latch: &'static FaultLatch) {
        self.latch = Some(latch);
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive outputs to a known-safe state and announce startup.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.apply(&ActuatorCmd::ZERO);
        hw.set_contactors(false);
        self.contactors_closed = false;
        self.command = ActuatorCmd::ZERO;
        sink.emit(&AppEvent::Started {
            state: self.ctx.state(),
        });
        info!("ChargeService started in {}", self.ctx.state());
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full control cycle: acquire → gate → safety → FSM → outputs.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> ActuatorCmd {
        self.cycle = self.cycle.wrapping_add(1);

        // 1. Acquire and gate
        let raw = hw.read_raw();
        let gated = self.gate.gate(&raw);
        for r in &gated.rejections {
            self.diagnostics.record_rejection(r.channel, r.reason);
            sink.emit(&AppEvent::SampleRejected {
                channel: r.channel,
                reason: r.reason,
                raw: r.raw,
                held: r.held,
            });
        }

        // 2. Safety evaluation
        let pending = self.latch.map(FaultLatch::take).unwrap_or_default();
        let faults = self.safety.evaluate(&gated, pending);
        self.publish_fault_edges(self.faults, faults, sink);
        self.faults = faults;

        // 3. State machine
        let mut frame = gated.frame;
        self.frame = gated.frame;
        let inhibit = !gated.all_trusted();
        if inhibit != self.start_inhibited {
            if inhibit {
                warn!("Charge start inhibited: a channel has no accepted reading yet");
            } else {
                info!("All channels trusted, charge start permitted");
            }
            self.start_inhibited = inhibit;
        }
        if inhibit {
            frame.charger_connected = false;
        }

        let prev_state = self.ctx.state();
        let cmd = self.ctx.step(&frame, &faults);

        // 4. Outputs
        self.drive_outputs(cmd, hw, sink);

        // 5. Notifications
        let new_state = self.ctx.state();
        if new_state != prev_state {
            self.diagnostics
                .record_transition(self.cycle, prev_state, new_state);
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }

        let interval = u64::from(self.config.telemetry_interval_cycles);
        if interval > 0 && self.cycle % interval == 0 {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }

        cmd
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            AppCommand::Reset => {
                let prev = self.ctx.state();
                // Trips latched since the last cycle count as active.
                let pending = self.latch.map(FaultLatch::pending).unwrap_or_default();
                let faults = self.faults.union(pending);
                if let Err(e) = self.ctx.reset(&faults) {
                    self.diagnostics.record_reset_refused(self.cycle);
                    sink.emit(&AppEvent::ResetRefused { faults });
                    return Err(e);
                }
                self.command = ActuatorCmd::ZERO;
                hw.apply(&self.command);
                if prev != ChargeState::Idle {
                    self.diagnostics
                        .record_transition(self.cycle, prev, ChargeState::Idle);
                    sink.emit(&AppEvent::StateChanged {
                        from: prev,
                        to: ChargeState::Idle,
                    });
                }
            }
            AppCommand::ClearFault(kind) => {
                let before = self.faults;
                if self.safety.clear(kind) {
                    let after = self.safety.faults();
                    self.publish_fault_edges(before, after, sink);
                    self.faults = after;
                }
            }
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate()?;
                self.gate.apply_config(&new_config);
                self.safety.set_limits(new_config.protection);
                self.ctx.profile = new_config.profile;
                self.config = new_config;
                info!("Configuration updated at runtime");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the last completed cycle.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            cycle: self.cycle,
            state: self.ctx.state(),
            voltage: self.frame.voltage,
            current: self.frame.current,
            temp_c: self.frame.temp_c,
            charger_connected: self.frame.charger_connected,
            current_limit: self.command.current_limit,
            voltage_limit: self.command.voltage_limit,
            contactors_closed: self.contactors_closed,
            faults: self.faults,
        }
    }

    /// Current charge state.
    pub fn state(&self) -> ChargeState {
        self.ctx.state()
    }

    /// Active faults as of the last cycle.
    pub fn faults(&self) -> FaultSet {
        self.faults
    }

    /// Command issued on the last cycle.
    pub fn last_command(&self) -> ActuatorCmd {
        self.command
    }

    /// Gated frame from the last cycle.
    pub fn last_frame(&self) -> SensorFrame {
        self.frame
    }

    pub fn contactors_closed(&self) -> bool {
        self.contactors_closed
    }

    /// Control cycles executed since construction.
    pub fn cycle_count(&self) -> u64 {
        self.cycle
    }

    pub fn cycles_in_state(&self) -> u64 {
        self.ctx.cycles_in_state()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate the cycle's command into port calls.
    ///
    /// Limits go to zero before the contactors open, and the contactors
    /// close before non-zero limits are applied.
    fn drive_outputs(
        &mut self,
        cmd: ActuatorCmd,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let permit = !self.faults.should_open_contactors() && self.ctx.state() != ChargeState::Fault;

        if permit {
            if !self.contactors_closed {
                hw.set_contactors(true);
                self.contactors_closed = true;
                info!("Contactors closed");
            }
            hw.apply(&cmd);
        } else {
            hw.apply(&cmd);
            if self.contactors_closed {
                hw.set_contactors(false);
                self.contactors_closed = false;
                error!("Contactors OPENED (faults: {})", self.faults);
                sink.emit(&AppEvent::ContactorsOpened {
                    faults: self.faults,
                });
            }
        }
        self.command = cmd;
    }

    fn publish_fault_edges(&mut self, before: FaultSet, after: FaultSet, sink: &mut impl EventSink) {
        for kind in after.difference(before).iter() {
            self.diagnostics.record_fault_raised(self.cycle, kind);
            sink.emit(&AppEvent::FaultRaised {
                kind,
                active: after,
            });
        }
        for kind in before.difference(after).iter() {
            self.diagnostics.record_fault_cleared(self.cycle, kind);
            sink.emit(&AppEvent::FaultCleared {
                kind,
                active: after,
            });
        }
    }
}
