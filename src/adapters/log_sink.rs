//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade. Whatever logger the binary installs decides where
//! they end up.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | #{} state={} | V={:.3} I={:.2} T={:.1}\u{00b0}C | \
                     limit={:.2}A/{:.2}V | contactors={} | faults={}",
                    t.cycle,
                    t.state,
                    t.voltage,
                    t.current,
                    t.temp_c,
                    t.current_limit,
                    t.voltage_limit,
                    if t.contactors_closed { "CLOSED" } else { "OPEN" },
                    t.faults,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::FaultRaised { kind, active } => {
                error!("FAULT | raised {}, active: {}", kind, active);
            }
            AppEvent::FaultCleared { kind, active } => {
                info!("FAULT | cleared {}, active: {}", kind, active);
            }
            AppEvent::SampleRejected {
                channel,
                reason,
                raw,
                held,
            } => {
                warn!("GATE  | {} rejected {} ({}), held {:.3}", channel, raw, reason, held);
            }
            AppEvent::ContactorsOpened { faults } => {
                error!("POWER | contactors opened, faults: {}", faults);
            }
            AppEvent::ResetRefused { faults } => {
                warn!("RESET | refused, faults: {}", faults);
            }
            AppEvent::Started { state } => {
                info!("START | initial_state={}", state);
            }
        }
    }
}
