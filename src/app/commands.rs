//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (operator
//! console, host link, test harness) that the
//! [`ChargeService`](super::service::ChargeService) interprets and acts
//! upon.

use crate::config::SystemConfig;
use crate::error::FaultKind;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Return the state machine to `Idle`. Refused while a critical
    /// fault is active.
    Reset,

    /// Acknowledge and clear one fault kind. A condition that is still
    /// present re-raises on the next cycle.
    ClearFault(FaultKind),

    /// Hot-reload configuration. Rejected unless it validates.
    UpdateConfig(SystemConfig),
}
