//! Safety supervisor.
//!
//! The supervisor runs **every cycle before the state machine** and
//! produces the [`FaultSet`] the state machine consults first. Faults come
//! from two sources:
//!
//! * **Condition faults** are derived from the gated frame (over/under
//!   voltage, over temperature) or from gate health (`CommLoss` once a
//!   channel has been rejected too many times in a row). A condition fault
//!   clears itself only after `fault_clear_cycles` consecutive in-range
//!   cycles.
//! * **Latched faults** arrive asynchronously through a [`FaultLatch`]
//!   (comparator trips, watchdog ISRs). They stay set until an explicit
//!   [`clear`](SafetySupervisor::clear).
//!
//! The reported set is the union of both. Conditions are only evaluated
//! against channels that have produced at least one accepted value, so
//! the gate's `0.0` seed cannot raise a spurious `UnderVoltage`. A
//! configured baseline does not count as an accepted value.
//!
//! A trusted channel whose readings keep failing the gate holds its last
//! accepted value indefinitely, and conditions are checked against that
//! held value. The only reaction is `CommLoss`, which is **not** critical,
//! so the charger keeps running at the commanded limits. Choose
//! `stale_reject_limit` to bound how long that may go on, and escalate
//! `CommLoss` in the integration layer if a frozen channel must stop the
//! charge. With `stale_reject_limit = 0` nothing reacts at all.
//!
//! [`FaultLatch`]: crate::faults::FaultLatch

use log::{error, info, warn};

use crate::config::ProtectionLimits;
use crate::error::FaultKind;
use crate::faults::FaultSet;
use crate::sensors::{Channel, GatedFrame};

/// Safety supervisor.
#[derive(Debug, Clone)]
pub struct SafetySupervisor {
    limits: ProtectionLimits,
    /// Faults whose condition is (or recently was) present.
    condition: FaultSet,
    /// Faults raised asynchronously; cleared only on request.
    latched: FaultSet,
    /// In-range cycles seen per condition fault, indexed by `FaultKind::index`.
    recovery: [u32; FaultKind::COUNT],
}

impl SafetySupervisor {
    pub fn new(limits: ProtectionLimits) -> Self {
        Self {
            limits,
            condition: FaultSet::new(),
            latched: FaultSet::new(),
            recovery: [0; FaultKind::COUNT],
        }
    }

    /// Evaluate all safety conditions against the latest gated frame and
    /// merge in any asynchronously latched kinds. Returns the full set.
    pub fn evaluate(&mut self, gated: &GatedFrame, pending: FaultSet) -> FaultSet {
        // ── Asynchronous sources ──────────────────────────────────
        for kind in pending.difference(self.latched).iter() {
            error!("SAFETY FAULT LATCHED: {kind}");
        }
        self.latched = self.latched.union(pending);

        let frame = &gated.frame;
        let limits = self.limits;

        // ── Voltage ───────────────────────────────────────────────
        if gated.is_trusted(Channel::Voltage) {
            self.eval_fault(FaultKind::OverVoltage, frame.voltage > limits.over_voltage_v);
            self.eval_fault(FaultKind::UnderVoltage, frame.voltage < limits.under_voltage_v);
        }

        // ── Temperature ───────────────────────────────────────────
        if gated.is_trusted(Channel::Temperature) {
            self.eval_fault(FaultKind::OverTemp, frame.temp_c > limits.temp_max_c);
        }

        // ── Sensor health ─────────────────────────────────────────
        if limits.stale_reject_limit > 0 {
            self.eval_fault(
                FaultKind::CommLoss,
                gated.max_reject_streak >= limits.stale_reject_limit,
            );
        } else if self.condition.is_active(FaultKind::CommLoss) {
            info!("SAFETY FAULT CLEARED: {} (escalation disabled)", FaultKind::CommLoss);
            self.condition.clear(FaultKind::CommLoss);
            self.recovery[FaultKind::CommLoss.index()] = 0;
        }

        self.faults()
    }

    /// Explicitly clear `kind`, whichever source raised it.
    ///
    /// A condition that is still present re-raises on the next
    /// [`evaluate`](Self::evaluate). Returns whether the kind was active.
    pub fn clear(&mut self, kind: FaultKind) -> bool {
        let was_active = self.faults().is_active(kind);
        self.latched.clear(kind);
        self.condition.clear(kind);
        self.recovery[kind.index()] = 0;
        if was_active {
            info!("SAFETY FAULT CLEARED (manual): {kind}");
        } else {
            warn!("clear requested for inactive fault {kind}");
        }
        was_active
    }

    /// Swap in new limits. Active faults stay as they are until the next
    /// evaluation.
    pub fn set_limits(&mut self, limits: ProtectionLimits) {
        self.limits = limits;
    }

    /// Current fault set (conditions and latched kinds).
    pub fn faults(&self) -> FaultSet {
        self.condition.union(self.latched)
    }

    /// Only the asynchronously latched kinds.
    pub fn latched(&self) -> FaultSet {
        self.latched
    }

    pub fn has_faults(&self) -> bool {
        !self.faults().is_empty()
    }

    pub fn has_fault(&self, kind: FaultKind) -> bool {
        self.faults().is_active(kind)
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set a fault on `condition`, or count toward clearing it.
    fn eval_fault(&mut self, kind: FaultKind, condition: bool) {
        let slot = &mut self.recovery[kind.index()];
        if condition {
            if !self.condition.is_active(kind) {
                error!("SAFETY FAULT SET: {kind}");
            }
            self.condition.set(kind);
            *slot = 0;
        } else if self.condition.is_active(kind) {
            *slot = slot.saturating_add(1);
            if *slot >= self.limits.fault_clear_cycles {
                info!("SAFETY FAULT CLEARED: {kind} (in range for {} cycles)", *slot);
                self.condition.clear(kind);
                *slot = 0;
            }
        }
    }
}
