//! Fault manager.
//!
//! [`FaultSet`] is a bitset keyed by the closed [`FaultKind`] enumeration.
//! Every operation is a single masked read or write, so set, clear and
//! query are O(1) and cannot fail.
//!
//! ## Contactor policy
//!
//! Contactors must open whenever any kind in [`CRITICAL_MASK`] is active.
//! `CommLoss` is deliberately outside the mask: it stays visible for
//! diagnostics but never opens contactors on its own.
//!
//! Faults are **latched**: nothing in this module clears a bit unless the
//! caller asks for it.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::FaultKind;

/// Kinds whose presence mandates opening the power contactors.
pub const CRITICAL_MASK: u8 =
    FaultKind::OverVoltage.mask() | FaultKind::UnderVoltage.mask() | FaultKind::OverTemp.mask();

/// Mask of every defined fault bit.
const VALID_MASK: u8 = CRITICAL_MASK | FaultKind::CommLoss.mask();

// ---------------------------------------------------------------------------
// FaultSet
// ---------------------------------------------------------------------------

/// Set of currently active faults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultSet {
    active: u8,
}

impl FaultSet {
    /// An empty set (no faults active).
    pub const fn new() -> Self {
        Self { active: 0 }
    }

    /// Build a set from raw bits. Undefined bits are discarded.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            active: bits & VALID_MASK,
        }
    }

    /// Set the bit for `kind`. Idempotent.
    pub fn set(&mut self, kind: FaultKind) {
        self.active |= kind.mask();
    }

    /// Clear the bit for `kind`. Idempotent.
    pub fn clear(&mut self, kind: FaultKind) {
        self.active &= !kind.mask();
    }

    /// Check whether `kind` is active.
    pub const fn is_active(&self, kind: FaultKind) -> bool {
        self.active & kind.mask() != 0
    }

    /// True iff at least one critical kind is active.
    pub const fn should_open_contactors(&self) -> bool {
        self.active & CRITICAL_MASK != 0
    }

    /// The critical subset of the active faults.
    pub const fn critical(&self) -> Self {
        Self {
            active: self.active & CRITICAL_MASK,
        }
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            active: self.active | other.active,
        }
    }

    /// Kinds present in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self {
            active: self.active & !other.active,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Raw bitmask.
    pub const fn bits(&self) -> u8 {
        self.active
    }

    /// Iterate over active kinds in bit order.
    pub fn iter(&self) -> impl Iterator<Item = FaultKind> + '_ {
        FaultKind::ALL.into_iter().filter(|k| self.is_active(*k))
    }
}

impl From<FaultKind> for FaultSet {
    fn from(kind: FaultKind) -> Self {
        Self {
            active: kind.mask(),
        }
    }
}

impl fmt::Display for FaultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        for kind in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{kind}")?;
            first = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FaultLatch (interrupt-side injection)
// ---------------------------------------------------------------------------

/// Lock-free pending-fault latch for interrupt context.
///
/// A hardware comparator ISR calls [`raise`](Self::raise); the control
/// cycle calls [`take`](Self::take) once, before fault evaluation, and
/// merges the drained bits into its own [`FaultSet`]. The ISR never touches
/// the control task's fault set directly.
///
/// `new` is `const` so the latch can live in a `static` owned by the
/// integration layer.
#[derive(Debug, Default)]
pub struct FaultLatch {
    pending: AtomicU8,
}

impl FaultLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU8::new(0),
        }
    }

    /// Record a fault. Safe to call from interrupt context.
    pub fn raise(&self, kind: FaultKind) {
        self.pending.fetch_or(kind.mask(), Ordering::Release);
    }

    /// Atomically drain every pending fault.
    pub fn take(&self) -> FaultSet {
        FaultSet::from_bits(self.pending.swap(0, Ordering::AcqRel))
    }

    /// Peek without draining.
    pub fn pending(&self) -> FaultSet {
        FaultSet::from_bits(self.pending.load(Ordering::Acquire))
    }
}
