// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-field change masks and partial layer state updates.
//!
//! A transaction carries *partial* updates: only the fields flagged in a
//! change's [`ChangeMask`] are semantically valid, and nothing may read or
//! merge an unflagged field. [`LayerStateChange::merge_from`] implements the
//! field-level merge the starting-state store relies on: flagged fields of
//! the incoming change overwrite, everything else is left untouched.

use core::fmt;
use core::ops::BitOr;

use kurbo::Point;

use crate::layer::{LayerHandle, LayerId};

// ---------------------------------------------------------------------------
// ChangeMask
// ---------------------------------------------------------------------------

/// Bitmask of which fields a layer state change carries.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChangeMask(u32);

impl ChangeMask {
    /// Depth order (`z`) is present.
    pub const Z: Self = Self(1 << 0);
    /// Position is present.
    pub const POSITION: Self = Self(1 << 1);
    /// Alpha is present.
    pub const ALPHA: Self = Self(1 << 2);
    /// Every known field is present.
    pub const ALL: Self = Self((1 << 3) - 1);

    /// Returns a mask with no fields present.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns `true` if no field is flagged.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every field flagged in `other` is also flagged here.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags every field flagged in `other`.
    pub const fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Returns the raw bit representation (for the wire codec).
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Reconstructs a mask from raw bits, discarding unknown bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }
}

impl BitOr for ChangeMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for ChangeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeMask(")?;
        let mut first = true;
        for (bit, name) in [
            (Self::Z, "Z"),
            (Self::POSITION, "POSITION"),
            (Self::ALPHA, "ALPHA"),
        ] {
            if self.contains(bit) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Change records
// ---------------------------------------------------------------------------

/// A partial update to one layer's visual state, as submitted on the commit
/// path.
///
/// The target is the opaque [`LayerHandle`] the client addressed; the tracer
/// resolves it to a stable [`LayerId`] when the change is recorded in an
/// entry. Field values are only meaningful when flagged in [`what`](Self::what).
#[derive(Clone, Debug, PartialEq)]
pub struct PendingLayerChange {
    /// Opaque identity of the target layer.
    pub handle: LayerHandle,
    /// Which fields this change carries.
    pub what: ChangeMask,
    /// Depth order, valid when [`ChangeMask::Z`] is flagged.
    pub z: i32,
    /// Position, valid when [`ChangeMask::POSITION`] is flagged.
    pub position: Point,
    /// Alpha, valid when [`ChangeMask::ALPHA`] is flagged.
    pub alpha: f32,
}

impl PendingLayerChange {
    /// Creates an empty change targeting `handle` — no fields flagged.
    #[must_use]
    pub fn new(handle: LayerHandle) -> Self {
        Self {
            handle,
            what: ChangeMask::empty(),
            z: 0,
            position: Point::ORIGIN,
            alpha: 1.0,
        }
    }

    /// Sets the depth order and flags it present.
    #[must_use]
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self.what.insert(ChangeMask::Z);
        self
    }

    /// Sets the position and flags it present.
    #[must_use]
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self.what.insert(ChangeMask::POSITION);
        self
    }

    /// Sets the alpha and flags it present.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self.what.insert(ChangeMask::ALPHA);
        self
    }

    /// Resolves the handle target to a stable layer id.
    #[must_use]
    pub fn resolved(&self, layer: LayerId) -> LayerStateChange {
        LayerStateChange {
            layer,
            what: self.what,
            z: self.z,
            position: self.position,
            alpha: self.alpha,
        }
    }
}

/// A partial update with the target resolved to a stable [`LayerId`] — the
/// form recorded in trace entries and accumulated in the baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStateChange {
    /// Identity of the target layer.
    pub layer: LayerId,
    /// Which fields this change carries.
    pub what: ChangeMask,
    /// Depth order, valid when [`ChangeMask::Z`] is flagged.
    pub z: i32,
    /// Position, valid when [`ChangeMask::POSITION`] is flagged.
    pub position: Point,
    /// Alpha, valid when [`ChangeMask::ALPHA`] is flagged.
    pub alpha: f32,
}

impl LayerStateChange {
    /// Creates an empty change for `layer` — no fields flagged, all values
    /// at their creation defaults.
    #[must_use]
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            what: ChangeMask::empty(),
            z: 0,
            position: Point::ORIGIN,
            alpha: 1.0,
        }
    }

    /// Sets the depth order and flags it present.
    #[must_use]
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self.what.insert(ChangeMask::Z);
        self
    }

    /// Sets the position and flags it present.
    #[must_use]
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self.what.insert(ChangeMask::POSITION);
        self
    }

    /// Sets the alpha and flags it present.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self.what.insert(ChangeMask::ALPHA);
        self
    }

    /// Field-level merge: every field flagged in `other` overwrites the
    /// corresponding field here (and becomes flagged); unflagged fields are
    /// left untouched.
    pub fn merge_from(&mut self, other: &Self) {
        if other.what.contains(ChangeMask::Z) {
            self.z = other.z;
            self.what.insert(ChangeMask::Z);
        }
        if other.what.contains(ChangeMask::POSITION) {
            self.position = other.position;
            self.what.insert(ChangeMask::POSITION);
        }
        if other.what.contains(ChangeMask::ALPHA) {
            self.alpha = other.alpha;
            self.what.insert(ChangeMask::ALPHA);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_operations() {
        let mut mask = ChangeMask::empty();
        assert!(mask.is_empty(), "fresh mask must be empty");
        mask.insert(ChangeMask::Z);
        assert!(mask.contains(ChangeMask::Z), "Z must be flagged");
        assert!(!mask.contains(ChangeMask::POSITION), "POSITION must not be flagged");
        let both = mask | ChangeMask::POSITION;
        assert!(both.contains(ChangeMask::Z | ChangeMask::POSITION), "union must hold both");
        assert_eq!(ChangeMask::from_bits(both.bits()), both);
    }

    #[test]
    fn from_bits_discards_unknown_bits() {
        let mask = ChangeMask::from_bits(0xFFFF_FFFF);
        assert_eq!(mask, ChangeMask::ALL);
    }

    #[test]
    fn merge_overwrites_only_flagged_fields() {
        let mut base = LayerStateChange::new(LayerId(1)).with_z(42);
        let update = LayerStateChange::new(LayerId(1))
            .with_z(41)
            .with_position(Point::new(22.0, 0.0));
        base.merge_from(&update);

        assert_eq!(base.z, 41);
        assert_eq!(base.position, Point::new(22.0, 0.0));
        assert!(base.what.contains(ChangeMask::Z | ChangeMask::POSITION), "merged fields flagged");
        // Alpha was never flagged by either side.
        assert!(!base.what.contains(ChangeMask::ALPHA), "alpha must stay unflagged");
        assert_eq!(base.alpha, 1.0);
    }

    #[test]
    fn merge_leaves_unflagged_fields_untouched() {
        let mut base = LayerStateChange::new(LayerId(1))
            .with_z(7)
            .with_alpha(0.5);
        let update = LayerStateChange::new(LayerId(1)).with_position(Point::new(3.0, 4.0));
        base.merge_from(&update);

        assert_eq!(base.z, 7);
        assert_eq!(base.alpha, 0.5);
        assert_eq!(base.position, Point::new(3.0, 4.0));
    }

    #[test]
    fn resolved_carries_fields_and_mask() {
        let pending = PendingLayerChange::new(LayerHandle(0xABC))
            .with_z(5)
            .with_alpha(0.25);
        let resolved = pending.resolved(LayerId(9));
        assert_eq!(resolved.layer, LayerId(9));
        assert_eq!(resolved.z, 5);
        assert_eq!(resolved.alpha, 0.25);
        assert_eq!(resolved.what, pending.what);
    }
}
