// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace entries and the logical trace-file shape.

use alloc::vec::Vec;
use core::fmt;

use crate::layer::{LayerCreationRecord, LayerId};
use crate::transaction::TracedTransaction;

/// Identifier of a compositor frame cycle.
///
/// Issued monotonically by the compositor and used to tag which frame's
/// commit a batch of transactions belongs to. Commits are not required to
/// arrive in increasing vsync order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VsyncId(pub i64);

impl fmt::Debug for VsyncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VsyncId({})", self.0)
    }
}

/// Sentinel vsync id carried by the synthetic baseline entry.
pub const BASELINE_VSYNC_ID: VsyncId = VsyncId(i64::MIN);

/// One serialized unit of trace history, corresponding to one flush.
///
/// Entries produced at ingestion time additionally carry the layer
/// creations and removals newly observed since the previous entry; the
/// synthetic baseline entry instead carries the full set of live creation
/// records and never any removals.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceEntry {
    /// Frame cycle this entry covers, or [`BASELINE_VSYNC_ID`].
    pub vsync_id: VsyncId,
    /// Transactions committed for this vsync, in commit order.
    pub transactions: Vec<TracedTransaction>,
    /// Layer creations newly observed since the previous entry.
    pub added_layers: Vec<LayerCreationRecord>,
    /// Layer removals newly observed since the previous entry.
    pub removed_layers: Vec<LayerId>,
}

impl TraceEntry {
    /// Creates an empty entry for the given vsync.
    #[must_use]
    pub fn new(vsync_id: VsyncId) -> Self {
        Self {
            vsync_id,
            transactions: Vec::new(),
            added_layers: Vec::new(),
            removed_layers: Vec::new(),
        }
    }

    /// Returns `true` if this is the synthetic baseline entry.
    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.vsync_id == BASELINE_VSYNC_ID
    }
}

/// The full logical output of the tracer: the synthetic baseline entry
/// first, followed by every buffer-resident entry oldest-first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraceFile {
    /// Ordered entries, entry 0 being the baseline.
    pub entries: Vec<TraceEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_sentinel_is_recognized() {
        assert!(TraceEntry::new(BASELINE_VSYNC_ID).is_baseline(), "sentinel must mark baseline");
        assert!(!TraceEntry::new(VsyncId(0)).is_baseline(), "vsync 0 is a normal entry");
    }
}
