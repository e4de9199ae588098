// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Consolidated baseline state for history evicted from the trace buffer.
//!
//! When the bounded buffer evicts an entry, [`absorb_evicted_entry`] merges
//! the entry's effects here, so replaying baseline + resident entries still
//! yields a complete snapshot of every live layer. Absorption must happen
//! exactly once per evicted entry, synchronously with the eviction — it is
//! the only mutation path for the accumulated per-layer state.
//!
//! Creation and removal notifications are first queued as *pending*; the
//! engine drains them into the next flushed entry, and they only become
//! baseline state once that entry is in turn evicted. A layer id therefore
//! appears in the baseline mapping iff the layer is known alive and at
//! least one of its historical changes has left the buffer.
//!
//! [`absorb_evicted_entry`]: StartingStateStore::absorb_evicted_entry

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

use crate::change::{ChangeMask, LayerStateChange};
use crate::entry::{BASELINE_VSYNC_ID, TraceEntry};
use crate::layer::{LayerCreationRecord, LayerId};
use crate::transaction::TracedTransaction;

/// Per-layer baseline state plus the creation records of layers no longer
/// individually represented in the buffer.
#[derive(Debug, Default)]
pub struct StartingStateStore {
    /// Creations observed but not yet carried by a flushed entry.
    pending_created: Vec<LayerCreationRecord>,
    /// Removals observed but not yet carried by a flushed entry.
    pending_removed: Vec<LayerId>,
    /// Live layers whose creation entry has been evicted.
    live: BTreeMap<LayerId, LayerCreationRecord>,
    /// Accumulated per-layer state, built by successive field-level merges.
    states: BTreeMap<LayerId, LayerStateChange>,
}

impl StartingStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a creation record observed from the compositor.
    ///
    /// # Panics
    ///
    /// Panics if `record.id` is already tracked — adding a live layer id
    /// twice is a caller error.
    pub fn record_layer_added(&mut self, record: LayerCreationRecord) {
        assert!(
            !self.live.contains_key(&record.id)
                && self.pending_created.iter().all(|r| r.id != record.id),
            "layer {:?} is already tracked",
            record.id
        );
        self.pending_created.push(record);
    }

    /// Queues a removal observed from the compositor.
    ///
    /// The baseline purge happens only when the entry carrying this removal
    /// is absorbed; until then the layer's accumulated state stays visible
    /// so the resident history remains replayable.
    pub fn record_layer_removed(&mut self, id: LayerId) {
        self.pending_removed.push(id);
    }

    /// Drains the pending creations and removals into the caller's entry
    /// under construction.
    #[must_use]
    pub fn take_pending(&mut self) -> (Vec<LayerCreationRecord>, Vec<LayerId>) {
        (
            mem::take(&mut self.pending_created),
            mem::take(&mut self.pending_removed),
        )
    }

    /// Merges an evicted entry's effects into the baseline.
    ///
    /// Layer state changes are merged field-by-field (flagged fields
    /// overwrite, unflagged fields are untouched), creation records become
    /// live, and removals carried by the entry purge the layer entirely.
    pub fn absorb_evicted_entry(&mut self, entry: &TraceEntry) {
        for tx in &entry.transactions {
            for change in &tx.changes {
                self.states
                    .entry(change.layer)
                    .or_insert_with(|| LayerStateChange::new(change.layer))
                    .merge_from(change);
            }
        }
        for record in &entry.added_layers {
            self.live.entry(record.id).or_insert_with(|| record.clone());
        }
        // Removals are processed last: a layer created and removed within
        // the same entry nets out to nothing.
        for &id in &entry.removed_layers {
            self.live.remove(&id);
            self.states.remove(&id);
        }
    }

    /// Builds the synthetic baseline entry: one synthetic transaction
    /// carrying the full accumulated state of every live layer (all fields
    /// flagged present), ordered by layer id, plus all live creation
    /// records.
    ///
    /// Pure and repeatable — does not mutate the store.
    #[must_use]
    pub fn build_baseline_entry(&self) -> TraceEntry {
        let mut entry = TraceEntry::new(BASELINE_VSYNC_ID);
        if !self.states.is_empty() {
            let mut tx = TracedTransaction::new(0, 0, 0);
            for state in self.states.values() {
                let mut change = state.clone();
                change.what = ChangeMask::ALL;
                tx.changes.push(change);
            }
            entry.transactions.push(tx);
        }
        entry.added_layers = self.live.values().cloned().collect();
        entry
    }

    /// Number of layers with accumulated baseline state.
    #[must_use]
    pub fn baseline_len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if nothing is tracked — no baseline state, no live
    /// creation records, no pending notifications.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
            && self.live.is_empty()
            && self.pending_created.is_empty()
            && self.pending_removed.is_empty()
    }

    /// Drops all tracked state (full teardown).
    pub fn clear(&mut self) {
        self.pending_created.clear();
        self.pending_removed.clear();
        self.live.clear();
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use kurbo::Point;

    use super::*;
    use crate::entry::VsyncId;

    fn creation(id: i32, name: &str, parent: Option<i32>) -> LayerCreationRecord {
        LayerCreationRecord {
            id: LayerId(id),
            name: name.to_string(),
            flags: 0,
            parent: parent.map(LayerId),
        }
    }

    fn entry_with_changes(vsync: i64, changes: Vec<LayerStateChange>) -> TraceEntry {
        let mut entry = TraceEntry::new(VsyncId(vsync));
        let mut tx = TracedTransaction::new(1, 0, 0);
        tx.changes = changes;
        entry.transactions.push(tx);
        entry
    }

    #[test]
    fn successive_absorptions_merge_field_level() {
        let mut store = StartingStateStore::new();
        store.absorb_evicted_entry(&entry_with_changes(
            1,
            vec![LayerStateChange::new(LayerId(1)).with_z(42)],
        ));
        store.absorb_evicted_entry(&entry_with_changes(
            2,
            vec![
                LayerStateChange::new(LayerId(1))
                    .with_z(41)
                    .with_position(Point::new(22.0, 0.0)),
            ],
        ));

        let baseline = store.build_baseline_entry();
        let changes = &baseline.transactions[0].changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].z, 41);
        assert_eq!(changes[0].position, Point::new(22.0, 0.0));
    }

    #[test]
    fn baseline_changes_are_ordered_by_layer_id_with_all_fields_flagged() {
        let mut store = StartingStateStore::new();
        store.absorb_evicted_entry(&entry_with_changes(
            1,
            vec![
                LayerStateChange::new(LayerId(2)).with_z(43),
                LayerStateChange::new(LayerId(1)).with_z(42),
            ],
        ));

        let baseline = store.build_baseline_entry();
        assert!(baseline.is_baseline(), "baseline entry must carry the sentinel");
        let changes = &baseline.transactions[0].changes;
        assert_eq!(changes[0].layer, LayerId(1));
        assert_eq!(changes[1].layer, LayerId(2));
        for change in changes {
            assert_eq!(change.what, ChangeMask::ALL);
        }
        // Fields never merged report creation defaults.
        assert_eq!(changes[0].alpha, 1.0);
        assert_eq!(changes[0].position, Point::ORIGIN);
    }

    #[test]
    fn absorbed_removal_purges_baseline_and_creation_record() {
        let mut store = StartingStateStore::new();
        let mut first = entry_with_changes(1, vec![LayerStateChange::new(LayerId(2)).with_z(43)]);
        first.added_layers.push(creation(2, "child", Some(1)));
        store.absorb_evicted_entry(&first);
        assert_eq!(store.baseline_len(), 1);

        let mut removal = TraceEntry::new(VsyncId(3));
        removal.removed_layers.push(LayerId(2));
        store.absorb_evicted_entry(&removal);

        assert_eq!(store.baseline_len(), 0);
        let baseline = store.build_baseline_entry();
        assert!(baseline.transactions.is_empty(), "no live state may remain");
        assert!(baseline.added_layers.is_empty(), "creation record must be purged");
    }

    #[test]
    fn removal_stays_pending_until_absorbed() {
        let mut store = StartingStateStore::new();
        store.absorb_evicted_entry(&entry_with_changes(
            1,
            vec![LayerStateChange::new(LayerId(2)).with_z(43)],
        ));
        // The compositor removed the layer, but the entry carrying the
        // removal has not been evicted yet.
        store.record_layer_removed(LayerId(2));
        assert_eq!(store.baseline_len(), 1);

        let (added, removed) = store.take_pending();
        assert!(added.is_empty(), "no creations were pending");
        assert_eq!(removed, vec![LayerId(2)]);
    }

    #[test]
    fn add_and_remove_in_one_entry_nets_out() {
        let mut store = StartingStateStore::new();
        let mut entry = entry_with_changes(1, vec![LayerStateChange::new(LayerId(5)).with_z(1)]);
        entry.added_layers.push(creation(5, "ephemeral", None));
        entry.removed_layers.push(LayerId(5));
        store.absorb_evicted_entry(&entry);
        assert!(store.is_empty(), "created-and-removed layer must leave no trace");
    }

    #[test]
    fn take_pending_drains_in_observation_order() {
        let mut store = StartingStateStore::new();
        store.record_layer_added(creation(1, "parent", None));
        store.record_layer_added(creation(2, "child", Some(1)));
        let (added, removed) = store.take_pending();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].id, LayerId(1));
        assert_eq!(added[1].id, LayerId(2));
        assert!(removed.is_empty(), "no removals were recorded");
        assert!(store.take_pending().0.is_empty(), "drain must be exhaustive");
    }

    #[test]
    #[should_panic(expected = "already tracked")]
    fn double_add_is_a_precondition_violation() {
        let mut store = StartingStateStore::new();
        store.record_layer_added(creation(1, "parent", None));
        store.record_layer_added(creation(1, "parent", None));
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = StartingStateStore::new();
        store.record_layer_added(creation(1, "parent", None));
        store.absorb_evicted_entry(&entry_with_changes(
            1,
            vec![LayerStateChange::new(LayerId(3)).with_z(9)],
        ));
        store.clear();
        assert!(store.is_empty(), "clear must drop all tracked state");
        assert_eq!(store.baseline_len(), 0);
    }
}
