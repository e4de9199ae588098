// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transaction records, in producer-side and entry-side forms.
//!
//! A transaction is an atomic batch of requested state changes submitted by
//! a client process. It is owned by exactly one collection at a time —
//! queued map, committed batch, then serialized entry — and moving between
//! them is a transfer of ownership, never a copy-and-keep.

use alloc::vec::Vec;

use crate::change::{LayerStateChange, PendingLayerChange};

/// A transaction as submitted on the commit path, addressing layers by
/// opaque handle.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionRecord {
    /// Monotonic transaction identity assigned by the client library.
    pub id: u64,
    /// Uid of the submitting process.
    pub uid: i32,
    /// Pid of the submitting process.
    pub pid: i32,
    /// Ordered sequence of partial layer updates.
    pub changes: Vec<PendingLayerChange>,
}

impl TransactionRecord {
    /// Creates a transaction with no changes.
    #[must_use]
    pub fn new(id: u64, uid: i32, pid: i32) -> Self {
        Self {
            id,
            uid,
            pid,
            changes: Vec::new(),
        }
    }

    /// Appends a layer change.
    #[must_use]
    pub fn with_change(mut self, change: PendingLayerChange) -> Self {
        self.changes.push(change);
        self
    }
}

/// A transaction as recorded in a trace entry, with every change target
/// resolved to a stable [`LayerId`](crate::layer::LayerId).
#[derive(Clone, Debug, PartialEq)]
pub struct TracedTransaction {
    /// Monotonic transaction identity.
    pub id: u64,
    /// Uid of the submitting process.
    pub uid: i32,
    /// Pid of the submitting process.
    pub pid: i32,
    /// Resolved layer changes, in submission order.
    pub changes: Vec<LayerStateChange>,
}

impl TracedTransaction {
    /// Creates a resolved transaction with no changes.
    #[must_use]
    pub fn new(id: u64, uid: i32, pid: i32) -> Self {
        Self {
            id,
            uid,
            pid,
            changes: Vec::new(),
        }
    }
}
