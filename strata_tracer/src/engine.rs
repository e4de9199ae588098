// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transaction tracing engine.
//!
//! [`TransactionTracer`] owns the tracer's data stores (the queued map,
//! the committed-batch queue, the bounded trace buffer, and the
//! starting-state store) and the background thread that consolidates
//! committed batches into serialized trace entries.
//!
//! # Locking discipline
//!
//! Two independent critical sections guard disjoint data so the real-time
//! commit path stays cheap:
//!
//! - The **commit-path lock** guards only the committed-batch queue (and
//!   the shutdown flag the worker checks). [`add_committed_transactions`]
//!   holds it just long enough to append; nothing expensive ever runs under
//!   it.
//! - The **trace-maintenance lock** guards the queued map, the handle map,
//!   the trace buffer, and the starting-state store together, because a
//!   flush atomically moves data across all of them. It is held for the
//!   full duration of a flush so no reader can observe an entry as evicted
//!   without its effects already merged into the baseline.
//!
//! [`add_committed_transactions`]: TransactionTracer::add_committed_transactions

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace, warn};

use strata_core::codec;
use strata_core::entry::{TraceEntry, TraceFile, VsyncId};
use strata_core::layer::{LayerCreationRecord, LayerHandle, LayerId};
use strata_core::ring::{EmptyBuffer, TraceRingBuffer};
use strata_core::starting_state::StartingStateStore;
use strata_core::transaction::{TracedTransaction, TransactionRecord};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Byte budget for continuous (always-on) tracing.
pub const DEFAULT_BUFFER_CAPACITY: usize = 512 * 1024;

/// Byte budget for an explicitly requested, high-detail trace session.
pub const ACTIVE_BUFFER_CAPACITY: usize = 5 * 1024 * 1024;

/// How long the background thread sleeps between flush cycles when no
/// commit signal arrives.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a [`TransactionTracer`].
#[derive(Clone, Copy, Debug)]
pub struct TracerConfig {
    /// Byte budget of the bounded trace buffer.
    pub buffer_capacity: usize,
    /// Timer interval for the background thread's autonomous flushes.
    pub flush_interval: Duration,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self::continuous()
    }
}

impl TracerConfig {
    /// Continuous tracing: small budget, suitable for always-on use.
    #[must_use]
    pub const fn continuous() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }

    /// Active tracing: large budget for an explicitly requested session.
    #[must_use]
    pub const fn active() -> Self {
        Self {
            buffer_capacity: ACTIVE_BUFFER_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }

    /// Validates and clamps configuration values.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if self.buffer_capacity == 0 {
            self.buffer_capacity = DEFAULT_BUFFER_CAPACITY;
        }
        if self.flush_interval.is_zero() {
            self.flush_interval = Duration::from_millis(1);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by the tracing engine.
#[derive(Debug, thiserror::Error)]
pub enum TracerError {
    /// The operation requires an enabled tracer.
    #[error("transaction tracer is disabled")]
    Disabled,
    /// The trace buffer holds no entries (legitimate right after enabling).
    #[error(transparent)]
    EmptyBuffer(#[from] EmptyBuffer),
    /// A resident entry failed to decode, which is an internal bug.
    #[error("resident trace entry failed to decode")]
    CorruptEntry,
    /// The background thread could not be spawned.
    #[error("failed to spawn tracer thread")]
    Spawn(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// A committed batch awaiting consolidation, tagged with its vsync.
#[derive(Debug)]
struct CommittedBatch {
    vsync_id: VsyncId,
    transactions: Vec<TransactionRecord>,
}

/// State under the commit-path lock.
#[derive(Debug, Default)]
struct CommitState {
    batches: VecDeque<CommittedBatch>,
    shutdown: bool,
}

/// State under the trace-maintenance lock.
#[derive(Debug)]
struct TraceState {
    /// Transactions queued but not yet flushed, keyed by transaction id.
    queued: HashMap<u64, TransactionRecord>,
    /// Handle-to-id resolution for live layers.
    handles: HashMap<LayerHandle, LayerId>,
    buffer: TraceRingBuffer,
    starting: StartingStateStore,
}

#[derive(Debug)]
struct Shared {
    commit: Mutex<CommitState>,
    commit_signal: Condvar,
    trace: Mutex<TraceState>,
}

// ---------------------------------------------------------------------------
// TransactionTracer
// ---------------------------------------------------------------------------

/// Bounded-memory, always-on tracer for compositor layer transactions.
///
/// Producer operations ([`add_queued_transaction`], friends) are lenient
/// no-ops while the tracer is disabled; they never corrupt state. The only
/// hard failures are programmer errors (double-adding a live layer id),
/// which panic.
///
/// [`add_queued_transaction`]: Self::add_queued_transaction
#[derive(Debug)]
pub struct TransactionTracer {
    config: TracerConfig,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl TransactionTracer {
    /// Creates a disabled tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        let config = config.validated();
        Self {
            config,
            shared: Arc::new(Shared {
                commit: Mutex::new(CommitState::default()),
                commit_signal: Condvar::new(),
                trace: Mutex::new(TraceState {
                    queued: HashMap::new(),
                    handles: HashMap::new(),
                    buffer: TraceRingBuffer::new(config.buffer_capacity),
                    starting: StartingStateStore::new(),
                }),
            }),
            worker: None,
        }
    }

    /// Returns `true` while the background thread is running.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.worker.is_some()
    }

    /// Starts tracing: allocates a fresh buffer budget and spawns the
    /// background consolidation thread. No-op if already enabled.
    ///
    /// Layers observed while the tracer was disabled are not tracked.
    ///
    /// # Errors
    ///
    /// Returns [`TracerError::Spawn`] if the thread cannot be started.
    pub fn enable(&mut self) -> Result<(), TracerError> {
        if self.worker.is_some() {
            return Ok(());
        }
        {
            let mut commit = self.shared.commit.lock();
            commit.shutdown = false;
            commit.batches.clear();
        }
        self.shared
            .trace
            .lock()
            .buffer
            .set_capacity(self.config.buffer_capacity, |_| {});

        let shared = Arc::clone(&self.shared);
        let interval = self.config.flush_interval;
        let handle = thread::Builder::new()
            .name("strata-tracer".into())
            .spawn(move || worker_loop(&shared, interval))?;
        self.worker = Some(handle);
        debug!(
            capacity = self.config.buffer_capacity,
            "transaction tracing enabled"
        );
        Ok(())
    }

    /// Stops tracing: signals the background thread, joins it, then clears
    /// every store. After this returns, all size queries read zero and the
    /// thread is gone. No-op if already disabled.
    pub fn disable(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        {
            let mut commit = self.shared.commit.lock();
            commit.shutdown = true;
        }
        self.shared.commit_signal.notify_all();
        if worker.join().is_err() {
            error!("tracer thread panicked during shutdown");
        }

        let mut commit = self.shared.commit.lock();
        commit.batches.clear();
        commit.shutdown = false;
        drop(commit);

        let mut state = self.shared.trace.lock();
        state.queued.clear();
        state.handles.clear();
        state.buffer.clear();
        state.starting.clear();
        debug!("transaction tracing disabled");
    }

    // -- producer interface ------------------------------------------------

    /// Records a transaction as pending, before it is known to have
    /// committed.
    ///
    /// Transactions that are queued but never committed are retained until
    /// `disable()`; bounding that set is caller discipline, not an engine
    /// invariant.
    pub fn add_queued_transaction(&self, transaction: TransactionRecord) {
        if !self.is_enabled() {
            return;
        }
        let mut state = self.shared.trace.lock();
        state.queued.insert(transaction.id, transaction);
    }

    /// Moves committed transactions into the consolidation queue, tagged
    /// with `vsync_id`, and wakes the background thread.
    ///
    /// Batches for different vsync ids may arrive in any order; entries
    /// preserve arrival order, not numeric vsync order.
    pub fn add_committed_transactions(
        &self,
        transactions: Vec<TransactionRecord>,
        vsync_id: VsyncId,
    ) {
        if !self.is_enabled() {
            return;
        }
        {
            // Only the append happens under the commit-path lock.
            let mut commit = self.shared.commit.lock();
            commit.batches.push_back(CommittedBatch {
                vsync_id,
                transactions,
            });
        }
        self.shared.commit_signal.notify_all();
    }

    /// Records a layer creation observed from the compositor.
    ///
    /// The handle is used purely as an identity token for resolving later
    /// state changes to `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is already tracked as live (caller error).
    pub fn on_layer_added(
        &self,
        handle: LayerHandle,
        id: LayerId,
        name: &str,
        flags: u32,
        parent: Option<LayerId>,
    ) {
        if !self.is_enabled() {
            return;
        }
        let mut state = self.shared.trace.lock();
        state.handles.insert(handle, id);
        state.starting.record_layer_added(LayerCreationRecord {
            id,
            name: name.into(),
            flags,
            parent,
        });
    }

    /// Records a layer removal observed from the compositor.
    ///
    /// The baseline keeps the layer's accumulated state until the entry
    /// carrying this removal is itself evicted, so the resident history
    /// stays replayable.
    pub fn on_layer_removed(&self, id: LayerId) {
        if !self.is_enabled() {
            return;
        }
        let mut state = self.shared.trace.lock();
        state.handles.retain(|_, layer| *layer != id);
        state.starting.record_layer_removed(id);
    }

    // -- control interface -------------------------------------------------

    /// Synchronously consolidates every committed batch in arrival order.
    ///
    /// `vsync_id` names the batch the caller wants flushed; all batches
    /// queued before it are drained with it, which is also what the
    /// background thread does on its own schedule. Safe to call from tests
    /// for deterministic behavior. No-op while disabled.
    pub fn flush(&self, vsync_id: VsyncId) {
        if !self.is_enabled() {
            return;
        }
        let batches: Vec<CommittedBatch> = {
            let mut commit = self.shared.commit.lock();
            commit.batches.drain(..).collect()
        };
        trace!(
            vsync_id = vsync_id.0,
            batches = batches.len(),
            "synchronous flush"
        );
        consolidate(&self.shared, batches);
    }

    /// Changes the trace buffer's byte budget. Shrinking evicts oldest
    /// entries into the baseline, exactly as capacity pressure would.
    pub fn set_buffer_capacity(&mut self, bytes: usize) {
        self.config.buffer_capacity = bytes;
        if !self.is_enabled() {
            return;
        }
        let mut state = self.shared.trace.lock();
        let TraceState {
            buffer, starting, ..
        } = &mut *state;
        buffer.set_capacity(bytes, |evicted| absorb(starting, &evicted));
    }

    // -- output interface --------------------------------------------------

    /// Produces the full trace: the synthetic baseline entry first,
    /// followed by every resident entry oldest-first.
    ///
    /// Idempotent and side-effect-free; repeated calls with no intervening
    /// mutation yield identical output. Returns an empty file while
    /// disabled.
    #[must_use]
    pub fn serialize(&self) -> TraceFile {
        if !self.is_enabled() {
            return TraceFile::default();
        }
        let state = self.shared.trace.lock();
        let mut file = TraceFile::default();
        file.entries.push(state.starting.build_baseline_entry());
        for bytes in state.buffer.iter() {
            match codec::decode_entry(bytes) {
                Some(entry) => file.entries.push(entry),
                None => error!("resident entry failed to decode; skipping"),
            }
        }
        file
    }

    // -- diagnostics -------------------------------------------------------

    /// Number of transactions queued but not yet flushed.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.shared.trace.lock().queued.len()
    }

    /// Number of committed batches awaiting consolidation.
    #[must_use]
    pub fn committed_len(&self) -> usize {
        self.shared.commit.lock().batches.len()
    }

    /// Serialized size of all buffer-resident entries.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.shared.trace.lock().buffer.used()
    }

    /// Number of layers with accumulated baseline state.
    #[must_use]
    pub fn baseline_len(&self) -> usize {
        self.shared.trace.lock().starting.baseline_len()
    }

    /// Vsync id of the oldest buffer-resident entry.
    ///
    /// # Errors
    ///
    /// [`TracerError::Disabled`] while disabled, [`TracerError::EmptyBuffer`]
    /// when nothing is resident, [`TracerError::CorruptEntry`] if the front
    /// entry fails to decode (an internal bug).
    pub fn front_vsync_id(&self) -> Result<VsyncId, TracerError> {
        if !self.is_enabled() {
            return Err(TracerError::Disabled);
        }
        let state = self.shared.trace.lock();
        let bytes = state.buffer.front()?;
        codec::decode_vsync_id(bytes).ok_or(TracerError::CorruptEntry)
    }
}

impl Drop for TransactionTracer {
    fn drop(&mut self) {
        // Guarantee the worker is joined before the stores are torn down.
        self.disable();
    }
}

// ---------------------------------------------------------------------------
// Consolidation
// ---------------------------------------------------------------------------

/// Merges one evicted entry into the baseline, synchronously with its
/// eviction.
fn absorb(starting: &mut StartingStateStore, evicted: &[u8]) {
    match codec::decode_entry(evicted) {
        Some(entry) => {
            trace!(vsync_id = entry.vsync_id.0, "absorbing evicted entry");
            starting.absorb_evicted_entry(&entry);
        }
        None => error!("evicted entry failed to decode; its history is lost"),
    }
}

/// Builds and pushes one trace entry per committed batch, in arrival order,
/// holding the trace-maintenance lock for the whole move.
fn consolidate(shared: &Shared, batches: Vec<CommittedBatch>) {
    if batches.is_empty() {
        return;
    }
    let mut state = shared.trace.lock();
    let TraceState {
        queued,
        handles,
        buffer,
        starting,
    } = &mut *state;

    for batch in batches {
        let mut entry = TraceEntry::new(batch.vsync_id);
        for tx in batch.transactions {
            // Prefer the record captured at queue time; a commit without a
            // matching queue call still gets traced from the committed copy.
            let record = match queued.remove(&tx.id) {
                Some(queued_tx) => queued_tx,
                None => {
                    warn!(tx_id = tx.id, "transaction committed without being queued");
                    tx
                }
            };
            let mut traced = TracedTransaction::new(record.id, record.uid, record.pid);
            for change in &record.changes {
                match handles.get(&change.handle) {
                    Some(&layer) => traced.changes.push(change.resolved(layer)),
                    None => warn!(
                        handle = change.handle.0,
                        "dropping change for unknown layer handle"
                    ),
                }
            }
            entry.transactions.push(traced);
        }
        let (added, removed) = starting.take_pending();
        entry.added_layers = added;
        entry.removed_layers = removed;

        let bytes = codec::encode_entry(&entry);
        debug!(
            vsync_id = entry.vsync_id.0,
            bytes = bytes.len(),
            "flushing trace entry"
        );
        buffer.push(bytes, |evicted| absorb(starting, &evicted));
    }
}

// ---------------------------------------------------------------------------
// Background thread
// ---------------------------------------------------------------------------

/// Drains committed batches until shutdown, waking on the commit signal or
/// on the flush-interval timer.
fn worker_loop(shared: &Shared, interval: Duration) {
    let mut commit = shared.commit.lock();
    loop {
        if commit.shutdown {
            break;
        }
        if commit.batches.is_empty() {
            let _ = shared.commit_signal.wait_for(&mut commit, interval);
            if commit.shutdown {
                break;
            }
        }
        let batches: Vec<CommittedBatch> = commit.batches.drain(..).collect();
        drop(commit);
        consolidate(shared, batches);
        commit = shared.commit.lock();
    }
}
