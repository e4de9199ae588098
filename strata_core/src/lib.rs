// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core data model and leaf components for compositor transaction tracing.
//!
//! `strata_core` provides the building blocks of a bounded-memory,
//! always-on transaction tracer: the records that describe layer lifecycle
//! and per-frame state changes, a compact wire codec for trace entries, the
//! byte-budgeted trace buffer, and the starting-state store that absorbs
//! evicted history. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! The tracer is a two-stage producer/consumer pipeline. This crate holds
//! the passive pieces; the engine in `strata_tracer` drives them:
//!
//! ```text
//!   commit path ──► queued / committed transactions
//!                           │ flush (one entry per vsync batch)
//!                           ▼
//!                   codec::encode_entry ──► TraceRingBuffer
//!                                               │ eviction
//!                                               ▼
//!                                   StartingStateStore::absorb
//! ```
//!
//! **[`layer`]** — [`LayerId`](layer::LayerId) /
//! [`LayerHandle`](layer::LayerHandle) identity types and creation records.
//!
//! **[`change`]** — [`ChangeMask`](change::ChangeMask) presence bits and
//! partial layer state updates with field-level merge.
//!
//! **[`transaction`]** — producer-side transaction records and the resolved
//! form recorded in entries.
//!
//! **[`entry`]** — [`TraceEntry`](entry::TraceEntry) and
//! [`TraceFile`](entry::TraceFile), the logical output shape.
//!
//! **[`codec`]** — compact little-endian binary encoding of entries, so the
//! buffer's byte budget reflects actual content size.
//!
//! **[`ring`]** — [`TraceRingBuffer`](ring::TraceRingBuffer), a bounded-byte
//! FIFO over opaque serialized entries with an eviction callback.
//!
//! **[`starting_state`]** — the consolidated baseline covering everything
//! evicted from the buffer.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod change;
pub mod codec;
pub mod entry;
pub mod layer;
pub mod ring;
pub mod starting_state;
pub mod transaction;
