// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Always-on transaction tracing engine for a display compositor.
//!
//! [`TransactionTracer`](engine::TransactionTracer) records a rolling,
//! byte-bounded history of the state-change transactions applied to
//! on-screen layers, so a recent window of compositor state can be dumped
//! after a crash or on demand without unbounded memory growth and without
//! stalling the commit path.
//!
//! The engine is a two-stage producer/consumer pipeline:
//!
//! 1. The compositor's commit path queues transactions and commits them
//!    tagged with a vsync id (short critical sections only).
//! 2. A background thread drains committed batches, serializes each vsync's
//!    batch into one trace entry, and pushes it into the bounded buffer.
//!    Every entry the buffer evicts is merged into the starting-state
//!    baseline, so replaying baseline + resident entries always yields a
//!    complete snapshot of every live layer.
//!
//! Eviction *is* the backpressure mechanism: capacity pressure consolidates
//! the oldest history instead of failing, and never corrupts newer data.

pub mod engine;

pub use engine::{
    ACTIVE_BUFFER_CAPACITY, DEFAULT_BUFFER_CAPACITY, DEFAULT_FLUSH_INTERVAL, TracerConfig,
    TracerError, TransactionTracer,
};
