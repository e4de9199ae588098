// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and Chrome trace export for strata transaction traces.
//!
//! This crate turns a serialized [`TraceFile`](strata_core::entry::TraceFile)
//! into things humans and tools can read:
//!
//! - [`pretty::print`] — human-readable one-line-per-transaction output.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON for loading
//!   into `chrome://tracing` or Perfetto.

pub mod chrome;
pub mod pretty;
