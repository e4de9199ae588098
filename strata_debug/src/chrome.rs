// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] writes a [`TraceFile`](strata_core::entry::TraceFile) as
//! [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Entries carry no wall-clock timestamps, only vsync ids, so the vsync id
//! is used directly as the microsecond timestamp axis. The baseline entry
//! is pinned at timestamp zero.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use strata_core::change::ChangeMask;
use strata_core::entry::TraceFile;

/// Exports a trace file as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(file: &TraceFile, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for entry in &file.entries {
        let ts = if entry.is_baseline() { 0 } else { entry.vsync_id.0 };
        let cat = if entry.is_baseline() { "Baseline" } else { "Entry" };

        for layer in &entry.added_layers {
            events.push(json!({
                "ph": "i",
                "name": "LayerAdded",
                "cat": cat,
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "layer": layer.id.0,
                    "layer_name": layer.name,
                    "flags": layer.flags,
                    "parent": layer.parent.map(|p| p.0),
                }
            }));
        }
        for layer in &entry.removed_layers {
            events.push(json!({
                "ph": "i",
                "name": "LayerRemoved",
                "cat": cat,
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "layer": layer.0,
                }
            }));
        }
        for tx in &entry.transactions {
            for change in &tx.changes {
                let mut args = json!({
                    "tx_id": tx.id,
                    "layer": change.layer.0,
                    "what": format!("{:?}", change.what),
                });
                if change.what.contains(ChangeMask::Z) {
                    args["z"] = json!(change.z);
                }
                if change.what.contains(ChangeMask::POSITION) {
                    args["x"] = json!(change.position.x);
                    args["y"] = json!(change.position.y);
                }
                if change.what.contains(ChangeMask::ALPHA) {
                    args["alpha"] = json!(change.alpha);
                }
                events.push(json!({
                    "ph": "i",
                    "name": "LayerChange",
                    "cat": cat,
                    "ts": ts,
                    "pid": tx.pid,
                    "tid": tx.uid,
                    "s": "t",
                    "args": args,
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::change::LayerStateChange;
    use strata_core::entry::{BASELINE_VSYNC_ID, TraceEntry, VsyncId};
    use strata_core::layer::{LayerCreationRecord, LayerId};
    use strata_core::transaction::TracedTransaction;

    #[test]
    fn export_produces_valid_json() {
        let mut baseline = TraceEntry::new(BASELINE_VSYNC_ID);
        baseline.added_layers.push(LayerCreationRecord {
            id: LayerId(1),
            name: "wallpaper".into(),
            flags: 0,
            parent: None,
        });

        let mut entry = TraceEntry::new(VsyncId(12));
        let mut tx = TracedTransaction::new(4, 10, 20);
        tx.changes.push(LayerStateChange::new(LayerId(1)).with_z(2));
        entry.transactions.push(tx);

        let file = TraceFile {
            entries: vec![baseline, entry],
        };
        let mut out = Vec::new();
        export(&file, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);

        assert_eq!(parsed[0]["name"], "LayerAdded");
        assert_eq!(parsed[0]["cat"], "Baseline");
        assert_eq!(parsed[0]["ts"], 0);

        assert_eq!(parsed[1]["name"], "LayerChange");
        assert_eq!(parsed[1]["ts"], 12);
        assert_eq!(parsed[1]["args"]["z"], 2);
        assert!(parsed[1]["args"].get("alpha").is_none());
    }

    #[test]
    fn export_empty_trace() {
        let mut out = Vec::new();
        export(&TraceFile::default(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }
}
