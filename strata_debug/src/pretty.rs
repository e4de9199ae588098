// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`print`] writes one line per entry, transaction, and layer event to a
//! [`Write`](std::io::Write) destination. Fields that a change does not
//! carry are omitted from its line.

use std::io::{self, Write};

use strata_core::change::{ChangeMask, LayerStateChange};
use strata_core::entry::{TraceEntry, TraceFile};

/// Writes a whole trace file as human-readable lines.
///
/// The baseline entry (if it carries anything) is printed first as
/// `[baseline]`, followed by one `[entry]` block per resident entry.
pub fn print(file: &TraceFile, writer: &mut dyn Write) -> io::Result<()> {
    for entry in &file.entries {
        print_entry(entry, writer)?;
    }
    Ok(())
}

fn print_entry(entry: &TraceEntry, writer: &mut dyn Write) -> io::Result<()> {
    if entry.is_baseline() {
        writeln!(
            writer,
            "[baseline] layers={} txs={}",
            entry.added_layers.len(),
            entry.transactions.len(),
        )?;
    } else {
        writeln!(
            writer,
            "[entry] vsync={} txs={}",
            entry.vsync_id.0,
            entry.transactions.len(),
        )?;
    }
    for layer in &entry.added_layers {
        match layer.parent {
            Some(parent) => writeln!(
                writer,
                "  [layer:add] id={} name={:?} flags={} parent={}",
                layer.id.0, layer.name, layer.flags, parent.0,
            )?,
            None => writeln!(
                writer,
                "  [layer:add] id={} name={:?} flags={}",
                layer.id.0, layer.name, layer.flags,
            )?,
        }
    }
    for layer in &entry.removed_layers {
        writeln!(writer, "  [layer:remove] id={}", layer.0)?;
    }
    for tx in &entry.transactions {
        writeln!(
            writer,
            "  [tx] id={} uid={} pid={} changes={}",
            tx.id,
            tx.uid,
            tx.pid,
            tx.changes.len(),
        )?;
        for change in &tx.changes {
            print_change(change, writer)?;
        }
    }
    Ok(())
}

fn print_change(change: &LayerStateChange, writer: &mut dyn Write) -> io::Result<()> {
    write!(writer, "    layer={}", change.layer.0)?;
    if change.what.contains(ChangeMask::Z) {
        write!(writer, " z={}", change.z)?;
    }
    if change.what.contains(ChangeMask::POSITION) {
        write!(
            writer,
            " pos=({:.1},{:.1})",
            change.position.x, change.position.y,
        )?;
    }
    if change.what.contains(ChangeMask::ALPHA) {
        write!(writer, " alpha={:.3}", change.alpha)?;
    }
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use strata_core::entry::VsyncId;
    use strata_core::layer::{LayerCreationRecord, LayerId};
    use strata_core::transaction::TracedTransaction;

    #[test]
    fn prints_entry_with_layers_and_changes() {
        let mut entry = TraceEntry::new(VsyncId(7));
        entry.added_layers.push(LayerCreationRecord {
            id: LayerId(1),
            name: "status-bar".into(),
            flags: 4,
            parent: None,
        });
        let mut tx = TracedTransaction::new(9, 100, 200);
        tx.changes.push(
            LayerStateChange::new(LayerId(1))
                .with_z(3)
                .with_position(Point::new(10.0, 20.0)),
        );
        entry.transactions.push(tx);

        let file = TraceFile {
            entries: vec![entry],
        };
        let mut out = Vec::new();
        print(&file, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("[entry] vsync=7"), "got: {text}");
        assert!(text.contains("[layer:add] id=1"), "got: {text}");
        assert!(text.contains("z=3"), "got: {text}");
        assert!(text.contains("pos=(10.0,20.0)"), "got: {text}");
        assert!(!text.contains("alpha="), "unset field printed: {text}");
    }

    #[test]
    fn prints_baseline_header() {
        let entry = TraceEntry::new(strata_core::entry::BASELINE_VSYNC_ID);
        let file = TraceFile {
            entries: vec![entry],
        };
        let mut out = Vec::new();
        print(&file, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[baseline]"), "got: {text}");
    }
}
