// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary encoding of trace entries.
//!
//! Entries live in the bounded trace buffer in serialized form so that the
//! byte budget reflects actual content size. The format is fixed-width
//! little-endian: strings are `u32` length-prefixed UTF-8, options carry a
//! presence byte, and change fields are written only when flagged in the
//! [`ChangeMask`], so an entry's size tracks what it actually carries.
//!
//! [`decode_entry`] reads the bytes back; it returns `None` on truncated or
//! malformed input instead of panicking, mirroring how unknown data stops
//! iteration rather than tearing down the tracer.

use alloc::string::String;
use alloc::vec::Vec;

use crate::change::{ChangeMask, LayerStateChange};
use crate::entry::{TraceEntry, TraceFile, VsyncId};
use crate::layer::{LayerCreationRecord, LayerId};
use crate::transaction::TracedTransaction;

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "collection and string lengths are capped at u32::MAX on the wire"
    )]
    fn write_len(&mut self, len: usize) {
        self.write_u32(len.min(u32::MAX as usize) as u32);
    }

    fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn write_option_layer_id(&mut self, v: Option<LayerId>) {
        match v {
            Some(id) => {
                self.write_u8(1);
                self.write_i32(id.0);
            }
            None => {
                self.write_u8(0);
                self.write_i32(0);
            }
        }
    }

    fn write_change(&mut self, change: &LayerStateChange) {
        self.write_i32(change.layer.0);
        self.write_u32(change.what.bits());
        if change.what.contains(ChangeMask::Z) {
            self.write_i32(change.z);
        }
        if change.what.contains(ChangeMask::POSITION) {
            self.write_f64(change.position.x);
            self.write_f64(change.position.y);
        }
        if change.what.contains(ChangeMask::ALPHA) {
            self.write_f32(change.alpha);
        }
    }

    fn write_transaction(&mut self, tx: &TracedTransaction) {
        self.write_u64(tx.id);
        self.write_i32(tx.uid);
        self.write_i32(tx.pid);
        self.write_len(tx.changes.len());
        for change in &tx.changes {
            self.write_change(change);
        }
    }

    fn write_creation(&mut self, record: &LayerCreationRecord) {
        self.write_i32(record.id.0);
        self.write_str(&record.name);
        self.write_u32(record.flags);
        self.write_option_layer_id(record.parent);
    }
}

/// Encodes one trace entry into its wire form.
#[must_use]
pub fn encode_entry(entry: &TraceEntry) -> Vec<u8> {
    let mut enc = Encoder::default();
    enc.write_i64(entry.vsync_id.0);
    enc.write_len(entry.transactions.len());
    for tx in &entry.transactions {
        enc.write_transaction(tx);
    }
    enc.write_len(entry.added_layers.len());
    for record in &entry.added_layers {
        enc.write_creation(record);
    }
    enc.write_len(entry.removed_layers.len());
    for id in &entry.removed_layers {
        enc.write_i32(id.0);
    }
    enc.buf
}

/// Encodes a full trace file with per-entry length framing.
#[must_use]
pub fn encode_file(file: &TraceFile) -> Vec<u8> {
    let mut enc = Encoder::default();
    enc.write_len(file.entries.len());
    for entry in &file.entries {
        let bytes = encode_entry(entry);
        enc.write_len(bytes.len());
        enc.buf.extend_from_slice(&bytes);
    }
    enc.buf
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        let bytes = self.read_bytes(8)?;
        Some(u64::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_i32(&mut self) -> Option<i32> {
        let bytes = self.read_bytes(4)?;
        Some(i32::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_i64(&mut self) -> Option<i64> {
        let bytes = self.read_bytes(8)?;
        Some(i64::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_f32(&mut self) -> Option<f32> {
        let bytes = self.read_bytes(4)?;
        Some(f32::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_f64(&mut self) -> Option<f64> {
        let bytes = self.read_bytes(8)?;
        Some(f64::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_len(&mut self) -> Option<usize> {
        self.read_u32().map(|v| v as usize)
    }

    fn read_str(&mut self) -> Option<String> {
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn read_option_layer_id(&mut self) -> Option<Option<LayerId>> {
        let present = self.read_u8()?;
        let raw = self.read_i32()?;
        Some((present != 0).then_some(LayerId(raw)))
    }

    fn read_change(&mut self) -> Option<LayerStateChange> {
        let layer = LayerId(self.read_i32()?);
        let what = ChangeMask::from_bits(self.read_u32()?);
        let mut change = LayerStateChange::new(layer);
        change.what = what;
        if what.contains(ChangeMask::Z) {
            change.z = self.read_i32()?;
        }
        if what.contains(ChangeMask::POSITION) {
            let x = self.read_f64()?;
            let y = self.read_f64()?;
            change.position = kurbo::Point::new(x, y);
        }
        if what.contains(ChangeMask::ALPHA) {
            change.alpha = self.read_f32()?;
        }
        Some(change)
    }

    fn read_transaction(&mut self) -> Option<TracedTransaction> {
        let id = self.read_u64()?;
        let uid = self.read_i32()?;
        let pid = self.read_i32()?;
        let mut tx = TracedTransaction::new(id, uid, pid);
        let count = self.read_len()?;
        for _ in 0..count {
            tx.changes.push(self.read_change()?);
        }
        Some(tx)
    }

    fn read_creation(&mut self) -> Option<LayerCreationRecord> {
        Some(LayerCreationRecord {
            id: LayerId(self.read_i32()?),
            name: self.read_str()?,
            flags: self.read_u32()?,
            parent: self.read_option_layer_id()?,
        })
    }

    fn read_entry(&mut self) -> Option<TraceEntry> {
        let mut entry = TraceEntry::new(VsyncId(self.read_i64()?));
        let tx_count = self.read_len()?;
        for _ in 0..tx_count {
            entry.transactions.push(self.read_transaction()?);
        }
        let added_count = self.read_len()?;
        for _ in 0..added_count {
            entry.added_layers.push(self.read_creation()?);
        }
        let removed_count = self.read_len()?;
        for _ in 0..removed_count {
            entry.removed_layers.push(LayerId(self.read_i32()?));
        }
        Some(entry)
    }
}

/// Decodes one trace entry, or `None` if the bytes are truncated or
/// malformed.
#[must_use]
pub fn decode_entry(bytes: &[u8]) -> Option<TraceEntry> {
    Decoder::new(bytes).read_entry()
}

/// Decodes only the vsync id from an encoded entry.
///
/// Cheap peek for callers that need ordering information without paying for
/// a full decode.
#[must_use]
pub fn decode_vsync_id(bytes: &[u8]) -> Option<VsyncId> {
    Decoder::new(bytes).read_i64().map(VsyncId)
}

/// Decodes a full trace file produced by [`encode_file`].
#[must_use]
pub fn decode_file(bytes: &[u8]) -> Option<TraceFile> {
    let mut dec = Decoder::new(bytes);
    let count = dec.read_len()?;
    let mut file = TraceFile::default();
    for _ in 0..count {
        let len = dec.read_len()?;
        let entry_bytes = dec.read_bytes(len)?;
        file.entries.push(decode_entry(entry_bytes)?);
    }
    Some(file)
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use kurbo::Point;

    use super::*;
    use crate::change::LayerStateChange;
    use crate::entry::BASELINE_VSYNC_ID;

    fn sample_entry() -> TraceEntry {
        let mut entry = TraceEntry::new(VsyncId(42));
        let mut tx = TracedTransaction::new(50, 1, 2);
        tx.changes.push(LayerStateChange::new(LayerId(1)).with_z(42));
        tx.changes.push(
            LayerStateChange::new(LayerId(2))
                .with_position(Point::new(22.0, -7.5))
                .with_alpha(0.5),
        );
        entry.transactions.push(tx);
        entry.added_layers.push(LayerCreationRecord {
            id: LayerId(2),
            name: "child".to_string(),
            flags: 456,
            parent: Some(LayerId(1)),
        });
        entry.removed_layers.push(LayerId(3));
        entry
    }

    #[test]
    fn entry_round_trip() {
        let entry = sample_entry();
        let bytes = encode_entry(&entry);
        let decoded = decode_entry(&bytes).expect("entry must decode");
        assert_eq!(decoded, entry);
    }

    #[test]
    fn vsync_peek_matches_full_decode() {
        let bytes = encode_entry(&sample_entry());
        assert_eq!(decode_vsync_id(&bytes), Some(VsyncId(42)));
    }

    #[test]
    fn unflagged_fields_are_not_on_the_wire() {
        let mut small = TraceEntry::new(VsyncId(1));
        small
            .transactions
            .push(TracedTransaction::new(1, 0, 0));
        let mut large = small.clone();
        large.transactions[0]
            .changes
            .push(LayerStateChange::new(LayerId(1)).with_z(1));

        let small_bytes = encode_entry(&small);
        let large_bytes = encode_entry(&large);
        // One change header (layer + mask) plus one flagged i32.
        assert_eq!(large_bytes.len(), small_bytes.len() + 4 + 4 + 4);
    }

    #[test]
    fn truncated_input_decodes_to_none() {
        let bytes = encode_entry(&sample_entry());
        for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
            assert!(decode_entry(&bytes[..cut]).is_none(), "cut at {cut} must fail");
        }
    }

    #[test]
    fn file_round_trip_preserves_entry_order() {
        let baseline = TraceEntry::new(BASELINE_VSYNC_ID);
        let file = TraceFile {
            entries: vec![baseline, sample_entry(), TraceEntry::new(VsyncId(43))],
        };
        let decoded = decode_file(&encode_file(&file)).expect("file must decode");
        assert_eq!(decoded, file);
        assert!(decoded.entries[0].is_baseline(), "entry 0 must stay the baseline");
    }
}
