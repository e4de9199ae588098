// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Byte-budgeted FIFO of serialized trace entries.
//!
//! [`TraceRingBuffer`] holds opaque serialized entries and enforces a byte
//! budget by evicting oldest-first. Every eviction hands the evicted bytes
//! to a caller-supplied callback *before* the memory is released, so the
//! owner can consolidate the entry's effects elsewhere. The buffer itself
//! knows nothing about entry contents.
//!
//! Capacity policy: an entry larger than the whole budget empties the
//! buffer and is still accepted — the newest data always wins over history.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// Recoverable error for reads from an empty buffer.
///
/// Distinct from precondition violations: an empty buffer is a legitimate
/// state right after enabling or disabling tracing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("trace buffer is empty")]
pub struct EmptyBuffer;

/// A bounded-byte FIFO over opaque serialized entries.
#[derive(Debug)]
pub struct TraceRingBuffer {
    entries: VecDeque<Vec<u8>>,
    used: usize,
    capacity: usize,
}

impl TraceRingBuffer {
    /// Creates an empty buffer with the given byte budget.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            used: 0,
            capacity,
        }
    }

    /// Returns the configured byte budget.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the serialized size of all resident entries.
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Returns the number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entry is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends one serialized entry, evicting oldest entries until it fits.
    ///
    /// Each evicted entry is passed to `on_evict` synchronously with its
    /// eviction, exactly once, before the push completes.
    pub fn push(&mut self, entry: Vec<u8>, mut on_evict: impl FnMut(Vec<u8>)) {
        while !self.entries.is_empty() && self.used + entry.len() > self.capacity {
            self.evict_front(&mut on_evict);
        }
        self.used += entry.len();
        self.entries.push_back(entry);
        self.check_used();
    }

    /// Returns the oldest resident entry without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyBuffer`] if no entry is resident.
    pub fn front(&self) -> Result<&[u8], EmptyBuffer> {
        self.entries.front().map(Vec::as_slice).ok_or(EmptyBuffer)
    }

    /// Changes the byte budget, evicting (with callback) until the resident
    /// set fits the new budget.
    pub fn set_capacity(&mut self, capacity: usize, mut on_evict: impl FnMut(Vec<u8>)) {
        self.capacity = capacity;
        while self.used > self.capacity && !self.entries.is_empty() {
            self.evict_front(&mut on_evict);
        }
        self.check_used();
    }

    /// Drops every resident entry *without* invoking any consolidation
    /// callback. Only meaningful on full teardown, where the whole trace is
    /// being discarded.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.used = 0;
    }

    /// Ordered read-only view of all resident entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(Vec::as_slice)
    }

    fn evict_front(&mut self, on_evict: &mut impl FnMut(Vec<u8>)) {
        if let Some(evicted) = self.entries.pop_front() {
            self.used -= evicted.len();
            on_evict(evicted);
        }
    }

    fn check_used(&self) {
        debug_assert_eq!(
            self.used,
            self.entries.iter().map(Vec::len).sum::<usize>(),
            "used-bytes counter out of sync with resident entries"
        );
    }
}
