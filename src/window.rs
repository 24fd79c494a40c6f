//! Sample Window
//!
//! Bounded, newest-first history of polling-cycle snapshots. Rate derivation
//! compares the newest snapshot against the one at index `retention - 1`, so
//! `oldest()` only exists once the window has filled — the documented rate
//! formula assumes a full window's worth of elapsed time.

use std::collections::VecDeque;

use crate::types::{Sample, SnapshotSet};

/// Fixed-capacity ring of the most recent cycle snapshots
pub struct SampleWindow {
    /// Front is the newest cycle
    entries: VecDeque<SnapshotSet>,

    /// Capacity in cycles
    retention: usize,
}

impl SampleWindow {
    pub fn new(retention: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(retention),
            retention,
        }
    }

    /// Capacity in cycles
    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Prepend a cycle's snapshot, evicting beyond capacity
    ///
    /// Empty and partial snapshots are pushed like any other; a cycle always
    /// costs exactly one slot.
    pub fn push(&mut self, snapshot: SnapshotSet) {
        self.entries.push_front(snapshot);
        while self.entries.len() > self.retention {
            self.entries.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `retention` snapshots have been pushed at least once
    pub fn is_full(&self) -> bool {
        self.entries.len() == self.retention
    }

    /// The current cycle's snapshot
    pub fn newest(&self) -> Option<&SnapshotSet> {
        self.entries.front()
    }

    /// The snapshot at index `retention - 1`, only once the window is full
    ///
    /// Callers must gate rate derivation on this returning `Some`; computing
    /// a rate over a shorter history would need a different denominator than
    /// the nominal full-window elapsed time.
    pub fn oldest(&self) -> Option<&SnapshotSet> {
        if self.is_full() {
            self.entries.get(self.retention - 1)
        } else {
            None
        }
    }

    /// Look up one endpoint's sample within a given snapshot
    ///
    /// Absent when that node did not answer in that cycle.
    pub fn find<'a>(endpoint: &str, snapshot: &'a SnapshotSet) -> Option<&'a Sample> {
        snapshot.get(endpoint)
    }
}
