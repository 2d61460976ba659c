// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequence number allocation for guardians

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Allocates the sequence numbers that place guardians in a total order.
///
/// Clones share the underlying counter, so every guardian minted from the
/// same counter (or any clone of it) receives a distinct, monotonically
/// increasing number. Construct one per process and pass it wherever
/// guardians are created; isolated test runs construct their own.
#[derive(Clone, Debug)]
pub struct SequenceCounter {
    counter: Arc<AtomicU64>,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate the next sequence number.
    ///
    /// Numbers are never reused. The sequence space is not expected to be
    /// exhaustible within a process lifetime; if it ever is, this fails fast
    /// rather than wrapping, since a wrapped counter would hand out
    /// duplicate numbers and break the total order.
    pub fn next(&self) -> u64 {
        let sequence = self.counter.fetch_add(1, Ordering::SeqCst);
        assert!(sequence != u64::MAX, "guardian sequence space exhausted");
        sequence
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;
