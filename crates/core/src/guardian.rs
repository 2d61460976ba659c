// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardian handles for lockable resources
//!
//! A guardian is an opaque token protecting one mutually-exclusive resource.
//! It exposes identity, a total order, and nothing else; the lock itself is
//! only reachable through the executor, which is what keeps every
//! acquisition on the ordered path.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LockResult, Mutex, MutexGuard, TryLockResult};

use crate::sequence::SequenceCounter;

/// A totally-ordered handle over one exclusive, non-reentrant lock.
///
/// Cloning yields another handle to the same logical guardian; create one
/// guardian per protected resource and keep it for the resource's lifetime.
/// Equality is reference identity: two handles are equal only if they point
/// at the same underlying guardian.
#[derive(Clone, Debug)]
pub struct Guardian {
    inner: Arc<GuardianInner>,
}

#[derive(Debug)]
struct GuardianInner {
    sequence: u64,
    lock: Mutex<()>,
}

impl Guardian {
    /// Mint a new guardian carrying the counter's next sequence number.
    pub fn new(counter: &SequenceCounter) -> Self {
        Self {
            inner: Arc::new(GuardianInner {
                sequence: counter.next(),
                lock: Mutex::new(()),
            }),
        }
    }

    /// The sequence number assigned at construction.
    pub fn sequence(&self) -> u64 {
        self.inner.sequence
    }

    /// Total order over guardians, used to fix lock-acquisition order.
    ///
    /// Guardians minted from one counter never tie; a tie can only come from
    /// mixing unrelated counters in a single request, which the executor
    /// rejects.
    pub fn order(&self, other: &Guardian) -> Ordering {
        self.inner.sequence.cmp(&other.inner.sequence)
    }

    /// Whether two handles refer to the same underlying guardian.
    pub fn same(&self, other: &Guardian) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Block until the guardian's lock is held.
    ///
    /// Crate-internal: locking a guardian outside the executor would bypass
    /// the ordering discipline.
    pub(crate) fn acquire(&self) -> LockResult<MutexGuard<'_, ()>> {
        self.inner.lock.lock()
    }

    /// Non-blocking acquisition attempt, for the bounded executor path.
    pub(crate) fn try_acquire(&self) -> TryLockResult<MutexGuard<'_, ()>> {
        self.inner.lock.try_lock()
    }
}

impl PartialEq for Guardian {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Guardian {}

impl Hash for Guardian {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.sequence.hash(state);
    }
}

impl fmt::Display for Guardian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guardian {}", self.inner.sequence)
    }
}

#[cfg(test)]
#[path = "guardian_tests.rs"]
mod tests;
