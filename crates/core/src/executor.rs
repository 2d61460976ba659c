// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered acquisition of guardian sets
//!
//! Every call sorts its requested guardians into the global sequence order
//! before touching any lock, so two concurrent calls always request their
//! shared guardians in the same relative order. That removes circular wait,
//! which is what makes deadlock between calls made through this executor
//! structurally impossible.

use std::cmp::Ordering;
use std::sync::{MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::guardian::Guardian;
use crate::trace::{NullTrace, TraceEvent, TraceSink};

/// Error type produced by a work item.
pub type WorkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// How long a bounded run pauses before retrying a contended set.
const CONTENTION_PAUSE: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The work item ran and failed. Every lock was released before this
    /// surfaced.
    #[error("work item failed: {0}")]
    Work(#[source] WorkError),
    /// A guardian's lock was poisoned by a panicked holder. Locks acquired
    /// before the failure were released in reverse order.
    #[error("guardian {sequence} is poisoned")]
    Poisoned { sequence: u64 },
    /// The same guardian (or two guardians sharing a sequence number) was
    /// requested more than once in a single call. Rejected before any
    /// acquisition: the lock is non-reentrant, so acquiring it twice would
    /// self-deadlock, and silently deduplicating would mask the caller bug.
    #[error("guardian {sequence} requested more than once")]
    Duplicate { sequence: u64 },
    /// A bounded run could not acquire the full set before its deadline.
    /// Partially-acquired locks were released before each retry and before
    /// this surfaced.
    #[error("timed out after {timeout:?} waiting for guardian {sequence}")]
    Timeout { sequence: u64, timeout: Duration },
}

/// Runs work items under dynamically-chosen sets of guardians.
///
/// The executor holds no state beyond its trace sink; it borrows guardians
/// for the duration of a call and never owns them. Clone it freely across
/// threads.
#[derive(Clone)]
pub struct OrderedExecutor<T: TraceSink = NullTrace> {
    trace: T,
}

impl OrderedExecutor<NullTrace> {
    pub fn new() -> Self {
        Self { trace: NullTrace }
    }
}

impl Default for OrderedExecutor<NullTrace> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TraceSink> OrderedExecutor<T> {
    /// Replace the trace sink, keeping everything else.
    pub fn with_trace<S: TraceSink>(self, trace: S) -> OrderedExecutor<S> {
        OrderedExecutor { trace }
    }

    /// Acquire every guardian in `guardians` in global order, run `work`,
    /// then release in exact reverse order.
    ///
    /// Blocks indefinitely on contended guardians. An empty set runs `work`
    /// immediately with nothing held. The caller's slice is copied before
    /// sorting and never reordered.
    pub fn run_with_locks<W>(&self, guardians: &[Guardian], work: W) -> Result<(), ExecuteError>
    where
        W: FnOnce() -> Result<(), WorkError>,
    {
        let ordered = self.ordered(guardians)?;
        let mut held = Held::new(&self.trace);
        for guardian in ordered {
            self.trace.record(TraceEvent::Acquiring {
                sequence: guardian.sequence(),
            });
            let guard = guardian.acquire().map_err(|_| ExecuteError::Poisoned {
                sequence: guardian.sequence(),
            })?;
            held.push(guardian.sequence(), guard);
            self.trace.record(TraceEvent::Acquired {
                sequence: guardian.sequence(),
            });
        }
        self.trace.record(TraceEvent::Executing);
        work().map_err(ExecuteError::Work)
    }

    /// Bounded variant of [`run_with_locks`](Self::run_with_locks).
    ///
    /// Attempts the whole sorted set without blocking. On a contended
    /// guardian it releases everything already held, in reverse order, then
    /// pauses and retries until `timeout` has elapsed. The all-or-nothing
    /// contract is unchanged: `work` runs once iff the full set was held.
    pub fn try_run_with_locks<W>(
        &self,
        guardians: &[Guardian],
        timeout: Duration,
        work: W,
    ) -> Result<(), ExecuteError>
    where
        W: FnOnce() -> Result<(), WorkError>,
    {
        let ordered = self.ordered(guardians)?;
        let deadline = Instant::now() + timeout;
        let held = loop {
            let mut held = Held::new(&self.trace);
            let mut contended = None;
            for guardian in &ordered {
                self.trace.record(TraceEvent::Acquiring {
                    sequence: guardian.sequence(),
                });
                match guardian.try_acquire() {
                    Ok(guard) => {
                        held.push(guardian.sequence(), guard);
                        self.trace.record(TraceEvent::Acquired {
                            sequence: guardian.sequence(),
                        });
                    }
                    Err(TryLockError::Poisoned(_)) => {
                        return Err(ExecuteError::Poisoned {
                            sequence: guardian.sequence(),
                        });
                    }
                    Err(TryLockError::WouldBlock) => {
                        contended = Some(guardian.sequence());
                        break;
                    }
                }
            }
            match contended {
                None => break held,
                Some(sequence) => {
                    // Back all the way off before retrying, so a holder of a
                    // later guardian is never blocked on an earlier one.
                    drop(held);
                    if Instant::now() >= deadline {
                        return Err(ExecuteError::Timeout { sequence, timeout });
                    }
                    thread::sleep(CONTENTION_PAUSE);
                }
            }
        };
        self.trace.record(TraceEvent::Executing);
        let result = work().map_err(ExecuteError::Work);
        drop(held);
        result
    }

    /// Copy the request into a private sequence, sort it into global order,
    /// and reject duplicates before anything is acquired.
    fn ordered<'a>(&self, guardians: &'a [Guardian]) -> Result<Vec<&'a Guardian>, ExecuteError> {
        let mut ordered: Vec<&Guardian> = guardians.iter().collect();
        ordered.sort_by(|a, b| a.order(b));
        for pair in ordered.windows(2) {
            if pair[0].order(pair[1]) == Ordering::Equal {
                return Err(ExecuteError::Duplicate {
                    sequence: pair[1].sequence(),
                });
            }
        }
        Ok(ordered)
    }
}

/// Locks held by one call, released in reverse acquisition order on drop.
///
/// The explicit stack replaces nested scoped acquisition: depth is bounded
/// by the vector, not the call stack, and the reverse unwind runs on every
/// exit path, including propagated failures.
struct Held<'g, 't, T: TraceSink> {
    guards: Vec<(u64, MutexGuard<'g, ()>)>,
    trace: &'t T,
}

impl<'g, 't, T: TraceSink> Held<'g, 't, T> {
    fn new(trace: &'t T) -> Self {
        Self {
            guards: Vec::new(),
            trace,
        }
    }

    fn push(&mut self, sequence: u64, guard: MutexGuard<'g, ()>) {
        self.guards.push((sequence, guard));
    }
}

impl<T: TraceSink> Drop for Held<'_, '_, T> {
    fn drop(&mut self) {
        while let Some((sequence, guard)) = self.guards.pop() {
            self.trace.record(TraceEvent::Releasing { sequence });
            drop(guard);
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
