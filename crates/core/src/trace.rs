// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic trace stream for executor runs
//!
//! Tracing is observational only: sinks see every acquire/execute/release
//! transition but carry no part of the correctness contract.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// One observable transition in an executor run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    /// About to block on (or attempt) a guardian's lock.
    Acquiring { sequence: u64 },
    /// The guardian's lock is now held.
    Acquired { sequence: u64 },
    /// Every requested lock is held; the work item is about to run.
    Executing,
    /// About to release a guardian's lock during unwind.
    Releasing { sequence: u64 },
}

/// Receives trace events from an executor.
///
/// Sinks must not block on the guardians they observe; they run inline on
/// the calling thread between lock transitions.
pub trait TraceSink: Clone + Send + Sync {
    fn record(&self, event: TraceEvent);
}

/// Discards every event; the executor default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn record(&self, _event: TraceEvent) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn record(&self, event: TraceEvent) {
        match event {
            TraceEvent::Acquiring { sequence } => {
                tracing::debug!(sequence, "acquiring guardian");
            }
            TraceEvent::Acquired { sequence } => {
                tracing::debug!(sequence, "guardian acquired");
            }
            TraceEvent::Executing => tracing::debug!("all guardians held, executing work"),
            TraceEvent::Releasing { sequence } => {
                tracing::debug!(sequence, "releasing guardian");
            }
        }
    }
}

/// Buffers events in memory for test assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingTrace {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl RecordingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drain the buffer, returning everything recorded so far.
    pub fn take(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl TraceSink for RecordingTrace {
    fn record(&self, event: TraceEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
