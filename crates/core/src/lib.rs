// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! warden-core: ordered multi-resource lock acquisition
//!
//! This crate provides:
//! - Guardian handles that place every lockable resource in one total order
//! - An executor that acquires any requested set of guardians in that order,
//!   runs a unit of work, and releases in exact reverse order on every exit
//! - A diagnostic trace stream for acquire/execute/release events
//!
//! Because every call acquires its guardians in the same global order,
//! circular wait between overlapping callers cannot form, which makes
//! deadlock among calls that go through the executor structurally
//! impossible.

pub mod executor;
pub mod guardian;
pub mod sequence;
pub mod trace;

// Re-exports
pub use executor::{ExecuteError, OrderedExecutor, WorkError};
pub use guardian::Guardian;
pub use sequence::SequenceCounter;
pub use trace::{LogTrace, NullTrace, RecordingTrace, TraceEvent, TraceSink};
