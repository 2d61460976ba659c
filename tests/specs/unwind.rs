//! Release and failure-path guarantees.

use std::panic::{catch_unwind, AssertUnwindSafe};

use warden_core::{ExecuteError, OrderedExecutor, SequenceCounter, TraceEvent};

use crate::prelude::*;

#[test]
fn work_failure_releases_everything_before_surfacing() {
    let counter = SequenceCounter::new();
    let pool = guardians(&counter, 4);
    let (executor, trace) = recording();

    let result = executor.run_with_locks(&pool, || Err("database exploded".into()));

    match result {
        Err(ExecuteError::Work(error)) => assert_eq!(error.to_string(), "database exploded"),
        other => panic!("expected work failure, got {other:?}"),
    }
    assert_eq!(released(&trace.events()), vec![4, 3, 2, 1]);

    // Every guardian is already free again: the same set is immediately
    // acquirable on the blocking path.
    assert!(executor.run_with_locks(&pool, || Ok(())).is_ok());
}

#[test]
fn panicking_work_still_releases_in_reverse() {
    let counter = SequenceCounter::new();
    let pool = guardians(&counter, 3);
    let (executor, trace) = recording();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let _ = executor.run_with_locks(&pool, || panic!("work item died"));
    }));

    assert!(outcome.is_err());
    let events = trace.events();
    assert_eq!(acquired(&events), vec![1, 2, 3]);
    assert_eq!(released(&events), vec![3, 2, 1]);
}

/// The all-or-nothing property: when the second of three guardians cannot be
/// acquired, the work item never runs and the first guardian is released
/// exactly once.
#[test]
fn failed_acquisition_means_zero_executions_and_full_unwind() {
    let counter = SequenceCounter::new();
    let pool = guardians(&counter, 3);

    // Poison the middle guardian: a panicking work item leaves its mutex
    // poisoned, so the next acquisition errors instead of blocking.
    let poisoner = OrderedExecutor::new();
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let _ = poisoner.run_with_locks(&pool[1..2], || panic!("holder died"));
    }));

    let (executor, trace) = recording();
    let mut ran = false;
    let result = executor.run_with_locks(&pool, || {
        ran = true;
        Ok(())
    });

    match result {
        Err(ExecuteError::Poisoned { sequence }) => assert_eq!(sequence, pool[1].sequence()),
        other => panic!("expected poisoned acquisition, got {other:?}"),
    }
    assert!(!ran);
    assert_eq!(
        trace.events(),
        vec![
            TraceEvent::Acquiring { sequence: 1 },
            TraceEvent::Acquired { sequence: 1 },
            TraceEvent::Acquiring { sequence: 2 },
            TraceEvent::Releasing { sequence: 1 },
        ]
    );
}

#[test]
fn zero_guardians_run_immediately_with_no_lock_traffic() {
    let (executor, trace) = recording();
    let mut ran = false;

    executor
        .run_with_locks(&[], || {
            ran = true;
            Ok(())
        })
        .unwrap();

    assert!(ran);
    assert_eq!(trace.events(), vec![TraceEvent::Executing]);
}
