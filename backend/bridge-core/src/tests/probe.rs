// Unit tests for the connectivity probe

use crate::error::call::CallError;
use crate::facade::ConnectionProbe;

use std::future::pending;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// **VALUE**: Verifies an attempt that never answers is abandoned and retried.
///
/// **WHY THIS MATTERS**: Requests sent before the other side publishes are dropped, so
/// the reply never comes. Without a timeout the probe would hang forever.
///
/// **BUG THIS CATCHES**: Would catch the probe awaiting a lost reply, or retrying without
/// bound.
#[tokio::test]
async fn given_attempts_hang_until_third_when_run_then_connects_on_third() {
    // GIVEN: Attempts that never answer until the third
    let probe = ConnectionProbe::new(10, Duration::from_millis(20));
    let calls = Arc::new(AtomicU32::new(0));

    // WHEN: Running the probe
    let report = probe
        .run(|| {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    pending::<()>().await;
                }
                Ok(())
            }
        })
        .await;

    // THEN: Connected on attempt three
    assert!(report.connected);
    assert_eq!(report.attempts, 3);
}

/// **VALUE**: Verifies a remote that never answers exhausts the attempts without an error.
///
/// **BUG THIS CATCHES**: Would catch an extra or a missing attempt, or the probe
/// surfacing the failure as a panic or error instead of a report.
#[tokio::test]
async fn given_remote_never_answers_when_run_then_gives_up_after_max_attempts() {
    let probe = ConnectionProbe::new(4, Duration::from_millis(10));
    let calls = Arc::new(AtomicU32::new(0));

    let report = probe
        .run(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                pending::<Result<(), CallError>>().await
            }
        })
        .await;

    assert!(!report.connected);
    assert_eq!(report.attempts, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

/// **VALUE**: Verifies an attempt that fails early still waits out its slot.
///
/// **BUG THIS CATCHES**: Would catch a tight retry loop that burns every attempt in
/// microseconds when the channel rejects sends.
#[tokio::test]
async fn given_attempts_fail_fast_when_run_then_each_uses_full_timeout() {
    let probe = ConnectionProbe::new(3, Duration::from_millis(30));
    let started = Instant::now();

    let report = probe
        .run(|| async { Err(CallError::thrown("channel closed")) })
        .await;

    assert!(!report.connected);
    assert_eq!(report.attempts, 3);
    assert!(started.elapsed() >= Duration::from_millis(90));
}

#[test]
fn given_zero_attempts_when_new_then_at_least_one() {
    let probe = ConnectionProbe::new(0, Duration::from_millis(200));

    assert_eq!(probe.max_attempts(), 1);
    assert_eq!(probe.attempt_timeout(), Duration::from_millis(200));
}
