use crate::bridge_tests::helpers::spawn_worker;

use bridge_core::error::CallError;
use bridge_core::{ProbeConfig, TransferHandlers, Value, consume_api, worker_channel};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;

// ============================================================================
// Worker-style channel: the exposer runs on its own thread and runtime
// ============================================================================

/// **VALUE**: Verifies a consumer can call into an API exposed by a separate thread.
///
/// **WHY THIS MATTERS**: The worker binding is how an isolated runtime is driven. Each side
/// owns its own tokio runtime; only the channel halves cross between them.
///
/// **BUG THIS CATCHES**: Would catch an endpoint that silently depends on running in the
/// same runtime as its peer, or readiness that does not cross threads.
#[tokio::test]
async fn given_worker_thread_api_when_host_calls_then_results_return() {
    // GIVEN: A worker thread exposing the calculator and marking it ready
    let (host_half, worker_half) = worker_channel();
    let handlers = TransferHandlers::with_defaults();
    let (stop_tx, stop_rx) = oneshot::channel();
    let worker = spawn_worker(worker_half, Arc::clone(&handlers), 0, true, stop_rx);

    // WHEN: The host consumes it
    let api = consume_api(&host_half.into_endpoint(), handlers, &ProbeConfig::default());
    let report = api.is_connected().await;
    timeout(Duration::from_secs(2), api.is_ready())
        .await
        .expect("worker resolves readiness")
        .expect("isReady");
    let sum = api
        .call_method("add", vec![Value::from(20), Value::from(22)])
        .await
        .expect("add");

    // THEN: Connected, ready, and the call round-trips
    assert!(report.connected);
    assert_eq!(sum, Value::from(42));

    let _ = stop_tx.send(());
    worker.join().expect("worker thread");
}

/// **VALUE**: Verifies the probe hides the start-up race with a worker that publishes late.
///
/// **WHY THIS MATTERS**: The host starts talking as soon as the worker is spawned, long
/// before the worker has built its API.
///
/// **BUG THIS CATCHES**: Would catch a probe that errors or gives up on the first lost
/// request.
#[tokio::test]
async fn given_worker_exposing_late_when_host_checks_connection_then_connects_after_retries() {
    // GIVEN: A worker that exposes after 450ms
    let (host_half, worker_half) = worker_channel();
    let handlers = TransferHandlers::with_defaults();
    let (stop_tx, stop_rx) = oneshot::channel();
    let worker = spawn_worker(worker_half, Arc::clone(&handlers), 450, false, stop_rx);

    // WHEN: The host probes immediately
    let api = consume_api(&host_half.into_endpoint(), handlers, &ProbeConfig::default());
    let report = api.is_connected().await;

    // THEN: Several attempts, all within the limit
    assert!(report.connected);
    assert!((2..=10).contains(&report.attempts), "attempts = {}", report.attempts);
    assert_eq!(api.pending_requests(), 0, "abandoned attempts must not linger");

    let _ = stop_tx.send(());
    worker.join().expect("worker thread");
}

#[tokio::test]
async fn given_worker_thread_api_when_method_throws_then_message_reaches_host() {
    let (host_half, worker_half) = worker_channel();
    let handlers = TransferHandlers::with_defaults();
    let (stop_tx, stop_rx) = oneshot::channel();
    let worker = spawn_worker(worker_half, Arc::clone(&handlers), 0, true, stop_rx);

    let api = consume_api(&host_half.into_endpoint(), handlers, &ProbeConfig::default());
    api.is_connected().await;
    let result = api
        .call_method("fail", vec![Value::from("Parse error on line 3")])
        .await;

    match result {
        Err(CallError::Thrown { message, .. }) => assert_eq!(message, "Parse error on line 3"),
        other => panic!("Expected a thrown error, got {other:?}"),
    }

    let _ = stop_tx.send(());
    worker.join().expect("worker thread");
}

/// **VALUE**: Verifies pending calls fail instead of hanging when the worker goes away.
///
/// **BUG THIS CATCHES**: Would catch reply waiters that are never woken once the channel
/// closes.
#[tokio::test]
async fn given_worker_gone_when_host_calls_then_call_fails() {
    // GIVEN: A worker that exposed and then shut down
    let (host_half, worker_half) = worker_channel();
    let handlers = TransferHandlers::with_defaults();
    let (stop_tx, stop_rx) = oneshot::channel();
    let worker = spawn_worker(worker_half, Arc::clone(&handlers), 0, true, stop_rx);
    let api = consume_api(&host_half.into_endpoint(), handlers, &ProbeConfig::default());
    assert!(api.is_connected().await.connected);

    let _ = stop_tx.send(());
    worker.join().expect("worker thread");

    // WHEN: Calling after shutdown
    let result = timeout(
        Duration::from_secs(1),
        api.call_method("add", vec![Value::from(1), Value::from(2)]),
    )
    .await
    .expect("call must not hang");

    // THEN: An error, not a hang
    assert!(result.is_err());
}
