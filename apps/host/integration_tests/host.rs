use bridge_host::php_worker::{PHP_VERSION, spawn_php_worker};

use bridge_core::{Function, ProbeConfig, TransferHandlers, Value, consume_api, worker_channel};
use common::HttpStatusCode;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

// ============================================================================
// Host driving the PHP worker end to end over a worker channel
// ============================================================================

/// **VALUE**: Verifies the full host flow: probe, wait for readiness, send a request and
/// get a real response object back.
///
/// **WHY THIS MATTERS**: This is exactly what `main` does. The response must arrive with
/// its helpers (`text`, `json`, `is_ok`) intact, not as a bare record.
///
/// **BUG THIS CATCHES**: Would catch the response handler not being installed on either
/// side, or readiness never being resolved by the worker.
#[tokio::test]
async fn given_php_worker_when_host_requests_index_then_response_object_returned() {
    // GIVEN: A running worker
    let handlers = TransferHandlers::with_defaults();
    let (host_half, worker_half) = worker_channel();
    let worker = spawn_php_worker(worker_half, Arc::clone(&handlers)).expect("spawn worker");
    let php = consume_api(&host_half.into_endpoint(), handlers, &ProbeConfig::default());

    // WHEN: Probing, waiting for ready, then requesting /index.php
    let report = php.is_connected().await;
    timeout(Duration::from_secs(2), php.is_ready())
        .await
        .expect("worker resolves readiness")
        .expect("isReady");
    let request = Value::object([
        ("method", Value::from("GET")),
        ("url", Value::from("http://localhost/index.php")),
    ]);
    let result = php
        .call_method("request", vec![request])
        .await
        .expect("request");
    let version = php.at("version").get().await.expect("version");

    // THEN: A response with its accessors
    assert!(report.connected);
    let response = result.as_response().expect("a PhpResponse, not a plain record");
    assert_eq!(response.http_status_code(), HttpStatusCode::OK);
    assert!(response.text().contains("Hello from PHP"));
    assert_eq!(version, Value::from(PHP_VERSION));

    worker.shutdown().expect("clean shutdown");
}

/// **VALUE**: Verifies output streamed by `run` reaches a host callback as event details.
///
/// **WHY THIS MATTERS**: Output callbacks combine two handlers: the callback crosses as a
/// function, and each line comes back through it as an event.
///
/// **BUG THIS CATCHES**: Would catch events arriving without their `detail`, or callbacks
/// being invoked out of order.
#[tokio::test]
async fn given_output_callback_when_run_then_each_line_arrives_as_detail() {
    // GIVEN: A running worker and a callback collecting details
    let handlers = TransferHandlers::with_defaults();
    let (host_half, worker_half) = worker_channel();
    let worker = spawn_php_worker(worker_half, Arc::clone(&handlers)).expect("spawn worker");
    let php = consume_api(&host_half.into_endpoint(), handlers, &ProbeConfig::default());
    assert!(php.is_connected().await.connected);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let on_output = Function::sync(move |args| {
        let detail = args
            .first()
            .and_then(|event| event.get("detail"))
            .cloned()
            .unwrap_or_default();
        let _ = tx.send(detail);
        Ok(Value::Undefined)
    });

    // WHEN: Running a three-line script
    let result = php
        .call_method(
            "run",
            vec![Value::from("first\n\nsecond\nthird"), on_output.into()],
        )
        .await
        .expect("run");

    // THEN: Three events in order, and the joined output as the response body
    let mut lines = Vec::new();
    while let Ok(detail) = rx.try_recv() {
        lines.push(detail);
    }
    assert_eq!(
        lines,
        vec![Value::from("first"), Value::from("second"), Value::from("third")]
    );
    let response = result.as_response().expect("response");
    assert_eq!(response.text(), "first\nsecond\nthird");

    worker.shutdown().expect("clean shutdown");
}

#[tokio::test]
async fn given_php_worker_when_request_lacks_url_then_thrown_message_reaches_host() {
    let handlers = TransferHandlers::with_defaults();
    let (host_half, worker_half) = worker_channel();
    let worker = spawn_php_worker(worker_half, Arc::clone(&handlers)).expect("spawn worker");
    let php = consume_api(&host_half.into_endpoint(), handlers, &ProbeConfig::default());
    php.is_connected().await;

    let result = php.call_method("request", vec![Value::Object(Default::default())]).await;

    let err = result.expect_err("missing url must fail");
    assert!(err.remote_message().contains("url"));

    worker.shutdown().expect("clean shutdown");
}
