//! Test helpers for bridge integration tests.
//!
//! This module provides utilities for:
//! - Building window-style endpoint pairs over a real loopback WebSocket
//! - Running an exposer in its own thread and runtime, as a worker would
//! - A shared method set used across scenarios

use bridge_core::channel::WorkerChannel;
use bridge_core::error::CallError;
use bridge_core::{
    Endpoint, MethodSet, TransferHandlers, Value, WindowConfig, WindowListener, connect_window,
    expose_api,
};

use std::sync::Arc;
use std::thread::JoinHandle as ThreadHandle;

use tokio::sync::oneshot;

/// Window config with an OS-assigned port and a short connect budget.
pub fn test_window_config() -> WindowConfig {
    WindowConfig {
        port: 0,
        connect_max_elapsed_ms: 2_000,
        ..WindowConfig::default()
    }
}

/// Test helper: Listen, connect and return `(parent, child)` window endpoints.
pub async fn window_pair() -> (Endpoint, Endpoint) {
    let config = test_window_config();
    let listener = WindowListener::bind(&config)
        .await
        .expect("Failed to bind window listener");
    let url = listener.url().expect("listener URL");

    let (parent, child) = tokio::join!(listener.accept(), connect_window(&url, &config));
    (
        parent.expect("Failed to accept window connection"),
        child.expect("Failed to connect window channel"),
    )
}

/// Methods used by most scenarios: `add(a, b)`, `echo(value)` and
/// `fail(message)`.
pub fn calculator() -> MethodSet {
    MethodSet::new()
        .sync_method("add", |args| {
            let a = args.first().and_then(Value::as_f64).unwrap_or_default();
            let b = args.get(1).and_then(Value::as_f64).unwrap_or_default();
            Ok(Value::from(a + b))
        })
        .sync_method("echo", |args| Ok(args.into_iter().next().unwrap_or_default()))
        .sync_method("fail", |args| {
            let message = args
                .first()
                .and_then(Value::as_str)
                .unwrap_or("failed")
                .to_string();
            Err(CallError::thrown(message))
        })
}

/// Test helper: Run `calculator()` behind a worker channel on its own thread
/// with its own runtime, until `stop` fires.
///
/// The thread waits `expose_delay_ms` before exposing, and resolves readiness
/// right after exposing when `resolve_ready` is set.
pub fn spawn_worker(
    channel: WorkerChannel,
    handlers: Arc<TransferHandlers>,
    expose_delay_ms: u64,
    resolve_ready: bool,
    stop: oneshot::Receiver<()>,
) -> ThreadHandle<()> {
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("worker runtime");

        runtime.block_on(async move {
            let endpoint = channel.into_endpoint();
            tokio::time::sleep(std::time::Duration::from_millis(expose_delay_ms)).await;

            let (resolver, _facade) = expose_api(calculator(), None, &endpoint, handlers);
            if resolve_ready {
                resolver.resolve();
            }

            let _ = stop.await;
        });
    })
}
