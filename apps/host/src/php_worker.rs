//! Stand-in PHP runtime living in its own execution context.
//!
//! The worker owns a dedicated OS thread with its own tokio runtime and only
//! talks to the host through a worker channel. It publishes:
//!
//! - `request({ method, url, body })` → a [`PhpResponse`]
//! - `run(code, onOutput)` → a [`PhpResponse`], streaming each output line to
//!   the `onOutput` callback as an `output` event
//! - `version` → the runtime version string
//!
//! The routing below is deliberately tiny; what matters is that responses,
//! events and callbacks all cross the channel.

use crate::error::HostError;

use bridge_core::channel::WorkerChannel;
use bridge_core::error::CallError;
use bridge_core::{CustomEvent, MethodSet, TransferHandlers, Value, expose_api};
use common::ErrorLocation;
use models::{PhpResponse, PhpResponseBuilder};

use std::panic::Location;
use std::sync::Arc;
use std::thread::{Builder as ThreadBuilder, JoinHandle as ThreadHandle};

use log::{debug, error, info};
use serde_json::json;
use tokio::runtime::Builder as RuntimeBuilder;
use tokio::sync::oneshot;
use url::Url;

pub const REQUEST_METHOD: &str = "request";
pub const RUN_METHOD: &str = "run";
pub const VERSION_MEMBER: &str = "version";
pub const OUTPUT_EVENT: &str = "output";
pub const PHP_VERSION: &str = "8.3.0-bridge";

pub const WORKER_THREAD_NAME: &str = "php-worker";

/// Origin relative request URLs (`/index.php`) are resolved against.
const DEFAULT_ORIGIN: &str = "http://localhost/";

/// Handle on the running worker thread.
pub struct PhpWorker {
    stop: Option<oneshot::Sender<()>>,
    thread: Option<ThreadHandle<()>>,
}

/// Start the worker on its own thread and expose its API on `channel`.
///
/// Readiness is resolved once the runtime has booted, so a host awaiting
/// `isReady()` only proceeds after that.
///
/// # Errors
///
/// Returns [`HostError::Worker`] if the thread cannot be spawned.
pub fn spawn_php_worker(
    channel: WorkerChannel,
    handlers: Arc<TransferHandlers>,
) -> Result<PhpWorker, HostError> {
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let thread = ThreadBuilder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let runtime = match RuntimeBuilder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("PHP worker runtime failed to start: {e}");
                    return;
                }
            };

            runtime.block_on(async move {
                let endpoint = channel.into_endpoint();
                let (resolver, _facade) = expose_api(php_methods(), None, &endpoint, handlers);

                boot();
                resolver.resolve();

                let _ = stop_rx.await;
                info!("PHP worker stopping");
            });
        })
        .map_err(|e| HostError::Worker {
            message: format!("Failed to spawn PHP worker thread: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(PhpWorker {
        stop: Some(stop_tx),
        thread: Some(thread),
    })
}

impl PhpWorker {
    /// Stop the worker and wait for its thread to finish.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Worker`] if the worker thread panicked.
    pub fn shutdown(mut self) -> Result<(), HostError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| HostError::Worker {
                message: String::from("PHP worker thread panicked"),
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(()),
        }
    }
}

impl Drop for PhpWorker {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

fn boot() {
    info!("PHP runtime {PHP_VERSION} booted");
}

/// The method set the worker exposes.
pub fn php_methods() -> MethodSet {
    MethodSet::new()
        .sync_method(REQUEST_METHOD, |args| {
            let request = args.into_iter().next().unwrap_or_default();
            Ok(Value::Response(handle_request(&request)?))
        })
        .method(RUN_METHOD, |args: Vec<Value>| async move {
            let mut args = args.into_iter();
            let code = args.next().unwrap_or_default();
            let on_output = args.next().unwrap_or_default();
            run_script(&code, &on_output).await.map(Value::Response)
        })
        .value(VERSION_MEMBER, PHP_VERSION)
}

/// Route a request object to a canned response.
///
/// # Errors
///
/// Returns a thrown [`CallError`] if `request` is not an object with a `url`.
pub fn handle_request(request: &Value) -> Result<PhpResponse, CallError> {
    let url = request
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| CallError::thrown("request expects an object with a url"))?;
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("GET")
        .to_uppercase();
    let body = request.get("body").and_then(Value::as_str).unwrap_or("");

    debug!("PHP request {method} {url}");

    let path = request_path(url)?;
    let built = match path.as_str() {
        "/" | "/index.php" => PhpResponseBuilder::new()
            .with_header("Content-Type", "text/html; charset=UTF-8")
            .with_text("<h1>Hello from PHP</h1>"),
        "/api/echo" => PhpResponseBuilder::new()
            .with_header("Content-Type", "application/json")
            .with_text(json!({ "method": method, "url": url, "body": body }).to_string()),
        "/fatal.php" => PhpResponseBuilder::new()
            .with_status(500)
            .with_errors("PHP Fatal error:  Uncaught Error: Call to undefined function boom()")
            .with_exit_code(255),
        _ => PhpResponseBuilder::new()
            .with_status(404)
            .with_header("Content-Type", "text/plain")
            .with_text("Not Found"),
    };

    built.build().map_err(|e| CallError::thrown(e.to_string()))
}

/// Run `code` line by line, reporting each non-empty line to `on_output`.
async fn run_script(code: &Value, on_output: &Value) -> Result<PhpResponse, CallError> {
    let code = code
        .as_str()
        .ok_or_else(|| CallError::thrown("run expects the script source as a string"))?;
    let on_output = on_output.as_function();

    let mut output = Vec::new();
    for line in code.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(callback) = on_output {
            callback
                .call(vec![CustomEvent::new(OUTPUT_EVENT, line).into()])
                .await?;
        }
        output.push(line);
    }

    PhpResponseBuilder::new()
        .with_header("Content-Type", "text/plain")
        .with_text(output.join("\n"))
        .build()
        .map_err(|e| CallError::thrown(e.to_string()))
}

/// Path part of a request URL. Relative URLs resolve against
/// `http://localhost/`.
///
/// # Errors
///
/// Returns a thrown [`CallError`] if `url` does not parse.
pub fn request_path(url: &str) -> Result<String, CallError> {
    let origin = Url::parse(DEFAULT_ORIGIN).map_err(|e| CallError::thrown(e.to_string()))?;
    let parsed = Url::options()
        .base_url(Some(&origin))
        .parse(url)
        .map_err(|e| CallError::thrown(format!("Invalid request URL {url:?}: {e}")))?;

    Ok(parsed.path().to_string())
}
