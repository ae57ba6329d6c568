use bridge_host::error::HostError;
use bridge_host::logger::initialize as LoggerInitialize;
use bridge_host::paths;
use bridge_host::php_worker::{REQUEST_METHOD, RUN_METHOD, spawn_php_worker};

use bridge_core::{
    BridgeConfig, Endpoint, Function, TransferHandlers, Value, consume_api, worker_channel,
};
use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::sync::Arc;

use log::{error, info, warn};

const DEMO_SCRIPT: &str = "Booting demo script\nHello from the worker\nDone";

#[tokio::main]
async fn main() -> Result<(), HostError> {
    let dotenv = paths::load_dotenv();
    let host_paths = paths::resolve()?;

    // Ensure log directory exists
    create_dir_all(&host_paths.log_dir).map_err(|e| HostError::Host {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&host_paths)?;

    info!("PHP bridge host starting");
    if let Some(dotenv) = dotenv {
        info!("Loaded environment from {}", dotenv.display());
    }
    info!("Config directory: {}", host_paths.config_dir.display());

    let config = BridgeConfig::load(&host_paths.config_dir)?;

    let handlers = TransferHandlers::with_defaults();
    let (host_half, worker_half) = worker_channel();
    let worker = spawn_php_worker(worker_half, Arc::clone(&handlers))?;

    let outcome = drive_worker(host_half.into_endpoint(), handlers, &config).await;
    if let Err(e) = &outcome {
        error!("Bridge session failed: {e}");
    }

    worker.shutdown()?;
    info!("PHP bridge host stopped");
    outcome
}

async fn drive_worker(
    endpoint: Endpoint,
    handlers: Arc<TransferHandlers>,
    config: &BridgeConfig,
) -> Result<(), HostError> {
    let php = consume_api(&endpoint, handlers, &config.probe);

    let report = php.is_connected().await;
    if !report.connected {
        warn!(
            "Worker did not answer after {} attempts; continuing anyway",
            report.attempts
        );
    } else {
        info!("Worker connected after {} attempt(s)", report.attempts);
    }

    php.is_ready().await?;
    info!("Worker ready");

    let request = Value::object([
        ("method", Value::from("GET")),
        ("url", Value::from("http://localhost/index.php")),
    ]);
    let response = php.call_method(REQUEST_METHOD, vec![request]).await?;
    match response.as_response() {
        Some(response) => info!(
            "GET /index.php -> {} {}",
            response.http_status_code(),
            response.text()
        ),
        None => warn!("Worker answered with a {} instead of a response", response.kind()),
    }

    let on_output = Function::sync(|args| {
        let line = args
            .first()
            .and_then(|event| event.get("detail"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        info!("[php] {line}");
        Ok(Value::Undefined)
    });
    php.call_method(RUN_METHOD, vec![Value::from(DEMO_SCRIPT), on_output.into()])
        .await?;

    Ok(())
}
