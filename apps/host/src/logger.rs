//! Logging for the bridge host.
//!
//! Dual output (stdout with colors + file under [`HostPaths::log_dir`]). The
//! PHP worker thread logs through the same global logger, so every line
//! carries a context label (`host` or `php`) to tell the two execution
//! contexts apart in the shared file.
//!
//! The level comes from `BRIDGE_LOG_LEVEL` (also read from `.env`), falling
//! back to Debug in debug builds and Info in release builds.

use crate::error::HostError;
use crate::paths::HostPaths;
use crate::php_worker::WORKER_THREAD_NAME;

use common::ErrorLocation;

use std::env;
use std::fmt::{Arguments, Display};
use std::io::stdout;
use std::panic::Location;
use std::str::FromStr;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "php-bridge.log";

/// Environment variable selecting the log level (`error` .. `trace`, `off`).
pub const LOG_LEVEL_ENV: &str = "BRIDGE_LOG_LEVEL";

pub const HOST_CONTEXT: &str = "host";
pub const WORKER_CONTEXT: &str = "php";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Initialize the logger for `paths`.
///
/// Safe to call more than once: later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns [`HostError::Host`] if the log file cannot be created or the
/// global logger cannot be installed.
pub fn initialize(paths: &HostPaths) -> Result<(), HostError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let setting = env::var(LOG_LEVEL_ENV).ok();
    let level = resolve_level(setting.as_deref());

    let mut result = Ok(());
    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(paths, level);
        if result.is_ok() {
            info!(
                "Logger initialized with level {level:?} for {}",
                paths.config_dir.display()
            );
            if let Some(setting) = setting.filter(|s| s.parse::<LevelFilter>().is_err()) {
                warn!("Ignoring unknown {LOG_LEVEL_ENV} value {setting:?}");
            }
        }
    });

    result
}

/// Level named by `setting`, or the build default when it is unset or unknown.
pub fn resolve_level(setting: Option<&str>) -> LevelFilter {
    setting
        .map(str::trim)
        .and_then(|s| LevelFilter::from_str(s).ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// Context label for a line logged from the thread named `thread_name`.
pub fn context_label(thread_name: Option<&str>) -> &'static str {
    match thread_name {
        Some(WORKER_THREAD_NAME) => WORKER_CONTEXT,
        _ => HOST_CONTEXT,
    }
}

#[track_caller]
fn initialize_internal(paths: &HostPaths, level: LevelFilter) -> Result<(), HostError> {
    let log_file = fern::log_file(paths.log_dir.join(LOG_FILE_NAME)).map_err(|e| {
        HostError::Host {
            message: format!("Failed to create log file: {e}"),
            location: ErrorLocation::from(Location::caller()),
        }
    })?;

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            finish_line(out, message, record, &colors.color(record.level()))
        })
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| finish_line(out, message, record, &record.level()))
        .chain(log_file);

    Dispatch::new()
        .level(level)
        .level_for("tungstenite", LevelFilter::Info)
        .level_for("tokio_tungstenite", LevelFilter::Info)
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| HostError::Host {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

fn finish_line(out: FormatCallback, message: &Arguments, record: &Record, level: &dyn Display) {
    let current = thread::current();
    out.finish(format_args!(
        "[{date} - {level}] [{context}] {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        context = context_label(current.name()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
