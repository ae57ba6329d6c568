// Logger: level selection, context labels, initialization and idempotence
//
// The logger is process-global, so the initialization sequence lives in one
// test to keep the order of calls deterministic.

use crate::logger::{HOST_CONTEXT, WORKER_CONTEXT, context_label, initialize, resolve_level};
use crate::paths::{HostPaths, PathSource};
use crate::php_worker::WORKER_THREAD_NAME;

use std::path::PathBuf;

use log::LevelFilter;

fn paths_with_log_dir(log_dir: PathBuf) -> HostPaths {
    HostPaths {
        config_dir: log_dir.clone(),
        log_dir,
        source: PathSource::EnvVar,
    }
}

/// **VALUE**: Verifies `BRIDGE_LOG_LEVEL` values pick the level, case-insensitively.
///
/// **BUG THIS CATCHES**: Would catch the setting being ignored, or an unknown value
/// silencing the logger instead of falling back to the build default.
#[test]
fn given_level_setting_when_resolved_then_named_level_or_default() {
    // GIVEN/WHEN/THEN: Known names
    assert_eq!(resolve_level(Some("trace")), LevelFilter::Trace);
    assert_eq!(resolve_level(Some(" WARN ")), LevelFilter::Warn);
    assert_eq!(resolve_level(Some("off")), LevelFilter::Off);

    // GIVEN/WHEN/THEN: Unset or unknown falls back to the same default
    let default = resolve_level(None);
    assert_ne!(default, LevelFilter::Off);
    assert_eq!(resolve_level(Some("chatty")), default);
    assert_eq!(resolve_level(Some("")), default);
}

/// **VALUE**: Verifies lines from the PHP worker thread are labelled apart from host lines.
///
/// **WHY THIS MATTERS**: Both contexts share one log file. Without the label a failed
/// call cannot be traced to the side that logged it.
///
/// **BUG THIS CATCHES**: Would catch the worker thread being renamed without the label
/// following, which would tag every worker line as `host`.
#[test]
fn given_thread_names_when_labelled_then_worker_thread_is_php() {
    assert_eq!(context_label(Some(WORKER_THREAD_NAME)), WORKER_CONTEXT);
    assert_eq!(context_label(Some("main")), HOST_CONTEXT);
    assert_eq!(context_label(Some("tokio-runtime-worker")), HOST_CONTEXT);
    assert_eq!(context_label(None), HOST_CONTEXT);
}

/// **VALUE**: Verifies an unwritable log directory yields an error, and that later calls
/// never panic or fail.
///
/// **WHY THIS MATTERS**: `main` initializes the logger before anything else. A panic
/// there crashes the host before it can report why; a second call must not make fern
/// set a global logger twice.
///
/// **BUG THIS CATCHES**: Would catch `fern::log_file()` being unwrapped, or the Once /
/// AtomicBool guards being removed.
#[test]
fn given_logger_when_initialized_invalid_then_valid_twice_then_error_then_ok() {
    // GIVEN: Paths whose log directory cannot hold a file
    let invalid = paths_with_log_dir(PathBuf::from("/dev/null/invalid-path"));

    // WHEN: Initializing against them
    let result = initialize(&invalid);

    // THEN: Host error, not a panic
    let err = result.expect_err("Should return error for invalid log directory");
    assert!(
        format!("{err:?}").contains("Host"),
        "Error should be HostError::Host variant"
    );

    // GIVEN: A valid temporary directory
    let temp_dir = std::env::temp_dir().join("php-bridge-test-logger");
    std::fs::create_dir_all(&temp_dir).unwrap();
    let valid = paths_with_log_dir(temp_dir.clone());

    // WHEN: Calling initialize twice more
    let result1 = initialize(&valid);
    let result2 = initialize(&valid);

    // THEN: Both return Ok (already attempted, warning only)
    assert!(result1.is_ok(), "Repeat initialization should succeed");
    assert!(result2.is_ok(), "Repeat initialization should succeed (idempotent)");

    // Cleanup
    std::fs::remove_dir_all(&temp_dir).ok();
}
