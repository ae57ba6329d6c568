// Unit tests for bridge config loading, saving and validation

use crate::config::{BridgeConfig, ProbeConfig, WindowConfig};
use crate::error::config::ConfigError;
use crate::{BRIDGE_LOOPBACK_HOST, DEFAULT_WINDOW_PORT, DEFAULT_WINDOW_URL};

use std::time::Duration;

use tempfile::TempDir;

/// **VALUE**: Verifies a missing config file yields the documented defaults.
///
/// **WHY THIS MATTERS**: First start has no config file. The probe limits (10 attempts of
/// 200ms) are what hide the start-up race, so the defaults must be exactly those.
///
/// **BUG THIS CATCHES**: Would catch load failing on a fresh install, or a default drifting.
#[test]
fn given_no_config_file_when_load_then_returns_defaults() {
    // GIVEN: Empty config directory
    let dir = TempDir::new().expect("temp dir");

    // WHEN: Loading
    let config = BridgeConfig::load(dir.path()).expect("load defaults");

    // THEN: Defaults
    assert_eq!(config, BridgeConfig::default());
    assert_eq!(config.probe.max_attempts, 10);
    assert_eq!(config.probe.attempt_timeout(), Duration::from_millis(200));
    assert_eq!(config.window.host, BRIDGE_LOOPBACK_HOST);
    assert_eq!(config.window.port, DEFAULT_WINDOW_PORT);
    assert_eq!(DEFAULT_WINDOW_URL, "ws://127.0.0.1:19876");
}

#[test]
fn given_saved_config_when_load_then_same_values() {
    // GIVEN: A customized config saved to disk
    let dir = TempDir::new().expect("temp dir");
    let config = BridgeConfig {
        probe: ProbeConfig {
            max_attempts: 4,
            attempt_timeout_ms: 50,
        },
        window: WindowConfig {
            port: 0,
            ..WindowConfig::default()
        },
        ..BridgeConfig::default()
    };
    config.save(dir.path()).expect("save");

    // WHEN: Loading it back
    let loaded = BridgeConfig::load(dir.path()).expect("load");

    // THEN: Same values, no temp file left behind
    assert_eq!(loaded, config);
    assert!(!dir.path().join("bridge.json.tmp").exists());
}

#[test]
fn given_partial_config_file_when_load_then_missing_fields_defaulted() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join("bridge.json"),
        r#"{ "probe": { "max_attempts": 3 } }"#,
    )
    .expect("write");

    let config = BridgeConfig::load(dir.path()).expect("load");

    assert_eq!(config.probe.max_attempts, 3);
    assert_eq!(config.probe.attempt_timeout_ms, 200);
    assert_eq!(config.window, WindowConfig::default());
}

/// **VALUE**: Verifies a corrupted file is reported instead of silently replaced.
///
/// **BUG THIS CATCHES**: Would catch a hand-edited config being ignored without a trace.
#[test]
fn given_corrupted_config_file_when_load_then_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("bridge.json"), "{ not json").expect("write");

    let result = BridgeConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Verifies the window channel cannot be configured onto a public interface.
///
/// **WHY THIS MATTERS**: Whoever connects to the window channel can call every exposed
/// method.
///
/// **BUG THIS CATCHES**: Would catch `0.0.0.0` or a LAN address slipping through.
#[test]
fn given_non_loopback_host_when_validate_then_validation_error() {
    for host in ["0.0.0.0", "192.168.1.10", "example.com"] {
        let config = BridgeConfig {
            window: WindowConfig {
                host: host.to_string(),
                ..WindowConfig::default()
            },
            ..BridgeConfig::default()
        };

        assert!(
            matches!(config.validate(), Err(ConfigError::ValidationError { .. })),
            "{host} should be rejected"
        );
    }
}

#[test]
fn given_out_of_range_values_when_validate_then_validation_error() {
    let zero_attempts = BridgeConfig {
        probe: ProbeConfig {
            max_attempts: 0,
            ..ProbeConfig::default()
        },
        ..BridgeConfig::default()
    };
    let future_version = BridgeConfig {
        version: 99,
        ..BridgeConfig::default()
    };

    assert!(zero_attempts.validate().is_err());
    assert!(future_version.validate().is_err());
    assert!(BridgeConfig::default().validate().is_ok());
    assert!(
        WindowConfig {
            host: String::from("::1"),
            ..WindowConfig::default()
        }
        .validate()
        .is_ok()
    );
}
