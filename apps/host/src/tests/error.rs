// HostError serialization and conversions from bridge errors

use crate::error::HostError;

use bridge_core::error::{BridgeError, CallError, ConfigError};
use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that host errors serialize with their variant tag and message.
///
/// **WHY THIS MATTERS**: Errors are reported as JSON records. If serialization breaks,
/// the report loses which layer failed.
///
/// **BUG THIS CATCHES**: Would catch removing `#[derive(Serialize)]`, changing the tag
/// layout, or adding a field that cannot be serialized.
#[test]
fn given_host_error_when_serialized_then_contains_type_and_message() {
    // GIVEN: A worker error
    let err = HostError::Worker {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_value(&err).expect("HostError should serialize");

    // THEN: Tagged by variant with the message inside data
    assert_eq!(json["type"], "Worker");
    assert_eq!(json["data"]["message"], "Test");
}

/// **VALUE**: Verifies a thrown remote error keeps its message when it reaches the host.
///
/// **BUG THIS CATCHES**: Would catch the conversion dropping the remote message, leaving
/// the host log with nothing but a location.
#[test]
fn given_thrown_call_error_when_converted_then_bridge_variant_keeps_message() {
    // GIVEN: A thrown call error
    let err = CallError::thrown("Parse error on line 3");

    // WHEN: Converting
    let host: HostError = err.into();

    // THEN: Bridge variant carrying the message
    match host {
        HostError::Bridge { message, .. } => assert!(message.contains("Parse error on line 3")),
        other => panic!("Expected Bridge, got {other:?}"),
    }
}

#[test]
fn given_bridge_config_error_when_converted_then_config_variant() {
    let err = BridgeError::Config(ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: String::from("max_attempts must be at least 1"),
    });

    let host: HostError = err.into();

    assert!(matches!(host, HostError::Config { .. }));
}
