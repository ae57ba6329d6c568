use crate::{HttpStatusCode, ModelError, PhpResponseBuilder};

/// **VALUE**: Verifies that builder validation rejects out-of-range status codes.
///
/// **WHY THIS MATTERS**: A response with status 0 or 700 cannot come from a real
/// HTTP exchange; letting one through would poison every `is_ok()` check downstream.
///
/// **BUG THIS CATCHES**: Would catch if the range check is removed or inverted.
#[test]
fn given_invalid_status_when_building_response_then_returns_validation_error() {
    // GIVEN: Builder with status outside 100-599
    let builder = PhpResponseBuilder::default().with_status(700);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result.unwrap_err() {
        ModelError::Validation { message, .. } => {
            assert_eq!(message, "Invalid HTTP status code: 700");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

/// **VALUE**: Verifies builder defaults.
///
/// **BUG THIS CATCHES**: Would catch if the default status drifts away from 200
/// or the exit code defaults to something non-zero.
#[test]
fn given_empty_builder_when_building_then_defaults_to_ok_response() {
    // GIVEN: No fields set
    let builder = PhpResponseBuilder::default();

    // WHEN: Building
    let response = builder.build().unwrap();

    // THEN: 200, exit code 0, empty body
    assert_eq!(response.http_status_code(), HttpStatusCode::OK);
    assert_eq!(response.exit_code(), 0);
    assert!(response.bytes().is_empty());
    assert!(response.is_ok());
}

/// **VALUE**: Verifies that repeated headers accumulate and lookups ignore case.
///
/// **WHY THIS MATTERS**: `Set-Cookie` and friends legitimately repeat; collapsing
/// them would silently drop data produced by the runtime.
#[test]
fn given_repeated_header_when_building_then_values_accumulate() {
    // GIVEN: Two values for the same header
    let response = PhpResponseBuilder::default()
        .with_header("Set-Cookie", "a=1")
        .with_header("Set-Cookie", "b=2")
        .build()
        .unwrap();

    // WHEN: Looking up with different casing
    let values = response.header("set-cookie");

    // THEN: Both values are present in order
    assert_eq!(values, Some(&[String::from("a=1"), String::from("b=2")][..]));
}

/// **VALUE**: Verifies empty header names are rejected.
#[test]
fn given_blank_header_name_when_building_then_returns_validation_error() {
    // GIVEN: A blank header name
    let builder = PhpResponseBuilder::default().with_header("  ", "x");

    // WHEN / THEN
    assert!(matches!(
        builder.build(),
        Err(ModelError::Validation { .. })
    ));
}
