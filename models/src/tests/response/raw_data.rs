use crate::{HttpStatusCode, ModelError, PhpResponse, PhpResponseBuilder, PhpResponseData};

use std::collections::HashMap;

fn sample_response() -> PhpResponse {
    PhpResponseBuilder::default()
        .with_header("Content-Type", "application/json")
        .with_text(r#"{"hello":"world"}"#)
        .with_errors("Notice: undefined index")
        .with_exit_code(3)
        .with_status(404)
        .build()
        .unwrap()
}

/// **VALUE**: Verifies that converting to the raw record and back loses nothing.
///
/// **WHY THIS MATTERS**: The raw record is the only form that crosses a channel.
/// Any field dropped here is dropped for every remote caller.
///
/// **BUG THIS CATCHES**: Would catch a field missing from `to_raw_data()` or
/// `from_raw_data()`.
#[test]
fn given_response_when_raw_data_round_trips_then_all_fields_match() {
    // GIVEN: A response with every field populated
    let original = sample_response();

    // WHEN: Going through the raw record
    let rebuilt = PhpResponse::from_raw_data(original.to_raw_data()).unwrap();

    // THEN: Observably equal
    assert_eq!(rebuilt.headers(), original.headers());
    assert_eq!(rebuilt.bytes(), original.bytes());
    assert_eq!(rebuilt.errors(), original.errors());
    assert_eq!(rebuilt.exit_code(), original.exit_code());
    assert_eq!(rebuilt.http_status_code(), original.http_status_code());
}

/// **VALUE**: Verifies the raw record uses the field names other contexts expect.
///
/// **BUG THIS CATCHES**: Would catch a lost `rename_all = "camelCase"`, which would
/// make records unrecognizable to the response transfer handler.
#[test]
fn given_raw_data_when_serialized_then_uses_camel_case_fields() {
    // GIVEN: A raw record
    let data = sample_response().to_raw_data();

    // WHEN: Serializing to JSON
    let json = serde_json::to_value(&data).unwrap();

    // THEN: Every expected field exists
    for field in crate::RESPONSE_FIELDS {
        assert!(json.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(json["httpStatusCode"], 404);
    assert_eq!(json["exitCode"], 3);
}

/// **VALUE**: Verifies helper accessors survive reconstruction.
#[test]
fn given_json_body_when_parsed_then_returns_typed_value() {
    // GIVEN: A rebuilt response with a JSON body
    let response = PhpResponse::from_raw_data(sample_response().to_raw_data()).unwrap();

    // WHEN: Parsing the body
    let body: HashMap<String, String> = response.json().unwrap();

    // THEN: Data matches and text view agrees
    assert_eq!(body.get("hello").map(String::as_str), Some("world"));
    assert_eq!(response.text(), r#"{"hello":"world"}"#);
    assert!(!response.is_ok());
}

/// **VALUE**: Verifies non-JSON bodies produce a decode error instead of a panic.
#[test]
fn given_plain_body_when_parsed_as_json_then_returns_body_decode_error() {
    // GIVEN: A text body
    let response = PhpResponseBuilder::default()
        .with_text("<html></html>")
        .build()
        .unwrap();

    // WHEN
    let result: Result<serde_json::Value, ModelError> = response.json();

    // THEN
    assert!(matches!(result, Err(ModelError::BodyDecode { .. })));
}

/// **VALUE**: Verifies that a corrupt record is rejected on reconstruction.
#[test]
fn given_record_with_invalid_status_when_rebuilt_then_returns_validation_error() {
    // GIVEN: A record with status zero
    let data = PhpResponseData {
        http_status_code: HttpStatusCode(0),
        ..PhpResponseData::default()
    };

    // WHEN / THEN
    assert!(matches!(
        PhpResponse::from_raw_data(data),
        Err(ModelError::Validation { .. })
    ));
}
