use bridge_core::error::ChannelError;

use std::io::Error as IoError;
use std::io::ErrorKind;

/// **VALUE**: Verifies that I/O failures converted with `?` keep the conversion site.
///
/// **WHY THIS MATTERS**: Binding, accepting and reading all surface as `ChannelError::Io`.
/// The location tells which step of the window binding failed.
///
/// **BUG THIS CATCHES**: Would catch if the `From<IoError>` impl loses `#[track_caller]`.
#[test]
fn given_io_error_when_converted_then_io_variant_with_location() {
    // GIVEN: An I/O failure
    let io_err = IoError::new(ErrorKind::AddrInUse, "address already in use");

    // WHEN: Converting
    let err = ChannelError::from(io_err);

    // THEN: Io variant carrying message and this file's location
    assert!(matches!(err, ChannelError::Io { .. }));
    let error_string = err.to_string();
    assert!(error_string.contains("IO Error"));
    assert!(error_string.contains("address already in use"));
    assert!(error_string.contains("channel.rs"));
}

#[test]
fn given_bad_json_when_converted_then_codec_variant() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ nope").expect_err("invalid json");

    let err = ChannelError::from(json_err);

    assert!(matches!(err, ChannelError::Codec { .. }));
    assert!(err.to_string().contains("Codec Error"));
}
