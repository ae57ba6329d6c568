use bridge_core::error::{BridgeError, CallError, ChannelError, TransferError};
use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `CallError::thrown` records where the error was raised.
///
/// **WHY THIS MATTERS**: Exposed methods report failures with `CallError::thrown`. When the
/// message reaches the other side the location is what tells a developer which method
/// failed locally.
///
/// **BUG THIS CATCHES**: Would catch if someone removes `#[track_caller]` from `thrown()`,
/// making every thrown error point into the error module instead of the method body.
#[test]
fn given_thrown_error_when_formatted_then_includes_caller_location() {
    // GIVEN: An error raised from this file
    let err = CallError::thrown("Script timed out");

    // WHEN: Formatting
    let error_string = format!("{}", err);

    // THEN: Type, message and this file's location
    assert!(error_string.contains("Remote Error"));
    assert!(error_string.contains("Script timed out"));
    assert!(error_string.contains("call.rs"));
}

/// **VALUE**: Verifies only the message of a failure is sent to the remote caller.
///
/// **WHY THIS MATTERS**: Source locations of one context mean nothing in the other and
/// leak file paths across the channel.
///
/// **BUG THIS CATCHES**: Would catch the full Display output (with location) being used
/// as the remote message.
#[test]
#[track_caller]
fn given_call_errors_when_remote_message_then_message_only() {
    let thrown = CallError::thrown("bad input");
    let not_callable = CallError::NotCallable {
        message: "version is a string, not a function".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    assert_eq!(thrown.remote_message(), "bad input");
    assert_eq!(
        not_callable.remote_message(),
        "version is a string, not a function"
    );
}

#[test]
#[track_caller]
fn given_nested_errors_when_converted_then_transparent() {
    // GIVEN: A transfer error
    let transfer = TransferError::UnknownHandler {
        message: "No transfer handler named Blob".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Lifted into a call error and then a bridge error
    let call: CallError = transfer.into();
    let bridge: BridgeError = call.into();

    // THEN: Display passes straight through
    let error_string = bridge.to_string();
    assert!(error_string.contains("Unknown Handler Error"));
    assert!(error_string.contains("Blob"));

    let closed: BridgeError = ChannelError::Closed {
        message: "endpoint closed".to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
    .into();
    assert!(closed.to_string().contains("Channel Closed Error"));
}
