use crate::bridge_tests::helpers::{calculator, test_window_config, window_pair};

use bridge_core::error::ChannelError;
use bridge_core::{
    ChannelKind, CustomEvent, Function, ProbeConfig, TransferHandlers, Value, connect_window,
    consume_api, expose_api,
};
use models::PhpResponseBuilder;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

// ============================================================================
// Window-style channel: envelopes travel as JSON frames over loopback
// ============================================================================

/// **VALUE**: Verifies a full expose/consume round trip over a real WebSocket.
///
/// **WHY THIS MATTERS**: The window binding serializes every envelope to JSON. Anything
/// that only works when values are moved in memory breaks here.
///
/// **BUG THIS CATCHES**: Would catch frame encoding bugs, a listener that never routes
/// frames to ports, or numbers that do not survive JSON.
#[tokio::test]
async fn given_window_channel_when_consumer_calls_add_then_returns_sum() {
    // GIVEN: Parent exposes the calculator over a window channel
    let (parent, child) = window_pair().await;
    let handlers = TransferHandlers::with_defaults();
    let (resolver, _facade) = expose_api(calculator(), None, &parent, Arc::clone(&handlers));
    resolver.resolve();

    // WHEN: Child consumes and calls add(2, 3)
    let api = consume_api(&child, handlers, &ProbeConfig::default());
    let report = api.is_connected().await;
    api.is_ready().await.expect("isReady");
    let sum = api
        .call_method("add", vec![Value::from(2), Value::from(3)])
        .await
        .expect("add");

    // THEN: 5, over window-kind endpoints
    assert_eq!(parent.kind(), ChannelKind::Window);
    assert_eq!(child.kind(), ChannelKind::Window);
    assert!(report.connected);
    assert_eq!(sum, Value::from(5));
}

/// **VALUE**: Verifies responses, events and callbacks all cross a JSON channel intact.
///
/// **WHY THIS MATTERS**: These are the three kinds of value that need transfer handlers.
/// Over a window channel every one of them goes through JSON.
///
/// **BUG THIS CATCHES**: Would catch a handler payload that does not serialize, bytes
/// mangled by JSON, or a callback sub-channel that is not routed over the socket.
#[tokio::test]
async fn given_window_channel_when_special_values_cross_then_arrive_intact() {
    // GIVEN: Child echoes whatever it is given
    let (parent, child) = window_pair().await;
    let handlers = TransferHandlers::with_defaults();
    let (_resolver, _facade) = expose_api(calculator(), None, &child, Arc::clone(&handlers));
    let api = consume_api(&parent, handlers, &ProbeConfig::default());
    assert!(api.is_connected().await.connected);

    let response = PhpResponseBuilder::new()
        .with_status(500)
        .with_header("Content-Type", "application/json")
        .with_bytes(vec![0u8, 123, 255])
        .with_errors("Fatal error")
        .with_exit_code(255)
        .build()
        .expect("valid response");

    // WHEN: Echoing a response and an event
    let echoed_response = api
        .call_method("echo", vec![Value::Response(response.clone())])
        .await
        .expect("echo response");
    let echoed_event = api
        .call_method("echo", vec![CustomEvent::new("output", "line 1").into()])
        .await
        .expect("echo event");

    // THEN: Response is a response again, event arrives as its detail record
    assert_eq!(echoed_response, Value::Response(response));
    assert_eq!(
        echoed_event,
        Value::object([("detail", Value::from("line 1"))])
    );

    // WHEN: Echoing a callback and calling what comes back
    let (tx, mut rx) = mpsc::unbounded_channel();
    let callback = Function::sync(move |args| {
        let _ = tx.send(args.len());
        Ok(Value::from("called"))
    });
    let echoed = api
        .call_method("echo", vec![callback.into()])
        .await
        .expect("echo callback");
    let result = echoed
        .as_function()
        .expect("callback comes back callable")
        .call(vec![Value::from(1), Value::from(2), Value::from(3)])
        .await
        .expect("call echoed callback");

    // THEN: The original ran with all three arguments
    assert_eq!(result, Value::from("called"));
    assert_eq!(rx.recv().await, Some(3));
}

/// **VALUE**: Verifies NaN and the infinities cross a JSON channel as the same numbers.
///
/// **WHY THIS MATTERS**: JSON has no literal for them. Written as `null`, the frame no
/// longer decodes on the other side, and the call it carried would never be answered.
///
/// **BUG THIS CATCHES**: Would catch non-finite numbers falling back to serde_json's
/// default encoding, or the worker and window bindings disagreeing on what can cross.
#[tokio::test]
async fn given_window_channel_when_non_finite_numbers_cross_then_arrive_intact() {
    // GIVEN: Parent exposes the calculator over a window channel
    let (parent, child) = window_pair().await;
    let handlers = TransferHandlers::with_defaults();
    let (_resolver, _facade) = expose_api(calculator(), None, &parent, Arc::clone(&handlers));
    let api = consume_api(&child, handlers, &ProbeConfig::default());
    assert!(api.is_connected().await.connected);

    // WHEN: Echoing each non-finite value and adding to infinity
    let mut echoed = Vec::new();
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let result = timeout(
            Duration::from_secs(2),
            api.call_method("echo", vec![Value::from(value)]),
        )
        .await
        .expect("echo must be answered")
        .expect("echo");
        echoed.push(result.as_f64().expect("a number comes back"));
    }
    let sum = timeout(
        Duration::from_secs(2),
        api.call_method("add", vec![Value::from(f64::INFINITY), Value::from(1)]),
    )
    .await
    .expect("add must be answered")
    .expect("add");

    // THEN: Same values back
    assert!(echoed[0].is_nan());
    assert_eq!(echoed[1], f64::INFINITY);
    assert_eq!(echoed[2], f64::NEG_INFINITY);
    assert_eq!(sum, Value::from(f64::INFINITY));
}

/// **VALUE**: Verifies a request frame that does not decode is answered with a `Throw`.
///
/// **WHY THIS MATTERS**: A peer speaking a slightly different wire format must get an
/// error back, not a request that silently disappears.
///
/// **BUG THIS CATCHES**: Would catch undecodable frames being logged and dropped, which
/// leaves the remote caller waiting forever.
#[tokio::test]
async fn given_undecodable_request_frame_when_received_then_throw_sent_back() {
    // GIVEN: A listener exposing the calculator, and a raw WebSocket client
    let config = test_window_config();
    let listener = bridge_core::WindowListener::bind(&config)
        .await
        .expect("bind");
    let url = listener.url().expect("url");
    let (parent, raw) = tokio::join!(listener.accept(), connect_async(url.as_str()));
    let parent = parent.expect("accept");
    let (mut raw, _) = raw.expect("raw connect");
    let (_resolver, _facade) =
        expose_api(calculator(), None, &parent, TransferHandlers::with_defaults());

    // WHEN: Sending an Apply whose argument has an unknown encoding
    let frame = serde_json::json!({
        "port": "00000000-0000-0000-0000-000000000000",
        "message": {
            "type": "Apply",
            "id": 7,
            "path": ["echo"],
            "args": [{ "type": "Mystery", "value": 1 }]
        }
    });
    raw.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");

    // THEN: A Throw for request 7 comes back
    let reply = timeout(Duration::from_secs(2), raw.next())
        .await
        .expect("reply must arrive")
        .expect("stream open")
        .expect("frame");
    let reply: serde_json::Value =
        serde_json::from_str(reply.to_text().expect("text frame")).expect("json reply");
    assert_eq!(reply["message"]["type"], "Throw");
    assert_eq!(reply["message"]["id"], 7);
}

#[tokio::test]
async fn given_http_url_when_connect_window_then_rejected() {
    let url = Url::parse("http://127.0.0.1:19876").expect("url");

    let result = connect_window(&url, &test_window_config()).await;

    assert!(matches!(result, Err(ChannelError::Rejected { .. })));
}

/// **VALUE**: Verifies connecting gives up once the retry budget is spent.
///
/// **BUG THIS CATCHES**: Would catch an unbounded retry loop when the parent never starts.
#[tokio::test]
async fn given_nothing_listening_when_connect_window_then_handshake_error_after_budget() {
    // GIVEN: A port that was free a moment ago
    let port = {
        let probe = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        probe.local_addr().expect("addr").port()
    };
    let url = Url::parse(&format!("ws://127.0.0.1:{port}")).expect("url");
    let config = bridge_core::WindowConfig {
        connect_max_elapsed_ms: 300,
        ..test_window_config()
    };

    // WHEN: Connecting
    let result = tokio::time::timeout(Duration::from_secs(5), connect_window(&url, &config))
        .await
        .expect("connect_window must give up on its own");

    // THEN: Handshake error
    assert!(matches!(result, Err(ChannelError::Handshake { .. })));
}
