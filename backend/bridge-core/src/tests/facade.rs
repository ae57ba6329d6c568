// Unit tests for expose_api / consume_api over an in-process channel
// Window-style (WebSocket) scenarios are in integration_tests/bridge_tests/

use crate::channel::Endpoint;
use crate::config::ProbeConfig;
use crate::error::call::CallError;
use crate::facade::{MethodSet, consume_api, expose_api};
use crate::proxy::ProxyHandle;
use crate::rpc::ApiTarget;
use crate::transfer::TransferHandlers;
use crate::value::{Value, display_path, path};

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::time::timeout;

fn adder() -> MethodSet {
    MethodSet::new().sync_method("add", |args| {
        let a = args.first().and_then(Value::as_f64).unwrap_or_default();
        let b = args.get(1).and_then(Value::as_f64).unwrap_or_default();
        Ok(Value::from(a + b))
    })
}

/// **VALUE**: Verifies the basic round trip: a method exposed on one side is callable from
/// the other with the expected result.
///
/// **WHY THIS MATTERS**: This is the whole point of the bridge.
///
/// **BUG THIS CATCHES**: Would catch broken argument encoding, a facade that is not served
/// on the root port, or replies that never reach the caller.
#[tokio::test]
async fn given_exposed_add_when_consumer_calls_add_then_returns_sum() {
    // GIVEN: `add` exposed on the worker side
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let (_resolver, _facade) = expose_api(adder(), None, &worker, Arc::clone(&handlers));

    // WHEN: The host consumes and calls add(2, 3)
    let api = consume_api(&host, handlers, &ProbeConfig::default());
    assert!(api.is_connected().await.connected);
    let result = api
        .call_method("add", vec![Value::from(2), Value::from(3)])
        .await
        .expect("add should succeed");

    // THEN: 5
    assert_eq!(result, Value::from(5));
}

/// **VALUE**: Verifies `isReady` stays pending while the exposer has not resolved readiness.
///
/// **WHY THIS MATTERS**: The API may need time to finish its own start-up after it is
/// published. Reporting ready early lets callers race that start-up.
///
/// **BUG THIS CATCHES**: Would catch `isReady` answering as soon as the channel is up.
#[tokio::test]
async fn given_resolver_never_called_when_consumer_awaits_is_ready_then_stays_pending() {
    // GIVEN: Exposed API whose resolver is held but never called
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let (_resolver, _facade) = expose_api(adder(), None, &worker, Arc::clone(&handlers));
    let api = consume_api(&host, handlers, &ProbeConfig::default());

    // WHEN: Connected, then awaiting ready
    let report = api.is_connected().await;
    let ready = timeout(Duration::from_millis(300), api.is_ready()).await;

    // THEN: Connected, never ready, and other calls still go through
    assert!(report.connected);
    assert!(ready.is_err(), "isReady must stay pending");
    let sum = api
        .call_method("add", vec![Value::from(1), Value::from(1)])
        .await
        .expect("calls keep working while isReady waits");
    assert_eq!(sum, Value::from(2));
}

#[tokio::test]
async fn given_resolver_called_when_consumer_awaits_is_ready_then_resolves() {
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let (resolver, _facade) = expose_api(adder(), None, &worker, Arc::clone(&handlers));
    let api = consume_api(&host, handlers, &ProbeConfig::default());

    let waiting = {
        let api = api.clone();
        tokio::spawn(async move { api.is_ready().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    resolver.resolve();

    let outcome = timeout(Duration::from_secs(1), waiting)
        .await
        .expect("isReady should resolve")
        .expect("task");
    assert!(outcome.is_ok());
}

/// **VALUE**: Verifies the probe retries through the window where the other side has not
/// published yet.
///
/// **WHY THIS MATTERS**: Host and worker start concurrently. The first probe request can
/// arrive before `expose_api` runs and is dropped unanswered.
///
/// **BUG THIS CATCHES**: Would catch the probe giving up after the first lost request, or
/// surfacing the race as an error.
#[tokio::test]
async fn given_late_exposer_when_consumer_checks_connection_then_connects_within_bounds() {
    // GIVEN: A consumer that starts before anything is exposed
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let api = consume_api(&host, Arc::clone(&handlers), &ProbeConfig::default());

    // WHEN: The exposer publishes 300ms later
    let exposer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        expose_api(adder(), None, &worker, handlers)
    });
    let report = api.is_connected().await;
    let (_resolver, _facade) = exposer.await.expect("exposer task");

    // THEN: Connected after at least one retry, never more than the limit
    assert!(report.connected);
    assert!(report.attempts >= 2, "attempts = {}", report.attempts);
    assert!(report.attempts <= 10, "attempts = {}", report.attempts);
}

/// Piped target answering every name it does not define with `"piped:<path>"`.
struct PipedStub(ProxyHandle);

impl ApiTarget for PipedStub {
    fn read<'a>(&'a self, path: &'a [String]) -> BoxFuture<'a, Result<Value, CallError>> {
        async move {
            match path.first() {
                Some(name) if self.0.contains(name) => self.0.read(path).await,
                _ => Ok(Value::from(format!("piped:{}", display_path(path)))),
            }
        }
        .boxed()
    }

    fn invoke<'a>(
        &'a self,
        path: &'a [String],
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value, CallError>> {
        self.0.invoke(path, args)
    }
}

/// **VALUE**: Verifies lookups fall back to the piped target in the documented order.
///
/// **WHY THIS MATTERS**: Piping lets one API re-export another. Own methods must shadow
/// piped ones, and names in neither must still be answered by the piped target.
///
/// **BUG THIS CATCHES**: Would catch the piped target being consulted first, or unknown
/// names failing instead of reading as the piped lookup.
#[tokio::test]
async fn given_primary_and_piped_sets_when_looked_up_then_resolved_in_order() {
    // GIVEN: Primary {foo} piped to {bar}
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let primary = MethodSet::new().sync_method("foo", |_| Ok(Value::from("foo from primary")));
    let piped = MethodSet::new()
        .sync_method("bar", |_| Ok(Value::from("bar from piped")))
        .sync_method("foo", |_| Ok(Value::from("foo from piped")));
    let piped: Arc<dyn ApiTarget> = Arc::new(PipedStub(ProxyHandle::wrap(piped)));
    let (_resolver, facade) = expose_api(primary, Some(piped), &worker, Arc::clone(&handlers));
    let api = consume_api(&host, handlers, &ProbeConfig::default());

    // WHEN: Calling each name remotely
    let foo = api.call_method("foo", Vec::new()).await.expect("foo");
    let bar = api.call_method("bar", Vec::new()).await.expect("bar");
    let neither = api.get(&path(["baz"])).await.expect("baz lookup");

    // THEN: foo from primary, bar from piped, baz answered by the piped target
    assert_eq!(foo, Value::from("foo from primary"));
    assert_eq!(bar, Value::from("bar from piped"));
    assert_eq!(neither, Value::from("piped:baz"));
    assert_eq!(
        facade.get(&path(["baz"])).await.expect("local lookup"),
        Value::from("piped:baz")
    );
}

#[tokio::test]
async fn given_no_piped_set_when_calling_unknown_method_then_not_callable_message() {
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let (_resolver, facade) = expose_api(adder(), None, &worker, Arc::clone(&handlers));
    let api = consume_api(&host, handlers, &ProbeConfig::default());

    let local = facade.call(&path(["subtract"]), Vec::new()).await;
    let remote = api.call_method("subtract", Vec::new()).await;

    assert!(matches!(local, Err(CallError::NotCallable { .. })));
    assert_eq!(facade.get(&path(["subtract"])).await.expect("read"), Value::Undefined);
    match remote {
        Err(CallError::Thrown { message, .. }) => assert!(message.contains("subtract")),
        other => panic!("Expected thrown error, got {other:?}"),
    }
}

/// **VALUE**: Verifies a callback passed as an argument can be called back by the exposer.
///
/// **BUG THIS CATCHES**: Would catch arguments skipping the transfer handlers, so that a
/// function argument fails to encode.
#[tokio::test]
async fn given_callback_argument_when_exposer_invokes_it_then_consumer_receives_call() {
    // GIVEN: An exposed method that calls its first argument with "ping"
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let methods = MethodSet::new().method("notify", |args: Vec<Value>| async move {
        match args.first().and_then(Value::as_function) {
            Some(callback) => callback.call(vec![Value::from("ping")]).await,
            None => Err(CallError::thrown("notify expects a callback")),
        }
    });
    let (_resolver, _facade) = expose_api(methods, None, &worker, Arc::clone(&handlers));
    let api = consume_api(&host, handlers, &ProbeConfig::default());

    // WHEN: The consumer passes a local callback
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let callback = crate::value::Function::sync(move |args| {
        let _ = tx.send(args.first().cloned().unwrap_or_default());
        Ok(Value::from("pong"))
    });
    let reply = api
        .call_method("notify", vec![callback.into()])
        .await
        .expect("notify");

    // THEN: The callback ran on the consumer side and its result made it back
    assert_eq!(rx.recv().await, Some(Value::from("ping")));
    assert_eq!(reply, Value::from("pong"));
}

#[tokio::test]
async fn given_nested_method_when_called_through_node_then_reaches_it() {
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let methods = MethodSet::new()
        .nested("math", adder())
        .value("version", "1.2.0");
    let (_resolver, _facade) = expose_api(methods, None, &worker, Arc::clone(&handlers));
    let api = consume_api(&host, handlers, &ProbeConfig::default());

    let node = api.at("math").at("add");
    let sum = node
        .call(vec![Value::from(4), Value::from(5)])
        .await
        .expect("nested add");
    let version = api.at("version").get().await.expect("version");

    assert_eq!(node.path(), ["math".to_string(), "add".to_string()]);
    assert_eq!(sum, Value::from(9));
    assert_eq!(version, Value::from("1.2.0"));
}

/// **VALUE**: Verifies a consumed API can be piped into another exposer and re-exported.
///
/// **WHY THIS MATTERS**: A middle context (a window hosting a worker, say) republishes
/// the worker's API to its own parent without wrapping every method by hand.
///
/// **BUG THIS CATCHES**: Would catch `RemoteApi` lookups not forwarding the full path, or
/// re-exported calls losing their arguments on the second hop.
#[tokio::test]
async fn given_consumed_api_piped_when_outer_consumer_calls_then_reaches_inner_exposer() {
    // GIVEN: inner exposes add; middle consumes it and re-exposes it piped under {name}
    let handlers = TransferHandlers::with_defaults();
    let (middle_in, inner) = Endpoint::worker_pair();
    let (outer, middle_out) = Endpoint::worker_pair();
    let (_inner_resolver, _inner_facade) =
        expose_api(adder(), None, &inner, Arc::clone(&handlers));
    let inner_api = consume_api(&middle_in, Arc::clone(&handlers), &ProbeConfig::default());
    assert!(inner_api.is_connected().await.connected);

    let piped: Arc<dyn ApiTarget> = Arc::new(inner_api);
    let middle = MethodSet::new().value("name", "middle");
    let (_middle_resolver, _middle_facade) =
        expose_api(middle, Some(piped), &middle_out, Arc::clone(&handlers));

    // WHEN: The outer consumer calls both its direct member and the re-exported one
    let api = consume_api(&outer, handlers, &ProbeConfig::default());
    assert!(api.is_connected().await.connected);
    let name = api.at("name").get().await.expect("name");
    let sum = api
        .call_method("add", vec![Value::from(7), Value::from(8)])
        .await
        .expect("re-exported add");

    // THEN
    assert_eq!(name, Value::from("middle"));
    assert_eq!(sum, Value::from(15));
}

/// **VALUE**: Verifies both sides of one channel can expose and consume at the same time.
///
/// **WHY THIS MATTERS**: The host calls into the isolated context and the isolated
/// context calls back into the host over the same channel. Requests must reach the
/// serving side and replies the calling side, whatever order the two sides set up in.
///
/// **BUG THIS CATCHES**: Would catch one role's binding on the root port replacing the
/// other's, which makes the first consumer's calls fail as disconnected.
#[tokio::test]
async fn given_both_sides_expose_and_consume_when_calling_each_way_then_both_answer() {
    // GIVEN: worker exposes, host consumes, host exposes, worker consumes
    let (host, worker) = Endpoint::worker_pair();
    let handlers = TransferHandlers::with_defaults();
    let (_worker_resolver, _worker_facade) =
        expose_api(adder(), None, &worker, Arc::clone(&handlers));
    let worker_api = consume_api(&host, Arc::clone(&handlers), &ProbeConfig::default());
    let host_methods =
        MethodSet::new().sync_method("hostName", |_| Ok(Value::from("bridge-host")));
    let (_host_resolver, _host_facade) =
        expose_api(host_methods, None, &host, Arc::clone(&handlers));
    let host_api = consume_api(&worker, handlers, &ProbeConfig::default());

    // WHEN: Each side calls the other
    assert!(worker_api.is_connected().await.connected);
    assert!(host_api.is_connected().await.connected);
    let sum = worker_api
        .call_method("add", vec![Value::from(2), Value::from(3)])
        .await
        .expect("host -> worker add");
    let name = host_api
        .call_method("hostName", Vec::new())
        .await
        .expect("worker -> host hostName");

    // THEN: Both answered
    assert_eq!(sum, Value::from(5));
    assert_eq!(name, Value::from("bridge-host"));
}
