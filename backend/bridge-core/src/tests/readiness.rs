// Unit tests for the readiness protocol

use crate::readiness::{Readiness, ReadinessState};

use std::time::Duration;

use tokio::time::timeout;

/// **VALUE**: Verifies `ready()` stays pending while the resolver has not been called.
///
/// **WHY THIS MATTERS**: Consumers wait on readiness before issuing real work. Resolving
/// early would let them call into an API that has not finished starting.
///
/// **BUG THIS CATCHES**: Would catch `ready()` resolving on `connected`, or resolving when
/// the resolver is dropped.
#[tokio::test]
async fn given_connected_only_when_await_ready_then_stays_pending() {
    // GIVEN: Connected but not ready
    let (readiness, resolver) = Readiness::new();
    readiness.mark_connected();

    // WHEN: Awaiting both signals
    let connected = timeout(Duration::from_millis(100), readiness.connected()).await;
    let ready = timeout(Duration::from_millis(200), readiness.ready()).await;

    // THEN: Connected resolves, ready does not
    assert!(connected.is_ok(), "connected should resolve");
    assert!(ready.is_err(), "ready must stay pending");

    // Dropping the resolver never makes it ready either
    drop(resolver);
    assert!(
        timeout(Duration::from_millis(100), readiness.ready())
            .await
            .is_err()
    );
    assert_eq!(readiness.state(), ReadinessState::Connected);
}

#[tokio::test]
async fn given_waiter_when_resolver_called_then_waiter_wakes() {
    // GIVEN: A task waiting on ready
    let (readiness, resolver) = Readiness::new();
    let waiter = {
        let readiness = readiness.clone();
        tokio::spawn(async move { readiness.ready().await })
    };

    // WHEN: The owner resolves
    readiness.mark_connected();
    resolver.resolve();

    // THEN: The waiter completes and the state is terminal
    timeout(Duration::from_secs(1), waiter)
        .await
        .expect("ready should resolve")
        .expect("waiter task");
    assert_eq!(readiness.state(), ReadinessState::Ready);
}

#[tokio::test]
async fn given_ready_when_mark_connected_again_then_state_stays_ready() {
    let (readiness, resolver) = Readiness::new();
    resolver.resolve();

    readiness.mark_connected();

    assert_eq!(readiness.state(), ReadinessState::Ready);
    assert!(
        timeout(Duration::from_millis(50), readiness.connected())
            .await
            .is_ok(),
        "ready implies connected"
    );
}

#[test]
fn given_new_readiness_then_uninitialized() {
    let (readiness, _resolver) = Readiness::new();

    assert_eq!(readiness.state(), ReadinessState::Uninitialized);
    assert!(ReadinessState::Connected < ReadinessState::Ready);
}
