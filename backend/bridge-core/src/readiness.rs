//! Two-stage readiness of an exposed API.
//!
//! *Connected* means the channel answers calls; the exposer reaches it as
//! soon as it publishes. *Ready* means the API finished its own start-up and
//! is reached only when the owner of the facade calls
//! [`ReadyResolver::resolve`]. Both are one-way: once reached, never lost.

use std::future::pending;
use std::sync::Arc;

use log::info;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadinessState {
    Uninitialized,
    Connected,
    Ready,
}

/// Observable readiness. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Readiness {
    state: Arc<watch::Sender<ReadinessState>>,
}

/// One-shot handle that marks an API ready.
///
/// Consumed on use, so ready can only be signalled once. Dropping it without
/// resolving leaves every `ready()` waiter pending for good.
#[derive(Debug)]
pub struct ReadyResolver {
    state: Arc<watch::Sender<ReadinessState>>,
}

impl Readiness {
    pub fn new() -> (Readiness, ReadyResolver) {
        let (state, _) = watch::channel(ReadinessState::Uninitialized);
        let state = Arc::new(state);

        (
            Readiness {
                state: Arc::clone(&state),
            },
            ReadyResolver { state },
        )
    }

    pub fn state(&self) -> ReadinessState {
        *self.state.borrow()
    }

    /// Record that the API is published and answering calls.
    pub fn mark_connected(&self) {
        self.state.send_if_modified(|state| {
            if *state < ReadinessState::Connected {
                *state = ReadinessState::Connected;
                true
            } else {
                false
            }
        });
    }

    /// Resolves once the API is connected.
    pub async fn connected(&self) {
        self.reach(ReadinessState::Connected).await;
    }

    /// Resolves once the API is ready; never resolves otherwise.
    pub async fn ready(&self) {
        self.reach(ReadinessState::Ready).await;
    }

    async fn reach(&self, wanted: ReadinessState) {
        let mut receiver = self.state.subscribe();
        if receiver.wait_for(|state| *state >= wanted).await.is_err() {
            // Unreachable while `self` holds the sender.
            pending::<()>().await;
        }
    }
}

impl ReadyResolver {
    /// Mark the API ready, waking every waiter.
    pub fn resolve(self) {
        let changed = self.state.send_if_modified(|state| {
            if *state < ReadinessState::Ready {
                *state = ReadinessState::Ready;
                true
            } else {
                false
            }
        });

        if changed {
            info!("API marked ready");
        }
    }
}
