//! Channel endpoints and the ports multiplexed over them.
//!
//! An [`Endpoint`] is one side of a bidirectional channel to another
//! execution context. Everything it carries is an [`Envelope`] addressed to
//! a port id. Each side binds a [`Port`] for the ids it listens on; the
//! endpoint's router task hands incoming messages to the matching port.
//!
//! # Roles
//!
//! A port id is bound once per [`PortRole`]. Requests go to the serving
//! binding and replies to the calling binding, so one side can expose an
//! API and consume the peer's API over the same root port at once.
//!
//! # Unbound ports
//!
//! Messages addressed to a port nobody has bound yet are dropped. A consumer
//! that talks before the other side has published its API therefore gets no
//! answer at all, which is what the connectivity probe in
//! [`crate::facade::probe`] retries around.

use crate::error::channel::ChannelError;
use crate::rpc::wire::{Envelope, RpcMessage};

use common::ErrorLocation;

use std::collections::HashMap;
use std::panic::Location;
use std::sync::{Arc, Mutex};

use log::{debug, trace, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Port every facade is published on.
pub const ROOT_PORT: Uuid = Uuid::nil();

/// How the other execution context is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// In-process context (task or thread); messages are moved, not encoded.
    Worker,
    /// Separate frame or process over a loopback WebSocket; JSON frames.
    Window,
}

/// Which half of a port's traffic a binding receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortRole {
    /// Requests (`Get`, `Apply`, `Release`) to answer.
    Serving,
    /// Replies (`Return`, `Throw`) to requests this side sent.
    Calling,
}

struct Route {
    token: Uuid,
    sender: mpsc::UnboundedSender<RpcMessage>,
}

type Routes = Arc<Mutex<HashMap<(Uuid, PortRole), Route>>>;

/// One side of a bidirectional message channel.
///
/// Cloning is cheap; all clones share the same outgoing queue and router.
#[derive(Clone)]
pub struct Endpoint {
    kind: ChannelKind,
    outgoing: mpsc::UnboundedSender<Envelope>,
    routes: Routes,
}

impl Endpoint {
    /// Two in-process endpoints wired to each other.
    ///
    /// Must be called from within a tokio runtime. Use [`worker_channel`]
    /// when the second endpoint belongs to a different runtime.
    pub fn worker_pair() -> (Endpoint, Endpoint) {
        let (host, worker) = worker_channel();
        (host.into_endpoint(), worker.into_endpoint())
    }

    /// Build an endpoint from raw queues and start routing `incoming`.
    pub(crate) fn from_queues(
        kind: ChannelKind,
        outgoing: mpsc::UnboundedSender<Envelope>,
        incoming: mpsc::UnboundedReceiver<Envelope>,
    ) -> Self {
        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(route_incoming(incoming, Arc::clone(&routes)));

        Self {
            kind,
            outgoing,
            routes,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Bind the local `role` end of port `id`.
    ///
    /// Binding an id and role that is already bound replaces the previous
    /// binding; the old [`Port`] stops receiving.
    pub fn port(&self, id: Uuid, role: PortRole) -> Port {
        let (sender, incoming) = mpsc::unbounded_channel();
        let token = Uuid::new_v4();

        if let Ok(mut routes) = self.routes.lock() {
            if routes.insert((id, role), Route { token, sender }).is_some() {
                warn!("Port {id} ({role:?}) was already bound, replacing previous binding");
            }
        }

        trace!("Bound {role:?} port {id} on {:?} endpoint", self.kind);

        Port {
            id,
            role,
            token,
            incoming,
            sender: PortSender {
                port: id,
                outgoing: self.outgoing.clone(),
            },
            routes: Arc::clone(&self.routes),
        }
    }

    /// Bind the `role` end of the port facades are published on.
    pub fn root_port(&self, role: PortRole) -> Port {
        self.port(ROOT_PORT, role)
    }

    /// Open a fresh sub-channel and bind its local `role` end.
    ///
    /// The returned port's id is what the other side binds, in the opposite
    /// role, to talk back.
    pub fn open_port(&self, role: PortRole) -> Port {
        self.port(Uuid::new_v4(), role)
    }

    /// Number of ports currently bound on this side.
    pub fn bound_ports(&self) -> usize {
        self.routes.lock().map(|routes| routes.len()).unwrap_or_default()
    }
}

/// Unbound half of an in-process channel.
///
/// Lets each execution context create its endpoint inside its own runtime.
pub struct WorkerChannel {
    outgoing: mpsc::UnboundedSender<Envelope>,
    incoming: mpsc::UnboundedReceiver<Envelope>,
}

impl WorkerChannel {
    /// Start routing; must be called from within a tokio runtime.
    pub fn into_endpoint(self) -> Endpoint {
        Endpoint::from_queues(ChannelKind::Worker, self.outgoing, self.incoming)
    }
}

/// Create the two halves of an in-process channel.
pub fn worker_channel() -> (WorkerChannel, WorkerChannel) {
    let (to_worker, worker_incoming) = mpsc::unbounded_channel();
    let (to_host, host_incoming) = mpsc::unbounded_channel();

    (
        WorkerChannel {
            outgoing: to_worker,
            incoming: host_incoming,
        },
        WorkerChannel {
            outgoing: to_host,
            incoming: worker_incoming,
        },
    )
}

/// Sending half of a port. Cheap to clone and usable from `Drop`.
#[derive(Clone)]
pub struct PortSender {
    port: Uuid,
    outgoing: mpsc::UnboundedSender<Envelope>,
}

impl PortSender {
    pub fn port(&self) -> Uuid {
        self.port
    }

    #[track_caller]
    pub fn send(&self, message: RpcMessage) -> Result<(), ChannelError> {
        self.outgoing
            .send(Envelope {
                port: self.port,
                message,
            })
            .map_err(|_| ChannelError::Closed {
                message: format!("Cannot send on port {}: endpoint closed", self.port),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Local end of a (sub-)channel.
///
/// Dropping the port unbinds it from its endpoint.
pub struct Port {
    id: Uuid,
    role: PortRole,
    token: Uuid,
    incoming: mpsc::UnboundedReceiver<RpcMessage>,
    sender: PortSender,
    routes: Routes,
}

impl Port {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> PortRole {
        self.role
    }

    pub fn sender(&self) -> PortSender {
        self.sender.clone()
    }

    /// Next message for this port, or `None` once the endpoint is gone.
    pub async fn recv(&mut self) -> Option<RpcMessage> {
        self.incoming.recv().await
    }
}

impl Drop for Port {
    fn drop(&mut self) {
        if let Ok(mut routes) = self.routes.lock() {
            let key = (self.id, self.role);
            if routes.get(&key).is_some_and(|r| r.token == self.token) {
                routes.remove(&key);
                trace!("Unbound {:?} port {}", self.role, self.id);
            }
        }
    }
}

async fn route_incoming(mut incoming: mpsc::UnboundedReceiver<Envelope>, routes: Routes) {
    while let Some(envelope) = incoming.recv().await {
        let key = (envelope.port, envelope.message.recipient());
        let sender = routes
            .lock()
            .ok()
            .and_then(|routes| routes.get(&key).map(|r| r.sender.clone()));

        match sender {
            Some(sender) => {
                if sender.send(envelope.message).is_err() {
                    trace!("Port {} closed, dropping message", envelope.port);
                }
            }
            None => {
                trace!(
                    "No {:?} listener on port {}, dropping {}",
                    key.1,
                    envelope.port,
                    envelope.message.describe()
                );
            }
        }
    }

    debug!("Endpoint incoming stream ended, closing all ports");

    // Dropping the senders ends every bound port's stream.
    if let Ok(mut routes) = routes.lock() {
        routes.clear();
    }
}
