use crate::channel::{Port, PortSender};
use crate::error::call::CallError;
use crate::rpc::wire::{RpcMessage, WireValue};
use crate::transfer::TransferContext;
use crate::value::{Value, display_path};

use common::ErrorLocation;

use std::collections::HashMap;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, trace};
use tokio::spawn as TokioSpawn;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

type Reply = Result<WireValue, String>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

/// Calling side of a port.
///
/// Cloning shares the same port and request table.
#[derive(Clone)]
pub struct Remote {
    inner: Arc<RemoteInner>,
}

struct RemoteInner {
    sender: PortSender,
    pending: Pending,
    next_id: AtomicU64,
    context: TransferContext,
    release_on_drop: bool,
    reader: JoinHandle<()>,
}

impl Remote {
    /// Call through a port shared for the lifetime of the endpoint.
    pub fn wrap(port: Port, context: TransferContext) -> Self {
        Self::bind(port, context, false)
    }

    /// Call through a port this remote owns outright.
    ///
    /// When the last clone is dropped a `Release` is sent so the serving side
    /// closes its end, and the local end is unbound.
    pub fn wrap_owned(port: Port, context: TransferContext) -> Self {
        Self::bind(port, context, true)
    }

    fn bind(mut port: Port, context: TransferContext, release_on_drop: bool) -> Self {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let sender = port.sender();
        let reader_pending = Arc::clone(&pending);

        let reader = TokioSpawn(async move {
            while let Some(message) = port.recv().await {
                let (id, reply) = match message {
                    RpcMessage::Return { id, value } => (id, Ok(value)),
                    RpcMessage::Throw { id, message } => (id, Err(message)),
                    other => {
                        trace!("Ignoring {} on calling port {}", other.describe(), port.id());
                        continue;
                    }
                };

                let waiter = reader_pending.lock().ok().and_then(|mut p| p.remove(&id));
                match waiter {
                    // The caller may have given up already; that is fine.
                    Some(waiter) => {
                        let _ = waiter.send(reply);
                    }
                    None => trace!("Reply #{id} has no waiting caller"),
                }
            }

            // Endpoint gone: wake every waiter with a disconnect.
            if let Ok(mut pending) = reader_pending.lock() {
                pending.clear();
            }
        });

        Self {
            inner: Arc::new(RemoteInner {
                sender,
                pending,
                next_id: AtomicU64::new(1),
                context,
                release_on_drop,
                reader,
            }),
        }
    }

    pub fn port_id(&self) -> Uuid {
        self.inner.sender.port()
    }

    /// Requests sent that have not been answered yet.
    pub fn pending_requests(&self) -> usize {
        self.inner
            .pending
            .lock()
            .map(|pending| pending.len())
            .unwrap_or_default()
    }

    /// Read the value at `path` on the other side.
    pub async fn get(&self, path: &[String]) -> Result<Value, CallError> {
        let path = path.to_vec();
        let value = self.request(|id| RpcMessage::Get { id, path }).await?;
        Ok(self.inner.context.decode(value)?)
    }

    /// Call the function at `path` on the other side.
    pub async fn call(&self, path: &[String], args: Vec<Value>) -> Result<Value, CallError> {
        let args = args
            .into_iter()
            .map(|arg| self.inner.context.encode(arg))
            .collect::<Result<Vec<_>, _>>()?;

        trace!("Calling {} on port {}", display_path(path), self.port_id());

        let path = path.to_vec();
        let value = self
            .request(|id| RpcMessage::Apply { id, path, args })
            .await?;
        Ok(self.inner.context.decode(value)?)
    }

    async fn request(&self, build: impl FnOnce(u64) -> RpcMessage) -> Result<WireValue, CallError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        if let Ok(mut pending) = self.inner.pending.lock() {
            pending.insert(id, tx);
        }
        let _slot = PendingSlot {
            pending: Arc::clone(&self.inner.pending),
            id,
        };

        self.inner.sender.send(build(id))?;

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(CallError::Thrown {
                message,
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(_) => Err(CallError::Disconnected {
                message: format!("Port {} closed before reply #{id}", self.port_id()),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

/// Frees a request's reply slot when the request finishes or is abandoned.
struct PendingSlot {
    pending: Pending,
    id: u64,
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.id);
        }
    }
}

impl Drop for RemoteInner {
    fn drop(&mut self) {
        if self.release_on_drop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if self.sender.send(RpcMessage::Release { id }).is_ok() {
                debug!("Released port {}", self.sender.port());
            }
        }
        self.reader.abort();
    }
}
