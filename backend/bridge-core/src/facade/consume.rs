use crate::channel::{Endpoint, PortRole};
use crate::config::ProbeConfig;
use crate::error::call::CallError;
use crate::facade::expose::{IS_CONNECTED, IS_READY};
use crate::facade::probe::{ConnectionProbe, ProbeReport};
use crate::rpc::{ApiTarget, Remote};
use crate::transfer::{TransferContext, TransferHandlers};
use crate::value::{PropertyPath, Value};

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{info, warn};

/// Calling side of an API exposed on the other end of a channel.
///
/// Cloning shares the same connection.
#[derive(Clone)]
pub struct RemoteApi {
    remote: Remote,
    probe: ConnectionProbe,
}

/// Bind to the API the other side of `endpoint` exposes.
///
/// Nothing is sent yet; call [`RemoteApi::is_connected`] before the first
/// real call if the other side may not have published yet.
///
/// Must be called from within a tokio runtime.
pub fn consume_api(
    endpoint: &Endpoint,
    handlers: Arc<TransferHandlers>,
    probe: &ProbeConfig,
) -> RemoteApi {
    handlers.install_defaults();

    let context = TransferContext::new(handlers, endpoint.clone());
    let remote = Remote::wrap(endpoint.root_port(PortRole::Calling), context);

    info!("Consuming API over {:?} endpoint", endpoint.kind());

    RemoteApi {
        remote,
        probe: probe.connection_probe(),
    }
}

impl RemoteApi {
    /// Wait until the other side answers, retrying while it has not published.
    ///
    /// Never fails; a remote that never shows up yields a report with
    /// `connected == false` once every attempt is used up.
    pub async fn is_connected(&self) -> ProbeReport {
        let remote = &self.remote;
        let path: &[String] = &[IS_CONNECTED.to_string()];

        let report = self
            .probe
            .run(|| async move { remote.call(path, Vec::new()).await.map(|_| ()) })
            .await;

        if !report.connected {
            warn!("Remote API did not answer after {} attempts", report.attempts);
        }
        report
    }

    /// Resolves once the other side marks its API ready.
    pub async fn is_ready(&self) -> Result<(), CallError> {
        self.remote
            .call(&[IS_READY.to_string()], Vec::new())
            .await
            .map(|_| ())
    }

    pub async fn get(&self, path: &[String]) -> Result<Value, CallError> {
        self.remote.get(path).await
    }

    pub async fn call(&self, path: &[String], args: Vec<Value>) -> Result<Value, CallError> {
        self.remote.call(path, args).await
    }

    /// Call a top-level method by name.
    pub async fn call_method(&self, name: &str, args: Vec<Value>) -> Result<Value, CallError> {
        self.remote.call(&[name.to_string()], args).await
    }

    /// Node for a member of the remote API.
    pub fn at(&self, name: &str) -> RemoteNode {
        RemoteNode {
            remote: self.remote.clone(),
            path: vec![name.to_string()],
        }
    }

    /// Requests still waiting for a reply, abandoned probe attempts excluded.
    pub fn pending_requests(&self) -> usize {
        self.remote.pending_requests()
    }
}

impl ApiTarget for RemoteApi {
    fn read<'a>(&'a self, path: &'a [String]) -> BoxFuture<'a, Result<Value, CallError>> {
        self.remote.get(path).boxed()
    }

    fn invoke<'a>(
        &'a self,
        path: &'a [String],
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value, CallError>> {
        self.remote.call(path, args).boxed()
    }
}

/// A member of a remote API, addressed by path. Nothing is sent until it is
/// read or called.
#[derive(Clone)]
pub struct RemoteNode {
    remote: Remote,
    path: PropertyPath,
}

impl RemoteNode {
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn at(&self, name: &str) -> RemoteNode {
        let mut path = self.path.clone();
        path.push(name.to_string());
        RemoteNode {
            remote: self.remote.clone(),
            path,
        }
    }

    pub async fn get(&self) -> Result<Value, CallError> {
        self.remote.get(&self.path).await
    }

    pub async fn call(&self, args: Vec<Value>) -> Result<Value, CallError> {
        self.remote.call(&self.path, args).await
    }
}
