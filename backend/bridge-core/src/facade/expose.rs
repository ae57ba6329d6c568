use crate::channel::{Endpoint, PortRole};
use crate::error::call::CallError;
use crate::proxy::ProxyHandle;
use crate::readiness::{Readiness, ReadyResolver};
use crate::rpc::{ApiTarget, serve};
use crate::transfer::{TransferContext, TransferHandlers};
use crate::value::{Function, Value, display_path};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::info;
use tokio::task::JoinHandle;

/// Facade member that resolves once the API is published.
pub const IS_CONNECTED: &str = "isConnected";

/// Facade member that resolves once the owner marked the API ready.
pub const IS_READY: &str = "isReady";

/// The object an exposer publishes on its endpoint's root port.
///
/// Lookups go to the readiness members first, then to the exposed methods,
/// then to the piped target if there is one. Serving stops when the last
/// clone is dropped.
#[derive(Clone)]
pub struct Facade {
    inner: Arc<FacadeInner>,
    _server: Arc<ServeGuard>,
}

struct FacadeInner {
    readiness: Readiness,
    is_connected: Function,
    is_ready: Function,
    methods: ProxyHandle,
    piped: Option<Arc<dyn ApiTarget>>,
}

struct ServeGuard(JoinHandle<()>);

impl Drop for ServeGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Publish `methods` on the root port of `endpoint`.
///
/// Names missing from `methods` are looked up on `piped`, which lets one API
/// re-export another (a consumed [`crate::facade::RemoteApi`], say). The
/// registry gets its default handlers installed if it does not have them.
///
/// The API is connected as soon as this returns. It becomes ready when the
/// returned resolver is called; until then a remote `isReady()` stays
/// pending.
///
/// Must be called from within a tokio runtime.
pub fn expose_api(
    methods: impl Into<Value>,
    piped: Option<Arc<dyn ApiTarget>>,
    endpoint: &Endpoint,
    handlers: Arc<TransferHandlers>,
) -> (ReadyResolver, Facade) {
    handlers.install_defaults();

    let (readiness, resolver) = Readiness::new();
    let inner = Arc::new(FacadeInner {
        is_connected: readiness_probe(readiness.clone(), ReadinessWait::Connected),
        is_ready: readiness_probe(readiness.clone(), ReadinessWait::Ready),
        readiness,
        methods: ProxyHandle::wrap(methods),
        piped,
    });

    let context = TransferContext::new(handlers, endpoint.clone());
    let server = serve(inner.clone(), endpoint.root_port(PortRole::Serving), context);

    inner.readiness.mark_connected();
    info!(
        "API exposed on {:?} endpoint{}",
        endpoint.kind(),
        if inner.piped.is_some() { " with piped fallback" } else { "" }
    );

    (
        resolver,
        Facade {
            inner,
            _server: Arc::new(ServeGuard(server)),
        },
    )
}

#[derive(Clone, Copy)]
enum ReadinessWait {
    Connected,
    Ready,
}

fn readiness_probe(readiness: Readiness, wait: ReadinessWait) -> Function {
    Function::new(move |_args: Vec<Value>| {
        let readiness = readiness.clone();
        async move {
            match wait {
                ReadinessWait::Connected => readiness.connected().await,
                ReadinessWait::Ready => readiness.ready().await,
            }
            Ok(Value::Bool(true))
        }
    })
}

impl Facade {
    /// Resolves once the API is published, which is immediately.
    pub async fn is_connected(&self) {
        self.inner.readiness.connected().await;
    }

    /// Resolves once the owner marked the API ready.
    pub async fn is_ready(&self) {
        self.inner.readiness.ready().await;
    }

    pub fn readiness(&self) -> &Readiness {
        &self.inner.readiness
    }

    /// Look up `path` exactly as a remote `Get` would.
    pub async fn get(&self, path: &[String]) -> Result<Value, CallError> {
        self.inner.read(path).await
    }

    /// Call `path` exactly as a remote `Apply` would.
    pub async fn call(&self, path: &[String], args: Vec<Value>) -> Result<Value, CallError> {
        self.inner.invoke(path, args).await
    }
}

impl FacadeInner {
    fn readiness_member(&self, path: &[String]) -> Option<&Function> {
        match path {
            [name] if name == IS_CONNECTED => Some(&self.is_connected),
            [name] if name == IS_READY => Some(&self.is_ready),
            _ => None,
        }
    }

    fn owns(&self, path: &[String]) -> bool {
        match path.first() {
            None => true,
            Some(name) => self.methods.contains(name),
        }
    }
}

impl ApiTarget for FacadeInner {
    fn read<'a>(&'a self, path: &'a [String]) -> BoxFuture<'a, Result<Value, CallError>> {
        async move {
            if let Some(member) = self.readiness_member(path) {
                return Ok(Value::Function(member.clone()));
            }
            if self.owns(path) {
                return self.methods.read(path).await;
            }
            match &self.piped {
                Some(piped) => piped.read(path).await,
                None => Ok(Value::Undefined),
            }
        }
        .boxed()
    }

    fn invoke<'a>(
        &'a self,
        path: &'a [String],
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value, CallError>> {
        async move {
            if let Some(member) = self.readiness_member(path) {
                return member.call(args).await;
            }
            if self.owns(path) {
                return self.methods.invoke(path, args).await;
            }
            match &self.piped {
                Some(piped) => piped.invoke(path, args).await,
                None => Err(CallError::NotCallable {
                    message: format!("{} is not exposed", display_path(path)),
                    location: ErrorLocation::from(Location::caller()),
                }),
            }
        }
        .boxed()
    }
}

impl ApiTarget for Facade {
    fn read<'a>(&'a self, path: &'a [String]) -> BoxFuture<'a, Result<Value, CallError>> {
        self.inner.read(path)
    }

    fn invoke<'a>(
        &'a self,
        path: &'a [String],
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value, CallError>> {
        self.inner.invoke(path, args)
    }
}
