//! Transfer handler registry.
//!
//! A transfer handler lets a value that cannot be sent as plain data cross
//! the channel anyway: it claims values through [`TransferHandler::can_handle`],
//! turns them into a [`WireValue`] payload on the sending side and back into
//! a [`Value`] on the receiving side.
//!
//! # Ordering
//!
//! Handlers are consulted in registration order and the first match wins.
//! The default set is designed so predicates never overlap, but order still
//! decides if a custom handler overlaps with one of them.
//!
//! # Sharing
//!
//! There is no process-wide table. Build one registry (usually with
//! [`TransferHandlers::with_defaults`]) and hand the same `Arc` to every
//! bridge that should agree on the encoding.

mod event;
mod function;
mod response;

pub use event::EventHandler;
pub use function::FunctionHandler;
pub use response::ResponseHandler;

use crate::channel::Endpoint;
use crate::error::transfer::TransferError;
use crate::rpc::wire::WireValue;
use crate::value::Value;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use log::debug;

/// Name of the event handler.
pub const EVENT_HANDLER: &str = "EVENT";

/// Name of the function handler.
pub const FUNCTION_HANDLER: &str = "FUNCTION";

/// Name of the domain response handler.
pub const RESPONSE_HANDLER: &str = "PhpResponse";

/// A codec for one kind of value that cannot cross a channel as plain data.
pub trait TransferHandler: Send + Sync {
    /// Whether this handler claims `value`.
    fn can_handle(&self, value: &Value) -> bool;

    /// Produce the payload to send. Only called with values `can_handle`
    /// accepted.
    fn serialize(&self, value: Value, context: &TransferContext) -> Result<WireValue, TransferError>;

    /// Rebuild the value from a payload produced by `serialize`.
    fn deserialize(
        &self,
        payload: WireValue,
        context: &TransferContext,
    ) -> Result<Value, TransferError>;
}

type Registered = (String, Arc<dyn TransferHandler>);

/// Ordered, append-only table of transfer handlers.
pub struct TransferHandlers {
    handlers: RwLock<Vec<Registered>>,
    defaults_installed: AtomicBool,
}

impl TransferHandlers {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            defaults_installed: AtomicBool::new(false),
        }
    }

    /// Registry with the default handlers installed, ready to share.
    pub fn with_defaults() -> Arc<Self> {
        let handlers = Self::new();
        handlers.install_defaults();
        Arc::new(handlers)
    }

    /// Register the event, function and response handlers, in that order.
    ///
    /// Runs at most once per registry; later calls return immediately.
    pub fn install_defaults(&self) {
        if self.defaults_installed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.register(EVENT_HANDLER, EventHandler);
        self.register(FUNCTION_HANDLER, FunctionHandler);
        self.register(RESPONSE_HANDLER, ResponseHandler);
        debug!("Default transfer handlers installed");
    }

    /// Append a handler under `name`.
    ///
    /// A name that is already taken is left untouched; returns whether the
    /// handler was added.
    pub fn register(&self, name: impl Into<String>, handler: impl TransferHandler + 'static) -> bool {
        let name = name.into();
        let Ok(mut handlers) = self.handlers.write() else {
            return false;
        };

        if handlers.iter().any(|(existing, _)| *existing == name) {
            debug!("Transfer handler {name} already registered, ignoring");
            return false;
        }

        let handler: Arc<dyn TransferHandler> = Arc::new(handler);
        handlers.push((name, handler));
        true
    }

    /// Registered names in consultation order.
    pub fn names(&self) -> Vec<String> {
        self.handlers
            .read()
            .map(|handlers| handlers.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// First handler claiming `value`.
    pub fn find(&self, value: &Value) -> Option<(String, Arc<dyn TransferHandler>)> {
        let handlers = self.handlers.read().ok()?;
        handlers
            .iter()
            .find(|(_, handler)| handler.can_handle(value))
            .map(|(name, handler)| (name.clone(), Arc::clone(handler)))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TransferHandler>> {
        let handlers = self.handlers.read().ok()?;
        handlers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, handler)| Arc::clone(handler))
    }
}

impl Default for TransferHandlers {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a handler needs while encoding or decoding: the registry (for
/// nested values) and the endpoint (for opening sub-channels).
#[derive(Clone)]
pub struct TransferContext {
    handlers: Arc<TransferHandlers>,
    endpoint: Endpoint,
}

impl TransferContext {
    pub fn new(handlers: Arc<TransferHandlers>, endpoint: Endpoint) -> Self {
        Self { handlers, endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn handlers(&self) -> &Arc<TransferHandlers> {
        &self.handlers
    }

    /// Encode a value graph, consulting handlers at every node.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Encode`] for a function, event or response no
    /// handler claimed, or whatever the claiming handler reports.
    pub fn encode(&self, value: Value) -> Result<WireValue, TransferError> {
        if let Some((name, handler)) = self.handlers.find(&value) {
            let payload = handler.serialize(value, self)?;
            return Ok(WireValue::Handled {
                handler: name,
                payload: Box::new(payload),
            });
        }

        match value {
            Value::Array(items) => Ok(WireValue::Array(
                items
                    .into_iter()
                    .map(|item| self.encode(item))
                    .collect::<Result<_, _>>()?,
            )),
            Value::Object(map) => Ok(WireValue::Object(
                map.into_iter()
                    .map(|(key, item)| Ok((key, self.encode(item)?)))
                    .collect::<Result<_, TransferError>>()?,
            )),
            leaf => WireValue::try_from(&leaf),
        }
    }

    /// Decode a wire value, running the named handler for `Handled` nodes.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::UnknownHandler`] if a payload names a handler
    /// this registry does not have.
    pub fn decode(&self, wire: WireValue) -> Result<Value, TransferError> {
        Ok(match wire {
            WireValue::Undefined => Value::Undefined,
            WireValue::Null => Value::Null,
            WireValue::Bool(b) => Value::Bool(b),
            WireValue::Number(n) => Value::Number(n),
            WireValue::String(s) => Value::String(s),
            WireValue::Bytes(bytes) => Value::Bytes(bytes),
            WireValue::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.decode(item))
                    .collect::<Result<_, _>>()?,
            ),
            WireValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| Ok((key, self.decode(item)?)))
                    .collect::<Result<_, TransferError>>()?,
            ),
            WireValue::Handled { handler, payload } => {
                let codec = self
                    .handlers
                    .get(&handler)
                    .ok_or_else(|| TransferError::UnknownHandler {
                        message: format!("No transfer handler named {handler}"),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
                codec.deserialize(*payload, self)?
            }
        })
    }
}
