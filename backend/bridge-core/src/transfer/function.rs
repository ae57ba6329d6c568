use crate::channel::PortRole;
use crate::error::call::CallError;
use crate::error::transfer::TransferError;
use crate::rpc::wire::WireValue;
use crate::rpc::{ApiTarget, Remote, serve};
use crate::transfer::{TransferContext, TransferHandler};
use crate::value::{Function, Value, display_path};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::debug;
use uuid::Uuid;

/// Gives every function that crosses the channel its own sub-channel.
///
/// The sending side serves the function on a fresh port and ships the port
/// id; the receiving side binds that id and wraps it in a stub that calls
/// back through it. The sub-channel lives until the stub is dropped.
pub struct FunctionHandler;

impl TransferHandler for FunctionHandler {
    fn can_handle(&self, value: &Value) -> bool {
        matches!(value, Value::Function(_))
    }

    fn serialize(&self, value: Value, context: &TransferContext) -> Result<WireValue, TransferError> {
        let Value::Function(function) = value else {
            return Err(TransferError::Encode {
                message: format!("Function handler given a {} value", value.kind()),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        debug!("[Performance] Proxying a function");

        let port = context.endpoint().open_port(PortRole::Serving);
        let port_id = port.id();
        serve(Arc::new(FunctionTarget(function)), port, context.clone());

        Ok(WireValue::String(port_id.to_string()))
    }

    fn deserialize(
        &self,
        payload: WireValue,
        context: &TransferContext,
    ) -> Result<Value, TransferError> {
        let port_id = payload
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| TransferError::Decode {
                message: String::from("Function payload is not a port id"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let port = context.endpoint().port(port_id, PortRole::Calling);
        let remote = Remote::wrap_owned(port, context.clone());

        Ok(Value::Function(Function::new(move |args: Vec<Value>| {
            let remote = remote.clone();
            async move { remote.call(&[], args).await }
        })))
    }
}

/// A single function served on its own port.
struct FunctionTarget(Function);

impl ApiTarget for FunctionTarget {
    fn read<'a>(&'a self, path: &'a [String]) -> BoxFuture<'a, Result<Value, CallError>> {
        async move {
            if path.is_empty() {
                Ok(Value::Function(self.0.clone()))
            } else {
                Ok(Value::Undefined)
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
            if !path.is_empty() {
                return Err(CallError::NotCallable {
                    message: format!("{} on a function", display_path(path)),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            self.0.call(args).await
        }
        .boxed()
    }
}
