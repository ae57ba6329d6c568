use crate::channel::{Port, PortSender};
use crate::error::call::CallError;
use crate::rpc::ApiTarget;
use crate::rpc::wire::{RpcMessage, WireValue};
use crate::transfer::TransferContext;
use crate::value::{Value, display_path};

use std::sync::Arc;

use log::{debug, trace, warn};
use tokio::spawn as TokioSpawn;
use tokio::task::JoinHandle;

/// Serve `target` on `port` until the port is released or its endpoint closes.
///
/// Every request runs on its own task, so a slow call (an `isReady` that is
/// still waiting, say) never holds up the others and replies may go out in
/// a different order than requests came in.
///
/// Must be called from within a tokio runtime.
pub fn serve(target: Arc<dyn ApiTarget>, mut port: Port, context: TransferContext) -> JoinHandle<()> {
    TokioSpawn(async move {
        let port_id = port.id();
        let sender = port.sender();
        debug!("Serving API on port {port_id}");

        while let Some(message) = port.recv().await {
            trace!("Port {port_id} received {}", message.describe());

            match message {
                RpcMessage::Get { id, path } => {
                    let target = Arc::clone(&target);
                    let sender = sender.clone();
                    let context = context.clone();
                    TokioSpawn(async move {
                        let outcome = target.read(&path).await;
                        reply(id, outcome, &sender, &context);
                    });
                }
                RpcMessage::Apply { id, path, args } => {
                    let target = Arc::clone(&target);
                    let sender = sender.clone();
                    let context = context.clone();
                    TokioSpawn(async move {
                        let outcome = match decode_args(args, &context) {
                            Ok(args) => target.invoke(&path, args).await,
                            Err(e) => Err(e),
                        };
                        if let Err(e) = &outcome {
                            debug!("Call to {} failed: {e}", display_path(&path));
                        }
                        reply(id, outcome, &sender, &context);
                    });
                }
                RpcMessage::Release { .. } => {
                    debug!("Port {port_id} released by its caller");
                    break;
                }
                RpcMessage::Return { id, .. } | RpcMessage::Throw { id, .. } => {
                    warn!("Ignoring reply #{id} sent to served port {port_id}");
                }
            }
        }

        debug!("Stopped serving port {port_id}");
    })
}

fn decode_args(args: Vec<WireValue>, context: &TransferContext) -> Result<Vec<Value>, CallError> {
    args.into_iter()
        .map(|arg| context.decode(arg).map_err(CallError::from))
        .collect()
}

fn reply(
    id: u64,
    outcome: Result<Value, CallError>,
    sender: &PortSender,
    context: &TransferContext,
) {
    let message = match outcome.and_then(|value| context.encode(value).map_err(CallError::from)) {
        Ok(value) => RpcMessage::Return { id, value },
        Err(e) => RpcMessage::Throw {
            id,
            message: e.remote_message(),
        },
    };

    if let Err(e) = sender.send(message) {
        warn!("Could not deliver reply #{id}: {e}");
    }
}
