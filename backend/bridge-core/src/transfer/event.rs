use crate::error::transfer::TransferError;
use crate::rpc::wire::WireValue;
use crate::transfer::{TransferContext, TransferHandler};
use crate::value::Value;

/// Ships only the `detail` of an event; the event wrapper itself is dropped.
///
/// The receiving side gets the `{ detail }` record back as a plain object.
pub struct EventHandler;

impl TransferHandler for EventHandler {
    fn can_handle(&self, value: &Value) -> bool {
        matches!(value, Value::Event(_))
    }

    fn serialize(&self, value: Value, context: &TransferContext) -> Result<WireValue, TransferError> {
        let detail = match value {
            Value::Event(event) => *event.detail,
            other => other,
        };
        context.encode(Value::object([("detail", detail)]))
    }

    fn deserialize(
        &self,
        payload: WireValue,
        context: &TransferContext,
    ) -> Result<Value, TransferError> {
        context.decode(payload)
    }
}
