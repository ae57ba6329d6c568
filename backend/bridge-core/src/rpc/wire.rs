//! Wire format shared by both channel bindings.

use crate::channel::PortRole;
use crate::error::transfer::TransferError;
use crate::value::{PropertyPath, Value, display_path};

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::panic::Location;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Encoded form of a [`Value`].
///
/// Values a transfer handler claimed are wrapped in `Handled` with the
/// handler's name so the receiving side knows which decoder to run.
///
/// Numbers that JSON cannot represent (`NaN`, `Infinity`, `-Infinity`) are
/// written as those strings, so both channel bindings carry the same values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum WireValue {
    Undefined,
    Null,
    Bool(bool),
    Number(#[serde(with = "number_repr")] f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<WireValue>),
    Object(BTreeMap<String, WireValue>),
    Handled {
        handler: String,
        payload: Box<WireValue>,
    },
}

impl WireValue {
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        match self {
            WireValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Plain structural encoding, no transfer handlers involved.
///
/// Fails for functions, events and responses, which only handlers can carry.
impl TryFrom<&Value> for WireValue {
    type Error = TransferError;

    #[track_caller]
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Undefined => WireValue::Undefined,
            Value::Null => WireValue::Null,
            Value::Bool(b) => WireValue::Bool(*b),
            Value::Number(n) => WireValue::Number(*n),
            Value::String(s) => WireValue::String(s.clone()),
            Value::Bytes(bytes) => WireValue::Bytes(bytes.clone()),
            Value::Array(items) => WireValue::Array(
                items
                    .iter()
                    .map(WireValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => WireValue::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), WireValue::try_from(v)?)))
                    .collect::<Result<_, TransferError>>()?,
            ),
            other => {
                return Err(TransferError::Encode {
                    message: format!("A {} value needs a transfer handler", other.kind()),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        })
    }
}

/// Messages exchanged on a port.
///
/// Requests (`Get`, `Apply`, `Release`) flow toward the exposing side,
/// replies (`Return`, `Throw`) flow back with the request's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RpcMessage {
    Get {
        id: u64,
        path: PropertyPath,
    },
    Apply {
        id: u64,
        path: PropertyPath,
        args: Vec<WireValue>,
    },
    /// The caller dropped its last reference; the served port can close.
    Release {
        id: u64,
    },
    Return {
        id: u64,
        value: WireValue,
    },
    Throw {
        id: u64,
        message: String,
    },
}

impl RpcMessage {
    /// Which binding of a port this message is delivered to.
    pub fn recipient(&self) -> PortRole {
        match self {
            RpcMessage::Get { .. } | RpcMessage::Apply { .. } | RpcMessage::Release { .. } => {
                PortRole::Serving
            }
            RpcMessage::Return { .. } | RpcMessage::Throw { .. } => PortRole::Calling,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            RpcMessage::Get { id, path } => format!("get #{id} {}", display_path(path)),
            RpcMessage::Apply { id, path, args } => {
                format!("apply #{id} {}({} args)", display_path(path), args.len())
            }
            RpcMessage::Release { id } => format!("release #{id}"),
            RpcMessage::Return { id, .. } => format!("return #{id}"),
            RpcMessage::Throw { id, .. } => format!("throw #{id}"),
        }
    }
}

/// A message addressed to one port of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub port: Uuid,
    pub message: RpcMessage,
}

mod number_repr {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};

    const NAN: &str = "NaN";
    const INFINITY: &str = "Infinity";
    const NEG_INFINITY: &str = "-Infinity";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Finite(f64),
        Named(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if *value == f64::INFINITY {
            serializer.serialize_str(INFINITY)
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str(NEG_INFINITY)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Finite(value) => Ok(value),
            Repr::Named(name) => match name.as_str() {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("not a number: {other:?}"))),
            },
        }
    }
}
