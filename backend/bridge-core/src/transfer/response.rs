use crate::error::transfer::TransferError;
use crate::rpc::wire::WireValue;
use crate::transfer::{TransferContext, TransferHandler};
use crate::value::Value;

use common::{ErrorLocation, HttpStatusCode};
use models::{PhpResponse, PhpResponseData, RESPONSE_FIELDS};

use std::collections::BTreeMap;
use std::panic::Location;

/// Round-trips [`PhpResponse`] through its plain-data record so the helper
/// accessors survive the trip.
///
/// Also claims plain objects that carry every response field, so a
/// response-shaped record comes out the other side as a real response.
pub struct ResponseHandler;

impl TransferHandler for ResponseHandler {
    fn can_handle(&self, value: &Value) -> bool {
        match value {
            Value::Response(_) => true,
            Value::Object(map) => RESPONSE_FIELDS.iter().all(|field| map.contains_key(*field)),
            _ => false,
        }
    }

    fn serialize(&self, value: Value, _context: &TransferContext) -> Result<WireValue, TransferError> {
        let data = match value {
            Value::Response(response) => response.to_raw_data(),
            Value::Object(map) => data_from_object(&map)?,
            other => {
                return Err(encode_error(format!(
                    "Response handler given a {} value",
                    other.kind()
                )));
            }
        };

        Ok(data_to_wire(data))
    }

    fn deserialize(
        &self,
        payload: WireValue,
        _context: &TransferContext,
    ) -> Result<Value, TransferError> {
        let data = data_from_wire(&payload)?;
        Ok(Value::Response(PhpResponse::from_raw_data(data)?))
    }
}

fn data_to_wire(data: PhpResponseData) -> WireValue {
    let headers = data
        .headers
        .into_iter()
        .map(|(name, values)| {
            (
                name,
                WireValue::Array(values.into_iter().map(WireValue::String).collect()),
            )
        })
        .collect();

    WireValue::Object(BTreeMap::from([
        (String::from("headers"), WireValue::Object(headers)),
        (String::from("bytes"), WireValue::Bytes(data.bytes)),
        (String::from("errors"), WireValue::String(data.errors)),
        (
            String::from("exitCode"),
            WireValue::Number(f64::from(data.exit_code)),
        ),
        (
            String::from("httpStatusCode"),
            WireValue::Number(f64::from(data.http_status_code.0)),
        ),
    ]))
}

#[track_caller]
fn data_from_wire(payload: &WireValue) -> Result<PhpResponseData, TransferError> {
    let field = |name: &str| {
        payload
            .get(name)
            .ok_or_else(|| decode_error(format!("Response record is missing {name}")))
    };

    let headers: BTreeMap<String, Vec<String>> = match field("headers")? {
        WireValue::Object(map) => map
            .iter()
            .map(|(name, values)| {
                let values = match values {
                    WireValue::Array(items) => items
                        .iter()
                        .map(|item| item.as_str().map(String::from))
                        .collect::<Option<Vec<_>>>(),
                    WireValue::String(single) => Some(vec![single.clone()]),
                    _ => None,
                }
                .ok_or_else(|| decode_error(format!("Header {name} is not a list of strings")))?;
                Ok((name.clone(), values))
            })
            .collect::<Result<_, TransferError>>()?,
        _ => return Err(decode_error("Response headers are not a record")),
    };

    let bytes = match field("bytes")? {
        WireValue::Bytes(bytes) => bytes.clone(),
        WireValue::Array(items) => items
            .iter()
            .map(|item| item.as_f64().and_then(byte_from_f64))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| decode_error("Response bytes are not all in 0..=255"))?,
        _ => return Err(decode_error("Response bytes are not a byte array")),
    };

    let errors = field("errors")?
        .as_str()
        .map(String::from)
        .ok_or_else(|| decode_error("Response errors are not a string"))?;

    let exit_code = field("exitCode")?
        .as_f64()
        .and_then(int_from_f64)
        .ok_or_else(|| decode_error("Response exit code is not an integer"))?;

    let status = field("httpStatusCode")?
        .as_f64()
        .and_then(int_from_f64)
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| decode_error("Response status code is not a valid integer"))?;

    Ok(PhpResponseData {
        headers,
        bytes,
        errors,
        exit_code,
        http_status_code: HttpStatusCode(status),
    })
}

/// A response-shaped plain object, read the same way as a wire record.
#[track_caller]
fn data_from_object(map: &BTreeMap<String, Value>) -> Result<PhpResponseData, TransferError> {
    let record = WireValue::try_from(&Value::Object(map.clone())).map_err(|e| {
        encode_error(format!("Response-shaped object holds non-plain data: {e}"))
    })?;

    data_from_wire(&record).map_err(|e| match e {
        TransferError::Decode { message, location } => TransferError::Encode { message, location },
        other => other,
    })
}

fn byte_from_f64(n: f64) -> Option<u8> {
    int_from_f64(n).and_then(|n| u8::try_from(n).ok())
}

fn int_from_f64(n: f64) -> Option<i32> {
    if n.fract() == 0.0 && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) {
        Some(n as i32)
    } else {
        None
    }
}

#[track_caller]
fn encode_error(message: impl Into<String>) -> TransferError {
    TransferError::Encode {
        message: message.into(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn decode_error(message: impl Into<String>) -> TransferError {
    TransferError::Decode {
        message: message.into(),
        location: ErrorLocation::from(Location::caller()),
    }
}
