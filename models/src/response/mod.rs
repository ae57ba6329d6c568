//! The response produced by the runtime behind the bridge.

pub mod builder;

use crate::error::model_error::ModelError;
use crate::{ErrorLocation, HttpStatusCode};

use std::collections::BTreeMap;
use std::panic::Location;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Field names a plain record must carry to be treated as a response.
pub const RESPONSE_FIELDS: [&str; 5] = ["headers", "bytes", "errors", "exitCode", "httpStatusCode"];

/// Plain-data form of [`PhpResponse`].
///
/// This is what actually travels over a channel. Header names are kept as
/// given; lookups through [`PhpResponse::header`] are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhpResponseData {
    pub headers: BTreeMap<String, Vec<String>>,
    pub bytes: Vec<u8>,
    pub errors: String,
    pub exit_code: i32,
    pub http_status_code: HttpStatusCode,
}

/// Response of a script run: headers, body bytes, diagnostics, exit code
/// and HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpResponse {
    headers: BTreeMap<String, Vec<String>>,
    bytes: Vec<u8>,
    errors: String,
    exit_code: i32,
    http_status_code: HttpStatusCode,
}

impl PhpResponse {
    pub(crate) fn from_parts(
        headers: BTreeMap<String, Vec<String>>,
        bytes: Vec<u8>,
        errors: String,
        exit_code: i32,
        http_status_code: HttpStatusCode,
    ) -> Self {
        Self {
            headers,
            bytes,
            errors,
            exit_code,
            http_status_code,
        }
    }

    /// Rebuild a response from its raw record.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Validation`] if the status code is outside
    /// 100-599.
    #[track_caller]
    pub fn from_raw_data(data: PhpResponseData) -> Result<Self, ModelError> {
        if !data.http_status_code.is_valid() {
            return Err(ModelError::Validation {
                message: format!("Invalid HTTP status code: {}", data.http_status_code),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self::from_parts(
            data.headers,
            data.bytes,
            data.errors,
            data.exit_code,
            data.http_status_code,
        ))
    }

    /// Plain-data copy suitable for sending over a channel.
    pub fn to_raw_data(&self) -> PhpResponseData {
        PhpResponseData {
            headers: self.headers.clone(),
            bytes: self.bytes.clone(),
            errors: self.errors.clone(),
            exit_code: self.exit_code,
            http_status_code: self.http_status_code,
        }
    }

    pub fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn errors(&self) -> &str {
        &self.errors
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn http_status_code(&self) -> HttpStatusCode {
        self.http_status_code
    }

    /// Values of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Body parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::BodyDecode`] if the body is not valid JSON for `T`.
    #[track_caller]
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ModelError> {
        serde_json::from_slice(&self.bytes).map_err(|e| ModelError::BodyDecode {
            message: format!("Response body is not valid JSON: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Successful status and a zero exit code.
    pub fn is_ok(&self) -> bool {
        self.http_status_code.is_success() && self.exit_code == 0
    }
}

impl From<PhpResponse> for PhpResponseData {
    fn from(response: PhpResponse) -> Self {
        PhpResponseData {
            headers: response.headers,
            bytes: response.bytes,
            errors: response.errors,
            exit_code: response.exit_code,
            http_status_code: response.http_status_code,
        }
    }
}

impl TryFrom<PhpResponseData> for PhpResponse {
    type Error = ModelError;

    #[track_caller]
    fn try_from(data: PhpResponseData) -> Result<Self, Self::Error> {
        PhpResponse::from_raw_data(data)
    }
}
