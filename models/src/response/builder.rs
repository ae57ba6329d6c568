use crate::error::model_error::ModelError;
use crate::{ErrorLocation, HttpStatusCode, PhpResponse};

use std::collections::BTreeMap;
use std::panic::Location;

/// Builder for creating validated PhpResponse instances.
///
/// Status defaults to 200 and exit code to 0; everything else starts empty.
#[derive(Debug, Default)]
pub struct PhpResponseBuilder {
    headers: BTreeMap<String, Vec<String>>,
    bytes: Vec<u8>,
    errors: String,
    exit_code: Option<i32>,
    http_status_code: Option<u16>,
}

impl PhpResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a header (repeated names accumulate).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.bytes = bytes.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.bytes = text.into().into_bytes();
        self
    }

    pub fn with_errors(mut self, errors: impl Into<String>) -> Self {
        self.errors = errors.into();
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status_code = Some(status);
        self
    }

    /// Build the PhpResponse with validation.
    #[track_caller]
    pub fn build(self) -> Result<PhpResponse, ModelError> {
        let status = HttpStatusCode(self.http_status_code.unwrap_or(HttpStatusCode::OK.0));

        if !status.is_valid() {
            return Err(ModelError::Validation {
                message: format!("Invalid HTTP status code: {status}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.headers.keys().any(|name| name.trim().is_empty()) {
            return Err(ModelError::Validation {
                message: String::from("Header name cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(PhpResponse::from_parts(
            self.headers,
            self.bytes,
            self.errors,
            self.exit_code.unwrap_or_default(),
            status,
        ))
    }
}
