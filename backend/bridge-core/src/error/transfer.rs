use common::ErrorLocation;

use std::panic::Location;

use models::ModelError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TransferError {
    #[error("Unknown Handler Error: {message} {location}")]
    UnknownHandler {
        message: String,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ModelError> for TransferError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        TransferError::Decode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
