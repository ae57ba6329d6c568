use bridge_core::error::{BridgeError, CallError, ConfigError};
use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the host binary.
///
/// Bridge errors are flattened to their message so the whole enum stays
/// serializable for reporting; the location is where the host saw them.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum HostError {
    /// Error from this App
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    /// Error from bridge-core (channel, transfer or remote call)
    #[error("Bridge Error: {message} {location}")]
    Bridge {
        message: String,
        location: ErrorLocation,
    },

    /// Config could not be read, parsed or validated
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// The worker thread could not be started or stopped cleanly
    #[error("Worker Error: {message} {location}")]
    Worker {
        message: String,
        location: ErrorLocation,
    },
}

impl From<BridgeError> for HostError {
    #[track_caller]
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Config(error) => HostError::from(error),
            other => HostError::Bridge {
                message: other.to_string(),
                location: ErrorLocation::from(Location::caller()),
            },
        }
    }
}

impl From<CallError> for HostError {
    #[track_caller]
    fn from(error: CallError) -> Self {
        HostError::Bridge {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for HostError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        HostError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
