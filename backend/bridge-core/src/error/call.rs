use crate::error::channel::ChannelError;
use crate::error::transfer::TransferError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Failure of a call made across the bridge, or of an exposed function.
#[derive(Debug, ThisError)]
pub enum CallError {
    /// The remote side returned an error; only its message crosses the channel.
    #[error("Remote Error: {message} {location}")]
    Thrown {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Callable Error: {message} {location}")]
    NotCallable {
        message: String,
        location: ErrorLocation,
    },

    /// The channel went away before a reply arrived.
    #[error("Disconnected Error: {message} {location}")]
    Disconnected {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl CallError {
    /// Error raised by an exposed function body.
    #[track_caller]
    pub fn thrown(message: impl Into<String>) -> Self {
        CallError::Thrown {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Message as sent back to a remote caller.
    pub fn remote_message(&self) -> String {
        match self {
            CallError::Thrown { message, .. }
            | CallError::NotCallable { message, .. }
            | CallError::Disconnected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
