//! Domain models for the PHP bridge.
//!
//! This crate contains the data that crosses the bridge with behavior
//! attached to it. The response produced by the remoted runtime carries
//! helper accessors that a structural copy would lose, so it is always
//! shipped as a plain [`PhpResponseData`] record and rebuilt on the other
//! side.

pub mod error;
pub mod response;

#[cfg(test)]
mod tests;

pub use common::{ErrorLocation, HttpStatusCode};
pub use error::model_error::ModelError;
pub use response::builder::PhpResponseBuilder;
pub use response::{PhpResponse, PhpResponseData, RESPONSE_FIELDS};
