//! Shared primitives for the PHP bridge workspace.
//!
//! Everything here is dependency-light and used by every other crate:
//!
//! - **common** (this crate): error locations, status codes
//! - **models**: domain response object crossing the bridge
//! - **bridge-core**: channel, RPC, transfer handlers, facades
//! - **bridge-host**: application wiring everything together

pub mod error;
pub mod http_status;

pub use error::error_location::ErrorLocation;
pub use http_status::HttpStatusCode;
