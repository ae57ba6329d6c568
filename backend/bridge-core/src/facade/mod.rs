//! Facade builders.
//!
//! [`expose_api`] publishes a method set on an endpoint; [`consume_api`]
//! binds to the set the other side published. Which kind of channel is in
//! use is decided by whoever builds the [`crate::channel::Endpoint`].

mod consume;
mod expose;
mod method_set;
pub mod probe;

pub use consume::{RemoteApi, RemoteNode, consume_api};
pub use expose::{Facade, IS_CONNECTED, IS_READY, expose_api};
pub use method_set::MethodSet;
pub use probe::{ConnectionProbe, ProbeReport};
