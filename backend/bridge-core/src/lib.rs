//! Cross-context remote-procedure bridge.
//!
//! One execution context exposes an object of methods with
//! [`facade::expose_api`]; the other binds to it with
//! [`facade::consume_api`] and calls into it as if it were local. Functions,
//! events and [`models::PhpResponse`] values cross the channel through the
//! handlers in [`transfer`].

pub mod channel;
pub mod config;
pub mod error;
pub mod facade;
pub mod proxy;
pub mod readiness;
pub mod rpc;
pub mod transfer;
pub mod value;

#[cfg(test)]
mod tests;

pub use channel::{ChannelKind, Endpoint, WindowListener, connect_window, worker_channel};
pub use config::{BridgeConfig, ProbeConfig, WindowConfig};
pub use error::BridgeError;
pub use facade::{Facade, MethodSet, RemoteApi, consume_api, expose_api};
pub use readiness::{Readiness, ReadyResolver};
pub use transfer::TransferHandlers;
pub use value::{CustomEvent, Function, Value};

pub const BRIDGE_LOOPBACK_HOST: &str = "127.0.0.1";
pub const DEFAULT_WINDOW_PORT: u16 = 19876;
pub const DEFAULT_WINDOW_URL: &str =
    const_format::concatcp!("ws://", BRIDGE_LOOPBACK_HOST, ":", DEFAULT_WINDOW_PORT);
