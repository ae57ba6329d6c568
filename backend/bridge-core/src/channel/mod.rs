//! Channel endpoints between execution contexts.
//!
//! Two bindings exist, selected explicitly by the caller through the
//! constructor used rather than by inspecting the environment:
//!
//! - **Worker** ([`Endpoint::worker_pair`], [`worker_channel`]): in-process,
//!   envelopes moved over tokio channels
//! - **Window** ([`WindowListener`], [`connect_window`]): loopback WebSocket,
//!   envelopes encoded as JSON text frames

mod endpoint;
mod window;

pub use endpoint::{
    ChannelKind, Endpoint, Port, PortRole, PortSender, ROOT_PORT, WorkerChannel, worker_channel,
};
pub use window::{WindowListener, connect_window};
