//! Remote-procedure core.
//!
//! [`serve`] answers `Get`/`Apply` requests arriving on a port by delegating
//! to an [`ApiTarget`]; [`Remote`] is the calling side. Both encode and
//! decode values through a [`crate::transfer::TransferContext`].

mod remote;
mod serve;
pub mod wire;

pub use remote::Remote;
pub use serve::serve;
pub use wire::{Envelope, RpcMessage, WireValue};

use crate::error::call::CallError;
use crate::value::Value;

use futures_util::future::BoxFuture;

/// Capability set of anything that can sit behind a port.
///
/// Paths are resolved by the target itself; an empty path names the target
/// as a whole.
pub trait ApiTarget: Send + Sync {
    /// Current value at `path`.
    fn read<'a>(&'a self, path: &'a [String]) -> BoxFuture<'a, Result<Value, CallError>>;

    /// Call the function at `path` with `args`.
    fn invoke<'a>(
        &'a self,
        path: &'a [String],
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value, CallError>>;
}
