pub mod call;
pub mod channel;
pub mod config;
pub mod transfer;

pub use call::CallError;
pub use channel::ChannelError;
pub use config::ConfigError;
pub use transfer::TransferError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
