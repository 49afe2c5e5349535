use bridge_traits::BridgeError;
use core_ringing::RingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    /// An inbound command could not be decoded.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Ringing error: {0}")]
    Ringing(#[from] RingError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
