use std::result::Result as StdResult;

use thiserror::Error;

use crate::filter::RegistryError;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the oscbridge engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Filter table validation failures (duplicate, full, not found).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A key expression failed to parse.
    #[error("key expression error: {0}")]
    KeyParse(#[from] keycatalog::ParseError),

    /// The virtual input device refused the action.
    #[error("input relay error: {0}")]
    Relay(#[from] relayinput::Error),

    /// Config persistence failed.
    #[error(transparent)]
    Config(#[from] oscbridge_config::Error),

    /// A blocking emission task failed to complete.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
