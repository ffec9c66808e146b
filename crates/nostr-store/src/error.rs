//! Store error types

use thiserror::Error;

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Value (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation attempted after `close`
    #[error("store is closed")]
    Closed,
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

/// Store result type
pub type Result<T> = std::result::Result<T, StoreError>;
