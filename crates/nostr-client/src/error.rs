//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Error, Debug)]
pub enum ClientError {
    /// No connected relay satisfies the requested operation. Raised before
    /// any network call is attempted.
    #[error("no relays available")]
    NoRelaysAvailable,

    /// Not connected to relay
    #[error("not connected to relay")]
    NotConnected,

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Timeout error
    #[error("timeout: {0}")]
    Timeout(String),

    /// Malformed or unexpected relay frame
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Subscription error
    #[error("subscription error: {0}")]
    Subscription(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;
