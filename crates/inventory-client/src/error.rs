//! Inventory client errors

use thiserror::Error;

/// Errors that can occur when talking to the inventory API
#[derive(Debug, Error)]
pub enum InventoryError {
    /// HTTP transport error (connection refused, TLS failure, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The inventory API rejected the request
    #[error("Inventory API error: {0}")]
    Api(String),

    /// Authentication failed (bad credentials, locked account, ...)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body or record could not be decoded
    #[error("Unable to decode response of {operation}: {reason}")]
    Decode { operation: String, reason: String },

    /// Client configuration is incomplete or invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
