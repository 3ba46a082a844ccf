//! Error types for the RPC client layer

use thiserror::Error;

/// Result type alias for client construction
pub type Result<T> = std::result::Result<T, GapicError>;

/// Errors raised while building an RPC client
#[derive(Debug, Error)]
pub enum GapicError {
    /// The configured endpoint is not a valid URI
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Channel or TLS setup failed
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// A header value could not be encoded as gRPC metadata
    #[error("Invalid metadata for '{key}': {value}")]
    InvalidMetadata { key: &'static str, value: String },

    /// Credentials could not be loaded, scoped or turned into a header
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Channels spawn their connection task onto tokio
    #[error("Channels must be created from within a tokio runtime")]
    NoRuntime,
}
