//! Error types for client construction
//!
//! Every failure here is a caller mistake or a missing environment: none of
//! them are retried, and each message names the flag or accessor at fault.

use thiserror::Error;

/// Result type alias for Bigtable client operations
pub type Result<T> = std::result::Result<T, BigtableError>;

#[derive(Debug, Error)]
pub enum BigtableError {
    /// Contradictory or missing construction parameters
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// An accessor was used in a way the client was not configured for
    #[error("Invalid usage: {0}")]
    Usage(String),

    /// No credentials supplied and none discoverable
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Channel construction error
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// RPC client construction error
    #[error("Client construction failed: {0}")]
    Gapic(#[from] bigtable_gapic::GapicError),

    /// IO operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file
    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),

    /// RPC failure
    #[error("RPC failed: {0}")]
    Status(#[from] tonic::Status),
}

impl From<BigtableError> for tonic::Status {
    fn from(error: BigtableError) -> Self {
        match error {
            BigtableError::Configuration(msg) => tonic::Status::invalid_argument(msg),
            BigtableError::Usage(msg) => tonic::Status::failed_precondition(msg),
            BigtableError::Authentication(msg) => tonic::Status::unauthenticated(msg),
            BigtableError::Transport(e) => {
                tonic::Status::unavailable(format!("Transport error: {}", e))
            }
            BigtableError::Gapic(e) => tonic::Status::internal(e.to_string()),
            BigtableError::Io(e) => tonic::Status::internal(format!("IO error: {}", e)),
            BigtableError::Json(e) => tonic::Status::invalid_argument(format!("Config error: {}", e)),
            BigtableError::Status(status) => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = BigtableError::Configuration("bad flags".to_string());
        assert_eq!(error.to_string(), "Invalid configuration: bad flags");

        let error = BigtableError::Usage("admin disabled".to_string());
        assert_eq!(error.to_string(), "Invalid usage: admin disabled");

        let error = BigtableError::Authentication("no credentials".to_string());
        assert_eq!(error.to_string(), "Authentication failed: no credentials");
    }

    #[test]
    fn test_error_into_status_code() {
        let status: tonic::Status = BigtableError::Configuration("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);

        let status: tonic::Status = BigtableError::Usage("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);

        let status: tonic::Status = BigtableError::Authentication("x".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Unauthenticated);
    }
}
