//! Network Error Types
//!
//! Error types for relay transport and sharing operations.

use thiserror::Error;

/// Network and transport error types.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Invalid relay endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No async runtime available")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let errors = vec![
            (
                NetworkError::ConnectionFailed("refused".into()),
                "Connection failed: refused",
            ),
            (NetworkError::Timeout, "Connection timeout"),
            (
                NetworkError::InvalidEndpoint("ftp://x".into()),
                "Invalid relay endpoint: ftp://x",
            ),
            (
                NetworkError::InvalidMessage("eof".into()),
                "Invalid message format: eof",
            ),
            (
                NetworkError::Serialization("nan".into()),
                "Serialization error: nan",
            ),
            (NetworkError::NoRuntime, "No async runtime available"),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }
}
