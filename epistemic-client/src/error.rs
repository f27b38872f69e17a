//! Error types for the epistemic client.

use displaydoc::Display;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by every client operation.
#[derive(Debug, Display, Error)]
pub enum ClientError {
    /// Network error: {0}
    Network(String),

    /// Request timed out after {0} ms
    Timeout(u64),

    /// HTTP status {status}
    HttpStatus {
        /// Response status code
        status: u16,
        /// Parsed JSON body, if the server sent one
        body: Option<Value>,
    },

    /// Failed to decode response: {0}
    Decode(String),

    /// Request was cancelled
    Cancelled,

    /// Invalid argument: {0}
    InvalidArgument(String),

    /// Invalid client configuration: {0}
    Config(String),
}

impl ClientError {
    /// Status code carried by an `HttpStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure came from the transport rather than the server's
    /// answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ClientError::Timeout(250).to_string(),
            "Request timed out after 250 ms"
        );
        let err = ClientError::HttpStatus {
            status: 404,
            body: Some(json!({ "detail": "Claim not found" })),
        };
        assert_eq!(err.to_string(), "HTTP status 404");
        assert_eq!(err.status(), Some(404));
    }
}
