//! Error types for the feeds client.

use feedsync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by facade operations.
///
/// State containers never fail; every error comes from the backend or the
/// event source and is returned to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The backend rejected the request.
    #[error("api error {status} ({code}): {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Backend error code.
        code: String,
        /// Error message.
        message: String,
    },

    /// A response or event payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A frame violated the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The operation needs data that has not been loaded yet.
    #[error("{what} has not been loaded")]
    NotLoaded {
        /// What is missing.
        what: &'static str,
    },

    /// There is no further page to load.
    #[error("no more pages")]
    NoMorePages,

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a backend error.
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns true if the caller may retry the operation.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { retryable, .. } => *retryable,
            ClientError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns true for permission failures.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ClientError::Api { status: 403, .. })
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Decode(message) => ClientError::Decode(message),
            ProtocolError::Encode(message) | ProtocolError::InvalidFrame(message) => {
                ClientError::Protocol(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ClientError::transport_retryable("connection lost").is_retryable());
        assert!(!ClientError::transport_fatal("invalid certificate").is_retryable());
        assert!(ClientError::api(503, "unavailable", "try later").is_retryable());
        assert!(ClientError::api(429, "rate_limited", "slow down").is_retryable());
        assert!(!ClientError::api(404, "not_found", "gone").is_retryable());
        assert!(!ClientError::Cancelled.is_retryable());
    }

    #[test]
    fn permission_denied() {
        let err = ClientError::api(403, "forbidden", "not a member");
        assert!(err.is_permission_denied());
        assert!(err.to_string().contains("403"));
        assert!(!ClientError::NoMorePages.is_permission_denied());
    }

    #[test]
    fn protocol_errors_convert() {
        let err: ClientError = ProtocolError::decode("bad json").into();
        assert_eq!(err, ClientError::Decode("bad json".into()));
        let err: ClientError = ProtocolError::invalid_frame("no type").into();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn error_display() {
        let err = ClientError::NotLoaded { what: "feed" };
        assert_eq!(err.to_string(), "feed has not been loaded");
    }
}
