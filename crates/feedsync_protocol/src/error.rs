//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while framing wire payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A payload could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// A frame decoded but violates the protocol.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

impl ProtocolError {
    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Creates an invalid frame error.
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame(message.into())
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::Encode(err.to_string())
        } else {
            Self::Decode(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_map_to_decode() {
        let err: ProtocolError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(err.to_string().starts_with("decode error"));
    }
}
