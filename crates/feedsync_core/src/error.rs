//! Error types for feedsync core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A feed identifier was not of the form `group:id`.
    #[error("invalid feed id: {value:?}")]
    InvalidFeedId {
        /// The rejected raw value.
        value: String,
    },

    /// A sort field name is not known for the model.
    #[error("unknown sort field {field:?} for {model}")]
    UnknownSortField {
        /// Model the sort applies to.
        model: &'static str,
        /// Rejected field name.
        field: String,
    },
}

impl CoreError {
    /// Creates an invalid feed id error.
    pub fn invalid_feed_id(value: impl Into<String>) -> Self {
        Self::InvalidFeedId {
            value: value.into(),
        }
    }

    /// Creates an unknown sort field error.
    pub fn unknown_sort_field(model: &'static str, field: impl Into<String>) -> Self {
        Self::UnknownSortField {
            model,
            field: field.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::invalid_feed_id("nocolon");
        assert_eq!(err.to_string(), "invalid feed id: \"nocolon\"");

        let err = CoreError::unknown_sort_field("activity", "nope");
        assert!(err.to_string().contains("activity"));
        assert!(err.to_string().contains("nope"));
    }
}
