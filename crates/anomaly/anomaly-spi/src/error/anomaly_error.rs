//! Anomaly engine error types.

use thiserror::Error;

/// Anomaly engine errors.
#[derive(Debug, Error)]
pub enum AnomalyError {
    #[error("Insufficient data: required {required}, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("Model not fitted: call fit() before score()")]
    NotFitted,

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Failed to parse {field} '{value}': {reason}")]
    ParseFailure {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Persistence failure at {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnomalyError {
    /// Shorthand for an [`AnomalyError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`AnomalyError::ParseFailure`].
    pub fn parse(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ParseFailure {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`AnomalyError::Persistence`].
    pub fn persistence(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for anomaly engine operations.
pub type Result<T> = std::result::Result<T, AnomalyError>;
