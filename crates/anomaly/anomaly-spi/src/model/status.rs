//! Status records returned by lifecycle operations.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of train / save / load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, message}` record returned by lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub status: Status,
    pub message: String,
}

impl OperationStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Flatten a fallible operation into a status record, prefixing
    /// failures with `context`.
    pub fn from_result(result: Result<OperationStatus>, context: &str) -> Self {
        match result {
            Ok(status) => status,
            Err(e) => Self::error(format!("{}: {}", context, e)),
        }
    }
}
