//! Error types for the roster SDK.

use thiserror::Error;

/// Batch-level failures of the roster API.
///
/// Row-level problems never surface here; they are reported inside
/// [`crate::UpsertBatchResult::item_errors`].
#[derive(Error, Debug, Clone)]
pub enum RosterError {
    /// The member store could not be reached. The caller should retry the
    /// whole batch later.
    #[error("Member store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Internal error")]
    Internal,
}

impl RosterError {
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }
}
