use roster_sdk::RosterError;
use thiserror::Error;

use super::ports::StoreError;

/// Batch-level failures of the reconciliation engine.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Member store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(message) => Self::StoreUnavailable { message },
            StoreError::Other(message) => Self::Database { message },
        }
    }
}

/// Convert domain errors to SDK errors for public API consumption.
impl From<DomainError> for RosterError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::StoreUnavailable { message } | DomainError::Database { message } => {
                RosterError::unavailable(message)
            }
            DomainError::Validation { field, message } => RosterError::validation(field, message),
            DomainError::Internal { message } => {
                tracing::error!(error = %message, "Roster batch failed internally");
                RosterError::internal()
            }
        }
    }
}
