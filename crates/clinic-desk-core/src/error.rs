//! Desk-level errors.

use thiserror::Error;

use crate::db::DbError;

/// Errors surfaced by desk operations.
#[derive(Error, Debug)]
pub enum DeskError {
    /// The operation referenced an ID absent from its collection.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Input failed validation; the message is user-facing.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Imported data could not be parsed at all.
    #[error("Storage corrupt: {0}")]
    StorageCorrupt(String),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

impl DeskError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        DeskError::NotFound { entity, id }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        DeskError::ValidationFailed(message.into())
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
