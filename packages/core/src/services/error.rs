//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations, providing
//! detailed error handling for list persistence and read-back failures.

use crate::db::DatabaseError;
use crate::tree::StructureError;
use thiserror::Error;

/// List service errors
///
/// Provides high-level error types for all list operations,
/// with detailed context and proper error chaining.
#[derive(Error, Debug)]
pub enum ListServiceError {
    /// List not found by ID
    #[error("List not found: {list_id}")]
    ListNotFound { list_id: i64 },

    /// Stored pointer rows do not form a valid chain
    #[error("Corrupted list structure: {0}")]
    CorruptedStructure(#[from] StructureError),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(DatabaseError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<DatabaseError> for ListServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ListNotFound { list_id } => Self::ListNotFound { list_id },
            other => Self::DatabaseError(other),
        }
    }
}

impl ListServiceError {
    /// Create a list not found error
    pub fn list_not_found(list_id: i64) -> Self {
        Self::ListNotFound { list_id }
    }

    /// Create a serialization error
    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}
