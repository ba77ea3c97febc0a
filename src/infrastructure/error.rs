//! Storage-level errors

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::CategoryId;

/// Errors raised by category stores and item counters.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document {0} was modified concurrently")]
    Conflict(PathBuf),

    #[error("record not found in store: {0}")]
    MissingRecord(CategoryId),

    #[error("record already exists in store: {0}")]
    DuplicateId(CategoryId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Lock poisoning means a writer panicked mid-operation.
    pub fn poisoned(what: &str) -> Self {
        Self::Unavailable(format!("{what} lock poisoned"))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
