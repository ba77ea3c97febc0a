//! Application-level errors (wraps domain and store errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::StoreError;

/// Application errors wrap domain errors and add storage and config failures.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// Stable error code for the transport layer.
    pub fn code(&self) -> &'static str {
        match self {
            ApplicationError::Domain(e) => e.code(),
            ApplicationError::Store(_) => "StoreFailure",
            ApplicationError::Config { .. } => "Config",
        }
    }

    /// The domain error, if this is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApplicationError::Store(e) if e.is_conflict())
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
