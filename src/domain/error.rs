//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::CategoryId;

/// Domain errors represent hierarchy invariant violations.
/// These are independent of storage concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("category not found: {0}")]
    NotFound(CategoryId),

    #[error("category cannot be its own parent: {0}")]
    SelfParent(CategoryId),

    #[error("parent category not found: {0}")]
    ParentNotFound(CategoryId),

    #[error("parent category is inactive: {0}")]
    ParentInactive(CategoryId),

    #[error("assigning parent {parent} to {category} would create a cycle")]
    CyclicHierarchy {
        category: CategoryId,
        parent: CategoryId,
    },

    #[error("hierarchy above {start} exceeds {max_depth} levels; stored data is corrupted")]
    CorruptedHierarchy { start: CategoryId, max_depth: usize },

    #[error("moving {category} there would nest the hierarchy deeper than {max_depth} levels")]
    DepthExceeded { category: CategoryId, max_depth: usize },

    #[error("cannot deactivate {category}: it still has {count} active subcategories")]
    ActiveChildren { category: CategoryId, count: usize },

    #[error("cannot delete category {category} with {count} items; move or delete the items first")]
    CategoryInUse { category: CategoryId, count: u64 },

    #[error("category name already exists: {0}")]
    DuplicateName(String),

    #[error("invalid category name: {0}")]
    InvalidName(String),

    #[error("invalid category description: {0}")]
    InvalidDescription(String),
}

impl DomainError {
    /// Stable error code for the transport layer.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NotFound",
            DomainError::SelfParent(_) => "SelfParent",
            DomainError::ParentNotFound(_) => "ParentNotFound",
            DomainError::ParentInactive(_) => "ParentInactive",
            DomainError::CyclicHierarchy { .. } => "CyclicHierarchy",
            DomainError::CorruptedHierarchy { .. } => "CorruptedHierarchy",
            DomainError::DepthExceeded { .. } => "DepthExceeded",
            DomainError::ActiveChildren { .. } => "ActiveChildren",
            DomainError::CategoryInUse { .. } => "CategoryInUse",
            DomainError::DuplicateName(_) => "DuplicateName",
            DomainError::InvalidName(_) | DomainError::InvalidDescription(_) => "InvalidInput",
        }
    }
}
