//! Domain layer: entities and invariants
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod node;

pub use arena::{TreeArena, TreeNode};
pub use entities::*;
pub use error::DomainError;
pub use node::{CategoryDetail, CategoryNode, CountedCategory, IntegrityIssue, ListQuery, Page};
