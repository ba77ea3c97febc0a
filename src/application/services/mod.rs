//! Application services
//!
//! Hierarchy components are concrete structs over the store traits.
//! `CategoryService` composes them and owns the write scope.

mod cascade;
mod category;
mod path;
mod tree;
mod validator;

pub use cascade::{CascadeDeleteHandler, DeleteOutcome};
pub use category::{CategoryService, HierarchyOptions, DEFAULT_MAX_DEPTH, MAX_CONFLICT_RETRIES};
pub use path::{PathResolver, DEFAULT_SEPARATOR};
pub use tree::{sort_by_name, TreeBuilder};
pub use validator::HierarchyValidator;
