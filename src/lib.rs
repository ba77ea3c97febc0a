//! catree: category hierarchy engine
//!
//! Maintains a forest of categories linked by `parent_id`, rejects
//! assignments that would create cycles, resolves root-first paths, builds
//! nested trees and deletes categories by re-parenting their children.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::services::{CategoryService, HierarchyOptions};
pub use application::{ApplicationError, ApplicationResult};
pub use domain::{Category, CategoryId, CategoryNode, CategoryPatch, DomainError, NewCategory};
