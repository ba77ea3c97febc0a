//! Infrastructure layer: store implementations and DI container
//!
//! This layer implements the store boundary traits and wires up services.

pub mod batch;
pub mod di;
pub mod error;
pub mod json_store;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
