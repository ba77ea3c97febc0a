//! Safe category deletion with re-parenting
//!
//! The only sanctioned way to remove a category. Children move up one level
//! to the deleted category's own parent; the re-parenting and the removal are
//! committed as one batch.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::ApplicationResult;
use crate::domain::{Category, CategoryId, DomainError};
use crate::infrastructure::batch::WriteBatch;
use crate::infrastructure::traits::{CategoryStore, ItemCounter};

/// Outcome of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// The removed record
    pub removed: Category,
    /// Former children, now pointing at `removed.parent_id`
    pub reparented: Vec<CategoryId>,
}

pub struct CascadeDeleteHandler {
    store: Arc<dyn CategoryStore>,
    items: Arc<dyn ItemCounter>,
}

impl CascadeDeleteHandler {
    pub fn new(store: Arc<dyn CategoryStore>, items: Arc<dyn ItemCounter>) -> Self {
        Self { store, items }
    }

    /// Delete `category_id` if no item references it.
    ///
    /// A counter failure aborts the delete; it is not treated as zero.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_category(&self, category_id: CategoryId) -> ApplicationResult<DeleteOutcome> {
        let category = self
            .store
            .get(category_id)?
            .ok_or(DomainError::NotFound(category_id))?;

        let count = self.items.count_by_category(category_id)?;
        if count > 0 {
            return Err(DomainError::CategoryInUse {
                category: category_id,
                count,
            }
            .into());
        }

        let children = self.store.find_by_parent(Some(category_id))?;
        let reparented: Vec<CategoryId> = children.iter().map(|c| c.id).collect();
        debug!(
            "delete: moving {} children of {} to {:?}",
            reparented.len(),
            category_id,
            category.parent_id
        );

        let mut batch = WriteBatch::new();
        for mut child in children {
            child.parent_id = category.parent_id;
            batch = batch.update(child);
        }
        self.store.commit(batch.delete(category_id))?;

        info!(
            "deleted category {} ({}), re-parented {}",
            category.name,
            category_id,
            reparented.len()
        );
        Ok(DeleteOutcome {
            removed: category,
            reparented,
        })
    }
}
