//! I/O boundary traits for testability
//!
//! These traits abstract the document store and the item collection, allowing
//! the hierarchy services to be tested with in-memory implementations.

use std::collections::HashMap;

use crate::domain::{name_key, Category, CategoryId};
use crate::infrastructure::batch::WriteBatch;
use crate::infrastructure::error::{StoreError, StoreResult};

/// Key-indexed category persistence.
///
/// Holds the authoritative copy of every record. Mutations go through
/// [`CategoryStore::commit`], which applies a batch fully or not at all.
pub trait CategoryStore: Send + Sync {
    /// Fetch one record by id.
    fn get(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    /// Direct children of `parent_id`; `None` returns the roots.
    fn find_by_parent(&self, parent_id: Option<CategoryId>) -> StoreResult<Vec<Category>>;

    /// Every record, active or not.
    fn find_all(&self) -> StoreResult<Vec<Category>>;

    /// Apply a batch atomically.
    fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Every active record.
    fn find_active(&self) -> StoreResult<Vec<Category>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|c| c.is_active)
            .collect())
    }

    /// Case-insensitive exact name lookup.
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        let key = name_key(name);
        Ok(self.find_all()?.into_iter().find(|c| c.name_key() == key))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.find_all()?.len())
    }

    /// Insert one record and return it as stored.
    fn create(&self, category: Category) -> StoreResult<Category> {
        let id = category.id;
        self.commit(WriteBatch::new().insert(category))?;
        self.get(id)?.ok_or(StoreError::MissingRecord(id))
    }

    /// Replace one record and return it as stored.
    fn update(&self, category: Category) -> StoreResult<Category> {
        let id = category.id;
        self.commit(WriteBatch::new().update(category))?;
        self.get(id)?.ok_or(StoreError::MissingRecord(id))
    }

    /// Raw removal. Callers outside the store go through the cascade-delete handler.
    fn delete(&self, id: CategoryId) -> StoreResult<()> {
        self.commit(WriteBatch::new().delete(id))
    }
}

/// Counting view over the external item collection.
pub trait ItemCounter: Send + Sync {
    /// Number of items whose category is `id`.
    fn count_by_category(&self, id: CategoryId) -> StoreResult<u64>;

    /// Counts for several categories; fails if any single lookup fails.
    fn count_by_categories(&self, ids: &[CategoryId]) -> StoreResult<HashMap<CategoryId, u64>> {
        ids.iter()
            .map(|&id| self.count_by_category(id).map(|n| (id, n)))
            .collect()
    }
}
