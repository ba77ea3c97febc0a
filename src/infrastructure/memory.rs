//! In-memory store and item counter

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::Utc;
use tracing::trace;

use crate::domain::{Category, CategoryId};
use crate::infrastructure::batch::WriteBatch;
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::{CategoryStore, ItemCounter};

/// Process-local category store.
#[derive(Debug, Default)]
pub struct MemoryCategoryStore {
    records: RwLock<BTreeMap<CategoryId, Category>>,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with records as-is, bypassing validation and stamping.
    ///
    /// Lets tests reproduce corrupted data such as cycles or dangling parents.
    pub fn with_records(records: impl IntoIterator<Item = Category>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|c| (c.id, c)).collect()),
        }
    }
}

impl CategoryStore for MemoryCategoryStore {
    fn get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::poisoned("category store"))?;
        Ok(records.get(&id).cloned())
    }

    fn find_by_parent(&self, parent_id: Option<CategoryId>) -> StoreResult<Vec<Category>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::poisoned("category store"))?;
        Ok(records
            .values()
            .filter(|c| c.parent_id == parent_id)
            .cloned()
            .collect())
    }

    fn find_all(&self) -> StoreResult<Vec<Category>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::poisoned("category store"))?;
        Ok(records.values().cloned().collect())
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::poisoned("category store"))?;
        let staged = batch.apply_to(&records, Utc::now())?;
        *records = staged;
        trace!("commit: applied {} ops", batch.len());
        Ok(())
    }
}

/// Item counts keyed by category, maintained directly by the caller.
#[derive(Debug, Default)]
pub struct MemoryItemCounter {
    counts: RwLock<HashMap<CategoryId, u64>>,
}

impl MemoryItemCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: CategoryId, count: u64) -> StoreResult<()> {
        let mut counts = self
            .counts
            .write()
            .map_err(|_| StoreError::poisoned("item counter"))?;
        if count == 0 {
            counts.remove(&id);
        } else {
            counts.insert(id, count);
        }
        Ok(())
    }
}

impl ItemCounter for MemoryItemCounter {
    fn count_by_category(&self, id: CategoryId) -> StoreResult<u64> {
        let counts = self
            .counts
            .read()
            .map_err(|_| StoreError::poisoned("item counter"))?;
        Ok(counts.get(&id).copied().unwrap_or(0))
    }
}
