//! All-or-nothing write batches

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::{Category, CategoryId};
use crate::infrastructure::error::{StoreError, StoreResult};

/// A single staged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Insert(Category),
    Update(Category),
    Delete(CategoryId),
}

/// Ordered mutations that a store applies fully or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, category: Category) -> Self {
        self.ops.push(WriteOp::Insert(category));
        self
    }

    pub fn update(mut self, category: Category) -> Self {
        self.ops.push(WriteOp::Update(category));
        self
    }

    pub fn delete(mut self, id: CategoryId) -> Self {
        self.ops.push(WriteOp::Delete(id));
        self
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply onto a staged copy of `records`; the caller swaps it in on success.
    ///
    /// Stamps `created_at`/`updated_at` with `now`.
    pub fn apply_to(
        &self,
        records: &BTreeMap<CategoryId, Category>,
        now: DateTime<Utc>,
    ) -> StoreResult<BTreeMap<CategoryId, Category>> {
        let mut staged = records.clone();
        for op in &self.ops {
            match op {
                WriteOp::Insert(category) => {
                    if staged.contains_key(&category.id) {
                        return Err(StoreError::DuplicateId(category.id));
                    }
                    let mut record = category.clone();
                    record.created_at = now;
                    record.updated_at = now;
                    staged.insert(record.id, record);
                }
                WriteOp::Update(category) => {
                    let existing = staged
                        .get_mut(&category.id)
                        .ok_or(StoreError::MissingRecord(category.id))?;
                    let created_at = existing.created_at;
                    *existing = category.clone();
                    existing.created_at = created_at;
                    existing.updated_at = now;
                }
                WriteOp::Delete(id) => {
                    staged.remove(id).ok_or(StoreError::MissingRecord(*id))?;
                }
            }
        }
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewCategory;

    fn category(name: &str) -> Category {
        Category::from_new(CategoryId::new(), NewCategory::root(name, "tester"))
    }

    #[test]
    fn given_failing_op_when_applying_then_source_untouched() {
        let tools = category("Tools");
        let mut records = BTreeMap::new();
        records.insert(tools.id, tools.clone());

        let batch = WriteBatch::new()
            .delete(tools.id)
            .delete(CategoryId::new());

        let result = batch.apply_to(&records, Utc::now());
        assert!(matches!(result, Err(StoreError::MissingRecord(_))));
        assert!(records.contains_key(&tools.id));
    }

    #[test]
    fn given_update_when_applying_then_keeps_created_at() {
        let tools = category("Tools");
        let mut records = BTreeMap::new();
        records.insert(tools.id, tools.clone());

        let mut renamed = tools.clone();
        renamed.name = "Hand Tools".to_string();
        renamed.created_at = Utc::now() + chrono::Duration::days(1);
        let now = Utc::now();

        let staged = WriteBatch::new().update(renamed).apply_to(&records, now).unwrap();
        let stored = &staged[&tools.id];
        assert_eq!(stored.name, "Hand Tools");
        assert_eq!(stored.created_at, tools.created_at);
        assert_eq!(stored.updated_at, now);
    }

    #[test]
    fn given_duplicate_insert_when_applying_then_rejects() {
        let tools = category("Tools");
        let mut records = BTreeMap::new();
        records.insert(tools.id, tools.clone());

        let result = WriteBatch::new().insert(tools).apply_to(&records, Utc::now());
        assert!(matches!(result, Err(StoreError::DuplicateId(_))));
    }
}
