//! Single-file JSON document store
//!
//! Layout: `{ "categories": [...], "items": [{ "id": ..., "categoryId": ... }] }`.
//! Reads are served from the copy loaded at open time. Commits re-hash the file
//! on disk and refuse to write if another process changed it since (optimistic
//! concurrency), then replace the file atomically.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

use crate::domain::{Category, CategoryId};
use crate::infrastructure::batch::WriteBatch;
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::{CategoryStore, ItemCounter};

/// Reference from an external item to its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub id: String,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    items: Vec<ItemRef>,
}

#[derive(Debug, Default)]
struct Loaded {
    categories: BTreeMap<CategoryId, Category>,
    items: Vec<ItemRef>,
    /// Hash of the bytes loaded; None when the file did not exist
    revision: Option<String>,
}

/// Compute 16-character hex revision token (first 64 bits of SHA-256).
pub fn revision_token(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

/// Category store persisted as one JSON document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<Loaded>,
}

impl JsonFileStore {
    /// Open (or lazily create) the document at `path`.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> StoreResult<Self> {
        let loaded = Self::load(path)?;
        debug!(
            "open: {} categories, {} items, revision={:?}",
            loaded.categories.len(),
            loaded.items.len(),
            loaded.revision
        );
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(loaded),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Revision token of the copy currently held.
    pub fn revision(&self) -> StoreResult<Option<String>> {
        Ok(self.lock()?.revision.clone())
    }

    /// Discard the held copy and re-read the file.
    pub fn reload(&self) -> StoreResult<()> {
        let fresh = Self::load(&self.path)?;
        *self.lock()? = fresh;
        Ok(())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Loaded>> {
        self.state
            .lock()
            .map_err(|_| StoreError::poisoned("document"))
    }

    fn read_bytes(path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(format!("read {}", path.display()), e)),
        }
    }

    fn load(path: &Path) -> StoreResult<Loaded> {
        let Some(bytes) = Self::read_bytes(path)? else {
            return Ok(Loaded::default());
        };
        let document: Document = if bytes.iter().all(u8::is_ascii_whitespace) {
            Document::default()
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::serialization(format!("parse {}", path.display()), e))?
        };
        Ok(Loaded {
            categories: document.categories.into_iter().map(|c| (c.id, c)).collect(),
            items: document.items,
            revision: Some(revision_token(&bytes)),
        })
    }

    fn write_atomic(&self, bytes: &[u8]) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| StoreError::io(format!("create {}", dir.display()), e))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| StoreError::io(format!("create temp file in {}", dir.display()), e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io("write temp document", e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(format!("replace {}", self.path.display()), e.error))?;
        Ok(())
    }
}

impl CategoryStore for JsonFileStore {
    fn get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.lock()?.categories.get(&id).cloned())
    }

    fn find_by_parent(&self, parent_id: Option<CategoryId>) -> StoreResult<Vec<Category>> {
        Ok(self
            .lock()?
            .categories
            .values()
            .filter(|c| c.parent_id == parent_id)
            .cloned()
            .collect())
    }

    fn find_all(&self) -> StoreResult<Vec<Category>> {
        Ok(self.lock()?.categories.values().cloned().collect())
    }

    #[instrument(level = "debug", skip(self, batch), fields(ops = batch.len()))]
    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut state = self.lock()?;

        let on_disk = Self::read_bytes(&self.path)?.map(|b| revision_token(&b));
        if on_disk != state.revision {
            warn!(
                "commit: {} changed on disk (held {:?}, found {:?}); reloading",
                self.path.display(),
                state.revision,
                on_disk
            );
            *state = Self::load(&self.path)?;
            return Err(StoreError::Conflict(self.path.clone()));
        }

        let staged = batch.apply_to(&state.categories, Utc::now())?;
        let document = Document {
            categories: staged.values().cloned().collect(),
            items: state.items.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| StoreError::serialization("serialize document", e))?;
        self.write_atomic(&bytes)?;

        state.categories = staged;
        state.revision = Some(revision_token(&bytes));
        Ok(())
    }
}

impl ItemCounter for JsonFileStore {
    fn count_by_category(&self, id: CategoryId) -> StoreResult<u64> {
        let count = self
            .lock()?
            .items
            .iter()
            .filter(|item| item.category_id == id)
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewCategory;
    use tempfile::TempDir;

    #[test]
    fn given_same_bytes_when_hashing_then_same_token() {
        assert_eq!(revision_token(b"{}"), revision_token(b"{}"));
        assert_ne!(revision_token(b"{}"), revision_token(b"[]"));
        assert_eq!(revision_token(b"{}").len(), 16);
    }

    #[test]
    fn given_missing_file_when_opening_then_empty_store() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::open(&temp.path().join("nested/categories.json")).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.revision().unwrap(), None);
    }

    #[test]
    fn given_commit_when_reopening_then_records_persist() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/categories.json");
        let store = JsonFileStore::open(&path).unwrap();
        let created = store
            .create(Category::from_new(
                CategoryId::new(),
                NewCategory::root("Electronics", "tester"),
            ))
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(created.id).unwrap(), Some(created));
        assert!(reopened.revision().unwrap().is_some());
    }

    #[test]
    fn given_external_write_when_committing_then_conflict_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("categories.json");
        let first = JsonFileStore::open(&path).unwrap();
        let second = JsonFileStore::open(&path).unwrap();

        first
            .create(Category::from_new(
                CategoryId::new(),
                NewCategory::root("Electronics", "tester"),
            ))
            .unwrap();

        let result = second.create(Category::from_new(
            CategoryId::new(),
            NewCategory::root("Furniture", "tester"),
        ));
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        // After the conflict the second handle sees the first handle's write
        assert_eq!(second.count().unwrap(), 1);
        second
            .create(Category::from_new(
                CategoryId::new(),
                NewCategory::root("Furniture", "tester"),
            ))
            .unwrap();
        assert_eq!(JsonFileStore::open(&path).unwrap().count().unwrap(), 2);
    }

    #[test]
    fn given_items_in_document_when_counting_then_groups_by_category() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("categories.json");
        let id = CategoryId::new();
        let doc = serde_json::json!({
            "categories": [],
            "items": [
                { "id": "i1", "categoryId": id.to_string() },
                { "id": "i2", "categoryId": id.to_string() },
                { "id": "i3", "categoryId": CategoryId::new().to_string() }
            ]
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.count_by_category(id).unwrap(), 2);
    }

    #[test]
    fn given_items_when_committing_categories_then_items_preserved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("categories.json");
        let id = CategoryId::new();
        let doc = serde_json::json!({
            "items": [{ "id": "i1", "categoryId": id.to_string() }]
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        store
            .create(Category::from_new(
                CategoryId::new(),
                NewCategory::root("Electronics", "tester"),
            ))
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.count_by_category(id).unwrap(), 1);
    }

    #[test]
    fn given_garbage_file_when_opening_then_serialization_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("categories.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Serialization { .. })
        ));
    }
}
