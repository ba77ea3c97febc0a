//! Service container for dependency injection
//!
//! Wires up the category service with its store and item counter.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::CategoryService;
use crate::config::Settings;
use crate::infrastructure::error::StoreResult;
use crate::infrastructure::json_store::JsonFileStore;
use crate::infrastructure::traits::{CategoryStore, ItemCounter};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Category persistence
    pub store: Arc<dyn CategoryStore>,

    /// Item reference counts per category
    pub items: Arc<dyn ItemCounter>,

    pub categories: CategoryService,
}

impl ServiceContainer {
    /// Create a container backed by the JSON document at `settings.store_path`.
    ///
    /// The document serves both as category store and item counter.
    pub fn new(settings: Settings) -> StoreResult<Self> {
        let file = Arc::new(JsonFileStore::open(&settings.store_path)?);
        debug!("using store {}", file.path().display());
        Ok(Self::with_deps(settings, file.clone(), file))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        store: Arc<dyn CategoryStore>,
        items: Arc<dyn ItemCounter>,
    ) -> Self {
        let settings = Arc::new(settings);
        let categories =
            CategoryService::new(store.clone(), items.clone(), settings.hierarchy_options());

        Self {
            settings,
            store,
            items,
            categories,
        }
    }
}
