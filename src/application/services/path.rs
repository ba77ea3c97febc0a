//! Ancestor path resolution

use std::sync::Arc;

use tracing::{error, instrument, warn};

use crate::application::ApplicationResult;
use crate::domain::{Category, CategoryId, DomainError};
use crate::infrastructure::traits::CategoryStore;

/// Default separator for displayed paths.
pub const DEFAULT_SEPARATOR: &str = " > ";

/// Computes root-first ancestor chains.
pub struct PathResolver {
    store: Arc<dyn CategoryStore>,
    max_depth: usize,
}

impl PathResolver {
    pub fn new(store: Arc<dyn CategoryStore>, max_depth: usize) -> Self {
        Self {
            store,
            max_depth: max_depth.max(1),
        }
    }

    /// Names from the root down to `category_id`.
    ///
    /// A broken parent reference ends the walk and yields the partial path.
    pub fn resolve_path(&self, category_id: CategoryId) -> ApplicationResult<Vec<String>> {
        Ok(self
            .ancestors(category_id)?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Records from the root down to `category_id`, inclusive.
    #[instrument(level = "debug", skip(self))]
    pub fn ancestors(&self, category_id: CategoryId) -> ApplicationResult<Vec<Category>> {
        let start = self
            .store
            .get(category_id)?
            .ok_or(DomainError::NotFound(category_id))?;

        let mut next = start.parent_id;
        let mut chain = vec![start];

        while let Some(parent_id) = next {
            if chain.len() >= self.max_depth {
                error!(
                    "path walk from {} exceeded {} levels",
                    category_id, self.max_depth
                );
                return Err(DomainError::CorruptedHierarchy {
                    start: category_id,
                    max_depth: self.max_depth,
                }
                .into());
            }
            match self.store.get(parent_id)? {
                Some(parent) => {
                    next = parent.parent_id;
                    chain.push(parent);
                }
                None => {
                    warn!(
                        "path of {} stops at missing parent {}",
                        category_id, parent_id
                    );
                    break;
                }
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Path joined with `separator`, e.g. `Electronics > Laptops`.
    pub fn resolve_display(
        &self,
        category_id: CategoryId,
        separator: &str,
    ) -> ApplicationResult<String> {
        Ok(self.resolve_path(category_id)?.join(separator))
    }
}
