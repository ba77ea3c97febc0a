//! Parent assignment validation
//!
//! Decides whether giving a category a new parent keeps the forest acyclic,
//! within the depth cap, and anchored on an existing active parent.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::application::ApplicationResult;
use crate::domain::{CategoryId, DomainError};
use crate::infrastructure::traits::CategoryStore;

/// Validates proposed `parent_id` assignments against the stored hierarchy.
pub struct HierarchyValidator {
    store: Arc<dyn CategoryStore>,
    max_depth: usize,
}

impl HierarchyValidator {
    pub fn new(store: Arc<dyn CategoryStore>, max_depth: usize) -> Self {
        Self {
            store,
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check that `category_id` may take `candidate_parent_id` as its parent.
    ///
    /// `category_id` need not exist yet (create path). `None` always passes.
    /// Never writes.
    #[instrument(level = "debug", skip(self))]
    pub fn validate_parent_assignment(
        &self,
        category_id: CategoryId,
        candidate_parent_id: Option<CategoryId>,
    ) -> ApplicationResult<()> {
        let Some(parent_id) = candidate_parent_id else {
            return Ok(());
        };

        if parent_id == category_id {
            return Err(DomainError::SelfParent(category_id).into());
        }

        let parent = self
            .store
            .get(parent_id)?
            .ok_or(DomainError::ParentNotFound(parent_id))?;
        if !parent.is_active {
            return Err(DomainError::ParentInactive(parent_id).into());
        }

        let parent_depth = self.ancestor_depth(category_id, parent_id)?;
        let below = self.subtree_height(category_id)?;
        debug!(
            "validate: parent depth {}, subtree height {}, cap {}",
            parent_depth, below, self.max_depth
        );
        if parent_depth + 1 + below > self.max_depth {
            return Err(DomainError::DepthExceeded {
                category: category_id,
                max_depth: self.max_depth,
            }
            .into());
        }

        Ok(())
    }

    /// Walk up from `start`, failing if `category_id` is met.
    ///
    /// Returns the number of nodes on the chain, `start` included.
    fn ancestor_depth(&self, category_id: CategoryId, start: CategoryId) -> ApplicationResult<usize> {
        let mut current = Some(start);
        let mut visited = 0usize;

        while let Some(id) = current {
            if id == category_id {
                return Err(DomainError::CyclicHierarchy {
                    category: category_id,
                    parent: start,
                }
                .into());
            }
            visited += 1;
            if visited > self.max_depth {
                error!("ancestor walk from {} exceeded {} levels", start, self.max_depth);
                return Err(DomainError::CorruptedHierarchy {
                    start,
                    max_depth: self.max_depth,
                }
                .into());
            }
            current = match self.store.get(id)? {
                Some(node) => node.parent_id,
                None => {
                    warn!("ancestor walk from {} hit dangling reference {}", start, id);
                    None
                }
            };
        }

        Ok(visited)
    }

    /// Levels strictly below `category_id`; 0 for a leaf or an unknown id.
    fn subtree_height(&self, category_id: CategoryId) -> ApplicationResult<usize> {
        let mut seen = HashSet::from([category_id]);
        let mut level = vec![category_id];
        let mut height = 0usize;

        loop {
            let mut next = Vec::new();
            for id in &level {
                for child in self.store.find_by_parent(Some(*id))? {
                    if !seen.insert(child.id) {
                        return Err(DomainError::CorruptedHierarchy {
                            start: category_id,
                            max_depth: self.max_depth,
                        }
                        .into());
                    }
                    next.push(child.id);
                }
            }
            if next.is_empty() {
                return Ok(height);
            }
            height += 1;
            if height > self.max_depth {
                return Err(DomainError::CorruptedHierarchy {
                    start: category_id,
                    max_depth: self.max_depth,
                }
                .into());
            }
            level = next;
        }
    }
}
