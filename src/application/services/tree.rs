//! Nested tree assembly and subtree listings
//!
//! Both walks use an explicit stack; depth is bounded by the configured cap.

use std::collections::HashSet;
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{name_key, Category, CategoryId, CategoryNode, DomainError, TreeArena};
use crate::infrastructure::traits::{CategoryStore, ItemCounter};

/// Sort siblings by name (case-insensitive, then exact, then id) for stable output.
pub fn sort_by_name(categories: &mut [Category]) {
    categories.sort_by(|a, b| {
        name_key(&a.name)
            .cmp(&name_key(&b.name))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Builds nested views of the active forest.
pub struct TreeBuilder {
    store: Arc<dyn CategoryStore>,
    items: Arc<dyn ItemCounter>,
    max_depth: usize,
}

impl TreeBuilder {
    pub fn new(store: Arc<dyn CategoryStore>, items: Arc<dyn ItemCounter>, max_depth: usize) -> Self {
        Self {
            store,
            items,
            max_depth: max_depth.max(1),
        }
    }

    /// Item count for display; an unavailable counter degrades to zero.
    pub fn items_count(&self, id: CategoryId) -> u64 {
        self.items.count_by_category(id).unwrap_or_else(|e| {
            warn!("item count for {} unavailable: {}", id, e);
            0
        })
    }

    /// Active subtree under `parent_id` (`None` = whole forest), children by name.
    ///
    /// Output for an unchanged store is identical across calls.
    #[instrument(level = "debug", skip(self))]
    pub fn build_tree(&self, parent_id: Option<CategoryId>) -> ApplicationResult<Vec<CategoryNode>> {
        if let Some(id) = parent_id {
            if self.store.get(id)?.is_none() {
                return Err(DomainError::NotFound(id).into());
            }
        }

        let mut tree = TreeArena::new();
        let mut seen: HashSet<CategoryId> = parent_id.into_iter().collect();
        let mut stack: Vec<(Option<CategoryId>, Option<Index>, usize)> = vec![(parent_id, None, 0)];

        while let Some((current, slot, depth)) = stack.pop() {
            let mut children: Vec<Category> = self
                .store
                .find_by_parent(current)?
                .into_iter()
                .filter(|c| c.is_active)
                .collect();
            if children.is_empty() {
                continue;
            }
            sort_by_name(&mut children);
            if depth >= self.max_depth {
                return Err(self.corrupted(current.unwrap_or(children[0].id)));
            }

            // Arena keeps insertion order per parent, so stack order does not matter
            for child in children {
                if !seen.insert(child.id) {
                    return Err(self.corrupted(parent_id.unwrap_or(child.id)));
                }
                let node = CategoryNode::leaf(&child, self.items_count(child.id));
                let idx = tree.insert_node(node, slot);
                stack.push((Some(child.id), Some(idx), depth + 1));
            }
        }

        debug!("build_tree: {} nodes, depth {}", tree.len(), tree.depth());
        Ok(tree.into_nested())
    }

    /// Every descendant of `category_id`, active or not, depth-first by name.
    #[instrument(level = "debug", skip(self))]
    pub fn descendants(&self, category_id: CategoryId) -> ApplicationResult<Vec<Category>> {
        if self.store.get(category_id)?.is_none() {
            return Err(DomainError::NotFound(category_id).into());
        }

        let mut result = Vec::new();
        let mut seen = HashSet::from([category_id]);
        let mut stack: Vec<(Category, usize)> = Vec::new();
        self.push_children(&mut stack, category_id, 1)?;

        while let Some((category, depth)) = stack.pop() {
            if depth > self.max_depth || !seen.insert(category.id) {
                return Err(self.corrupted(category_id));
            }
            let id = category.id;
            result.push(category);
            self.push_children(&mut stack, id, depth + 1)?;
        }

        Ok(result)
    }

    fn push_children(
        &self,
        stack: &mut Vec<(Category, usize)>,
        parent_id: CategoryId,
        depth: usize,
    ) -> ApplicationResult<()> {
        let mut children = self.store.find_by_parent(Some(parent_id))?;
        sort_by_name(&mut children);
        // Reverse so the alphabetically first child is popped first
        stack.extend(children.into_iter().rev().map(|c| (c, depth)));
        Ok(())
    }

    fn corrupted(&self, start: CategoryId) -> ApplicationError {
        warn!("tree walk from {} exceeded {} levels or revisited a node", start, self.max_depth);
        DomainError::CorruptedHierarchy {
            start,
            max_depth: self.max_depth,
        }
        .into()
    }
}
