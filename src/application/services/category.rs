//! Category service
//!
//! Facade over the hierarchy components. Every hierarchy-mutating operation
//! runs validate-then-commit inside one write scope, so two reassignments
//! validated in parallel cannot jointly create a cycle.

use std::sync::{Arc, Mutex};

use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

use crate::application::services::cascade::{CascadeDeleteHandler, DeleteOutcome};
use crate::application::services::path::{PathResolver, DEFAULT_SEPARATOR};
use crate::application::services::tree::{sort_by_name, TreeBuilder};
use crate::application::services::validator::HierarchyValidator;
use crate::application::ApplicationResult;
use crate::domain::{
    name_key, Category, CategoryDetail, CategoryId, CategoryNode, CategoryPatch, CountedCategory,
    DomainError, IntegrityIssue, ListQuery, NewCategory, Page,
};
use crate::infrastructure::error::StoreError;
use crate::infrastructure::traits::{CategoryStore, ItemCounter};

/// Attempts for a validate-and-write that loses an optimistic revision race.
pub const MAX_CONFLICT_RETRIES: usize = 3;

/// Default ancestor-walk cap.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Tunables for the hierarchy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyOptions {
    pub max_depth: usize,
    pub path_separator: String,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            path_separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// Service for category hierarchy mutations and queries.
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    items: Arc<dyn ItemCounter>,
    validator: HierarchyValidator,
    paths: PathResolver,
    trees: TreeBuilder,
    cascade: CascadeDeleteHandler,
    options: HierarchyOptions,
    write_scope: Mutex<()>,
}

impl CategoryService {
    pub fn new(
        store: Arc<dyn CategoryStore>,
        items: Arc<dyn ItemCounter>,
        options: HierarchyOptions,
    ) -> Self {
        let max_depth = options.max_depth.max(1);
        Self {
            validator: HierarchyValidator::new(store.clone(), max_depth),
            paths: PathResolver::new(store.clone(), max_depth),
            trees: TreeBuilder::new(store.clone(), items.clone(), max_depth),
            cascade: CascadeDeleteHandler::new(store.clone(), items.clone()),
            store,
            items,
            options,
            write_scope: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &HierarchyOptions {
        &self.options
    }

    pub fn validator(&self) -> &HierarchyValidator {
        &self.validator
    }

    /// Run `op` inside the write scope, retrying on revision conflicts.
    fn serialized<T>(&self, op: impl Fn() -> ApplicationResult<T>) -> ApplicationResult<T> {
        let _guard = self
            .write_scope
            .lock()
            .map_err(|_| StoreError::poisoned("write scope"))?;

        let mut attempt = 1;
        loop {
            match op() {
                Err(e) if e.is_conflict() && attempt < MAX_CONFLICT_RETRIES => {
                    warn!("write conflict (attempt {}), retrying: {}", attempt, e);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn ensure_unique_name(&self, name: &str, except: Option<CategoryId>) -> ApplicationResult<()> {
        match self.store.find_by_name(name)? {
            Some(existing) if Some(existing.id) != except => {
                Err(DomainError::DuplicateName(name.to_string()).into())
            }
            _ => Ok(()),
        }
    }

    /// Create a category under an existing active parent, or as a root.
    #[instrument(level = "debug", skip(self, new), fields(name = %new.name))]
    pub fn create(&self, new: NewCategory) -> ApplicationResult<Category> {
        let new = new.normalized()?;
        let created = self.serialized(|| {
            self.ensure_unique_name(&new.name, None)?;
            let id = CategoryId::new();
            self.validator.validate_parent_assignment(id, new.parent_id)?;
            Ok(self.store.create(Category::from_new(id, new.clone()))?)
        })?;
        info!("created category {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Apply a partial update; only a changed parent is re-validated.
    #[instrument(level = "debug", skip(self, patch))]
    pub fn update(&self, id: CategoryId, patch: CategoryPatch) -> ApplicationResult<Category> {
        let patch = patch.normalized()?;
        let updated = self.serialized(|| {
            let current = self.get(id)?;
            if patch.is_empty() {
                return Ok(current);
            }

            if let Some(name) = &patch.name {
                if name_key(name) != current.name_key() {
                    self.ensure_unique_name(name, Some(id))?;
                }
            }

            let mut next = current.clone();
            patch.apply_to(&mut next);

            if next.parent_id != current.parent_id {
                self.validator.validate_parent_assignment(id, next.parent_id)?;
            }
            self.check_activity_change(&current, &next)?;

            Ok(self.store.update(next)?)
        })?;
        info!("updated category {} ({})", updated.name, updated.id);
        Ok(updated)
    }

    /// Keep active records anchored on active parents.
    fn check_activity_change(&self, current: &Category, next: &Category) -> ApplicationResult<()> {
        if current.is_active && !next.is_active {
            let count = self
                .store
                .find_by_parent(Some(current.id))?
                .iter()
                .filter(|c| c.is_active)
                .count();
            if count > 0 {
                return Err(DomainError::ActiveChildren {
                    category: current.id,
                    count,
                }
                .into());
            }
        }
        if !current.is_active && next.is_active {
            if let Some(parent_id) = next.parent_id {
                let parent_active = self.store.get(parent_id)?.is_some_and(|p| p.is_active);
                if !parent_active {
                    return Err(DomainError::ParentInactive(parent_id).into());
                }
            }
        }
        Ok(())
    }

    /// Delete with item check and re-parenting of children.
    pub fn delete(&self, id: CategoryId) -> ApplicationResult<DeleteOutcome> {
        self.serialized(|| self.cascade.delete_category(id))
    }

    /// Check a parent assignment without writing.
    pub fn validate_parent_assignment(
        &self,
        id: CategoryId,
        candidate_parent_id: Option<CategoryId>,
    ) -> ApplicationResult<()> {
        self.validator.validate_parent_assignment(id, candidate_parent_id)
    }

    pub fn get(&self, id: CategoryId) -> ApplicationResult<Category> {
        Ok(self.store.get(id)?.ok_or(DomainError::NotFound(id))?)
    }

    pub fn find_by_name(&self, name: &str) -> ApplicationResult<Option<Category>> {
        Ok(self.store.find_by_name(name)?)
    }

    /// Record plus path, item count and direct children.
    pub fn detail(&self, id: CategoryId) -> ApplicationResult<CategoryDetail> {
        let category = self.get(id)?;
        let path = self.paths.resolve_path(id)?;
        let items_count = self.trees.items_count(id);
        let mut subcategories = self.store.find_by_parent(Some(id))?;
        sort_by_name(&mut subcategories);
        Ok(CategoryDetail {
            category,
            path,
            items_count,
            subcategories,
        })
    }

    /// Root-first names of the ancestor chain.
    pub fn path(&self, id: CategoryId) -> ApplicationResult<Vec<String>> {
        self.paths.resolve_path(id)
    }

    /// Ancestor chain joined with the configured separator.
    pub fn path_display(&self, id: CategoryId) -> ApplicationResult<String> {
        self.paths.resolve_display(id, &self.options.path_separator)
    }

    pub fn tree(&self, parent_id: Option<CategoryId>) -> ApplicationResult<Vec<CategoryNode>> {
        self.trees.build_tree(parent_id)
    }

    pub fn descendants(&self, id: CategoryId) -> ApplicationResult<Vec<Category>> {
        self.trees.descendants(id)
    }

    /// Paged listing sorted by name.
    pub fn list(&self, query: &ListQuery) -> ApplicationResult<Page> {
        let limit = query.limit.max(1);
        let page = query.page.max(1);
        let needle = query.search.as_deref().map(name_key).filter(|s| !s.is_empty());

        let mut matching: Vec<Category> = if query.include_inactive {
            self.store.find_all()?
        } else {
            self.store.find_active()?
        };
        if let Some(needle) = &needle {
            matching.retain(|c| c.name_key().contains(needle.as_str()));
        }
        sort_by_name(&mut matching);

        let total = matching.len();
        let pages = total.div_ceil(limit);
        let categories = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        debug!("list: {} matching, page {}/{}", total, page, pages);

        Ok(Page {
            categories,
            page,
            limit,
            total,
            pages,
        })
    }

    /// Active roots with item counts, by name.
    pub fn roots(&self) -> ApplicationResult<Vec<CountedCategory>> {
        let mut roots: Vec<Category> = self
            .store
            .find_by_parent(None)?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        sort_by_name(&mut roots);
        Ok(roots
            .into_iter()
            .map(|category| CountedCategory {
                items_count: self.trees.items_count(category.id),
                category,
            })
            .collect())
    }

    /// Active categories with the most items first; ties by name.
    pub fn top(&self, limit: usize) -> ApplicationResult<Vec<CountedCategory>> {
        let active = self.store.find_active()?;
        let ids: Vec<CategoryId> = active.iter().map(|c| c.id).collect();
        let counts = self.items.count_by_categories(&ids)?;

        Ok(active
            .into_iter()
            .map(|category| CountedCategory {
                items_count: counts.get(&category.id).copied().unwrap_or(0),
                category,
            })
            .sorted_by(|a, b| {
                b.items_count
                    .cmp(&a.items_count)
                    .then_with(|| name_key(&a.category.name).cmp(&name_key(&b.category.name)))
                    .then_with(|| a.category.id.cmp(&b.category.id))
            })
            .take(limit)
            .collect())
    }

    /// Audit stored data for dangling parents, inactive parents of active
    /// records, and ancestor chains that never reach a root.
    #[instrument(level = "debug", skip(self))]
    pub fn verify(&self) -> ApplicationResult<Vec<IntegrityIssue>> {
        let records = self.store.find_all()?;
        let by_id: std::collections::HashMap<CategoryId, &Category> =
            records.iter().map(|c| (c.id, c)).collect();
        let max_depth = self.validator.max_depth();
        let mut issues = Vec::new();

        for category in records.iter().sorted_by_key(|c| c.id) {
            if let Some(parent_id) = category.parent_id {
                match by_id.get(&parent_id) {
                    None => issues.push(IntegrityIssue::DanglingParent {
                        category: category.id,
                        parent: parent_id,
                    }),
                    Some(parent) if category.is_active && !parent.is_active => {
                        issues.push(IntegrityIssue::InactiveParent {
                            category: category.id,
                            parent: parent_id,
                        })
                    }
                    Some(_) => {}
                }
            }

            let mut steps = 1;
            let mut next = category.parent_id;
            while let Some(id) = next {
                if id == category.id || steps >= max_depth {
                    issues.push(IntegrityIssue::Cycle {
                        category: category.id,
                    });
                    break;
                }
                steps += 1;
                next = by_id.get(&id).and_then(|c| c.parent_id);
            }
        }

        if !issues.is_empty() {
            warn!("verify: {} integrity issues", issues.len());
        }
        Ok(issues)
    }
}

impl std::fmt::Debug for CategoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryService")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
