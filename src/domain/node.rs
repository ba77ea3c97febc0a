//! Produced view types: nested tree nodes, details, pages.

use serde::{Deserialize, Serialize};

use crate::domain::{Category, CategoryId};

/// Nested tree node handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
    pub items_count: u64,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn leaf(category: &Category, items_count: u64) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            is_active: category.is_active,
            items_count,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, self included.
    pub fn size(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.children.iter());
        }
        total
    }
}

/// A category together with a derived item count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountedCategory {
    #[serde(flatten)]
    pub category: Category,
    pub items_count: u64,
}

/// Single-category view: record, ancestor path, item count, direct children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    /// Root-first names
    pub path: Vec<String>,
    pub items_count: u64,
    pub subcategories: Vec<Category>,
}

/// One page of a category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub categories: Vec<Category>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

/// Listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Case-insensitive substring match on name
    pub search: Option<String>,
    pub include_inactive: bool,
    /// 1-based
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            include_inactive: false,
            page: 1,
            limit: 10,
        }
    }
}

/// A problem found while auditing stored data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntegrityIssue {
    /// `parent_id` references a record that does not exist
    DanglingParent {
        category: CategoryId,
        parent: CategoryId,
    },
    /// `parent_id` references an inactive record
    InactiveParent {
        category: CategoryId,
        parent: CategoryId,
    },
    /// Walking up from `category` revisits a node or exceeds the depth cap
    Cycle { category: CategoryId },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::DanglingParent { category, parent } => {
                write!(f, "{category}: parent {parent} does not exist")
            }
            IntegrityIssue::InactiveParent { category, parent } => {
                write!(f, "{category}: parent {parent} is inactive")
            }
            IntegrityIssue::Cycle { category } => {
                write!(f, "{category}: ancestor chain does not terminate at a root")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewCategory;

    #[test]
    fn given_node_without_description_when_serialized_then_key_is_null() {
        let category = Category::from_new(CategoryId::new(), NewCategory::root("Tools", "t"));
        let value = serde_json::to_value(CategoryNode::leaf(&category, 3)).unwrap();

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["id", "name", "description", "isActive", "itemsCount", "children"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert!(value["description"].is_null());
    }
}
