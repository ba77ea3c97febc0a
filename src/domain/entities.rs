//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Maximum category name length, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Opaque, immutable category identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(Uuid);

impl CategoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A node of the category forest.
///
/// The parent relation is held as an id and resolved through the store,
/// never as an in-memory link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// None = root
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Opaque reference to the creating user
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Category {
    /// Build a fresh record from an already validated create request.
    pub fn from_new(id: CategoryId, new: NewCategory) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: new.name,
            description: new.description,
            parent_id: new.parent_id,
            is_active: true,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Key used for case-insensitive name uniqueness.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }
}

/// Create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub created_by: String,
}

impl NewCategory {
    pub fn root(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parent_id: None,
            created_by: created_by.into(),
        }
    }

    pub fn child(
        name: impl Into<String>,
        parent_id: CategoryId,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::root(name, created_by)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trim and length-check the textual fields.
    pub fn normalized(self) -> Result<Self, DomainError> {
        Ok(Self {
            name: validate_name(&self.name)?,
            description: validate_description(self.description.as_deref())?,
            ..self
        })
    }
}

/// Update request. Every field is optional; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// An empty description clears it
    #[serde(default)]
    pub description: Option<String>,
    /// `None` = unchanged, `Some(None)` = make root, `Some(Some(id))` = reparent
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub parent_id: Option<Option<CategoryId>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn parent(mut self, parent_id: Option<CategoryId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.parent_id.is_none()
            && self.is_active.is_none()
    }

    /// Trim and length-check the textual fields.
    pub fn normalized(self) -> Result<Self, DomainError> {
        let name = self.name.as_deref().map(validate_name).transpose()?;
        let description = match self.description.as_deref() {
            Some(raw) => Some(validate_description(Some(raw))?.unwrap_or_default()),
            None => None,
        };
        Ok(Self {
            name,
            description,
            ..self
        })
    }

    /// Apply the (normalized) patch onto a record.
    pub fn apply_to(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(description) = &self.description {
            category.description = if description.is_empty() {
                None
            } else {
                Some(description.clone())
            };
        }
        if let Some(parent_id) = self.parent_id {
            category.parent_id = parent_id;
        }
        if let Some(is_active) = self.is_active {
            category.is_active = is_active;
        }
    }
}

/// A present key, `null` included, becomes `Some`; an absent key stays `None` via `default`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Case-insensitive comparison key for names.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Returns the trimmed name or `InvalidName`.
pub fn validate_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName("name is required".to_string()));
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LEN {
        return Err(DomainError::InvalidName(format!(
            "name cannot exceed {MAX_NAME_LEN} characters (got {len})"
        )));
    }
    Ok(trimmed.to_string())
}

/// Returns the trimmed description (None when blank) or `InvalidDescription`.
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(trimmed) = description.map(str::trim) else {
        return Ok(None);
    };
    let len = trimmed.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(DomainError::InvalidDescription(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters (got {len})"
        )));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
