use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Reference to a parent category.
///
/// Accepts either a bare id or an embedded `{id, name}` object. Callers go
/// through [`ParentRef::id`] and never look at the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ParentRef {
    Id(Uuid),
    Embedded {
        id: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ParentRef {
    pub fn id(&self) -> Uuid {
        match self {
            ParentRef::Id(id) => *id,
            ParentRef::Embedded { id, .. } => *id,
        }
    }
}

impl From<Uuid> for ParentRef {
    fn from(id: Uuid) -> Self {
        ParentRef::Id(id)
    }
}

fn default_true() -> bool {
    true
}

/// A category record of one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<ParentRef>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Normalized parent id
    pub fn parent(&self) -> Option<Uuid> {
        self.parent_id.as_ref().map(ParentRef::id)
    }

    /// Sibling ordering key; a missing sort order sorts as zero
    pub fn sort_key(&self) -> i32 {
        self.sort_order.unwrap_or(0)
    }
}

/// Fields of a category about to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Partial update; `None` leaves a field untouched.
///
/// `parent_id` is doubly optional so a parent can be cleared (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    pub fn sort_order_only(sort_order: i32) -> Self {
        Self {
            sort_order: Some(sort_order),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, category: &mut Category) {
        if let Some(ref name) = self.name {
            category.name = name.clone();
        }
        if let Some(parent) = self.parent_id {
            category.parent_id = parent.map(ParentRef::Id);
        }
        if let Some(sort_order) = self.sort_order {
            category.sort_order = Some(sort_order);
        }
        if let Some(is_active) = self.is_active {
            category.is_active = is_active;
        }
    }
}
