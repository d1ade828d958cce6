use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryDomain, ParentRef};
use crate::features::categories::services::{CategoryForm, ReorderOutcome, TreeViewSnapshot};
use crate::features::categories::tree::{DragEnd, FlatRow, TreeNode};
use crate::shared::constants::MAX_NESTED_TREE_DEPTH;

// Distinguishes an absent field (None) from an explicit null (Some(None))
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query params for listing categories
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListCategoriesQuery {
    /// If true, return the sorted tree. Default: false (flat list)
    #[serde(default)]
    pub tree: bool,
    /// If true, inactive categories are included. Default: false
    #[serde(default)]
    pub include_inactive: bool,
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub sort_order: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent(),
            name: c.name,
            sort_order: c.sort_order,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Response DTO for category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: Uuid,
    pub name: String,
    pub sort_order: Option<i32>,
    pub is_active: bool,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    fn leaf(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            sort_order: category.sort_order,
            is_active: category.is_active,
            children: Vec::new(),
        }
    }

    /// Convert a sorted forest into nested DTOs.
    ///
    /// Serializing nested JSON recurses per level, so forests deeper than
    /// [`MAX_NESTED_TREE_DEPTH`] are refused; the flat list has no such limit.
    pub fn from_forest(forest: &[TreeNode]) -> Result<Vec<Self>> {
        let mut roots = Vec::with_capacity(forest.len());

        for root in forest {
            // (node, next child index, finished children)
            let mut stack: Vec<(&TreeNode, usize, Vec<Self>)> = vec![(root, 0, Vec::new())];

            while let Some((node, next, _)) = stack.last_mut() {
                let node: &TreeNode = *node;
                if let Some(child) = node.children.get(*next) {
                    *next += 1;
                    if stack.len() >= MAX_NESTED_TREE_DEPTH {
                        return Err(AppError::BadRequest(format!(
                            "Category tree is deeper than {} levels; request the flat list instead",
                            MAX_NESTED_TREE_DEPTH
                        )));
                    }
                    stack.push((child, 0, Vec::new()));
                    continue;
                }

                let Some((node, _, children)) = stack.pop() else {
                    break;
                };
                let mut dto = Self::leaf(&node.category);
                dto.children = children;
                match stack.last_mut() {
                    Some((_, _, siblings)) => siblings.push(dto),
                    None => roots.push(dto),
                }
            }
        }

        Ok(roots)
    }
}

/// Create request, filled into a fresh editor form
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryDto {
    pub name: String,
    /// Bare id or `{id, name}` object
    pub parent_id: Option<ParentRef>,
    /// Defaults to 0
    pub sort_order: Option<i32>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

impl CreateCategoryDto {
    pub fn apply_to(self, form: &mut CategoryForm) {
        form.name = self.name;
        form.parent_id = self.parent_id;
        if let Some(sort_order) = self.sort_order {
            form.sort_order = Some(sort_order);
        }
        if let Some(is_active) = self.is_active {
            form.is_active = is_active;
        }
    }
}

/// Update request; omitted fields keep their value, `parent_id: null` makes a root
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCategoryDto {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<ParentRef>)]
    pub parent_id: Option<Option<ParentRef>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateCategoryDto {
    pub fn apply_to(self, form: &mut CategoryForm) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(parent_id) = self.parent_id {
            form.parent_id = parent_id;
        }
        if let Some(sort_order) = self.sort_order {
            form.sort_order = Some(sort_order);
        }
        if let Some(is_active) = self.is_active {
            form.is_active = is_active;
        }
    }
}

/// Mount request for a tree view
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OpenTreeViewDto {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleNodeDto {
    pub id: Uuid,
}

/// Drag-end event
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderCategoryDto {
    pub source_id: Uuid,
    /// Absent when the row was dropped outside the tree
    pub target_id: Option<Uuid>,
}

impl From<ReorderCategoryDto> for DragEnd {
    fn from(dto: ReorderCategoryDto) -> Self {
        DragEnd {
            source_id: dto.source_id,
            target_id: dto.target_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FlatRowDto {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub is_active: bool,
    pub depth: usize,
    pub index: usize,
    pub has_children: bool,
    pub is_expanded: bool,
}

impl From<FlatRow> for FlatRowDto {
    fn from(row: FlatRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
            sort_order: row.sort_order,
            is_active: row.is_active,
            depth: row.depth,
            index: row.index,
            has_children: row.has_children,
            is_expanded: row.is_expanded,
        }
    }
}

/// Rendered rows of a mounted tree view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TreeViewResponseDto {
    pub view_id: Uuid,
    pub domain: CategoryDomain,
    pub expanded: Vec<Uuid>,
    pub rows: Vec<FlatRowDto>,
}

impl From<TreeViewSnapshot> for TreeViewResponseDto {
    fn from(snapshot: TreeViewSnapshot) -> Self {
        Self {
            view_id: snapshot.view_id,
            domain: snapshot.domain,
            expanded: snapshot.expanded,
            rows: snapshot.rows.into_iter().map(FlatRowDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReorderResponseDto {
    pub outcome: ReorderOutcome,
    pub view: TreeViewResponseDto,
}
