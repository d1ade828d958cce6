use serde::Serialize;
use uuid::Uuid;

use super::{ExpansionState, TreeNode};

/// One rendered row of a tree view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub is_active: bool,
    /// 0 for roots
    pub depth: usize,
    /// Position in the flattened sequence
    pub index: usize,
    pub has_children: bool,
    pub is_expanded: bool,
}

/// Depth-first pre-order projection of the visible part of the forest.
///
/// Children of a node are emitted right after it only when the node is
/// expanded; a collapsed subtree contributes no rows at all.
pub fn flatten(forest: &[TreeNode], expansion: &ExpansionState) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&TreeNode, usize)> = forest.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        let category = &node.category;
        let is_expanded = expansion.is_expanded(&node.id());

        rows.push(FlatRow {
            id: node.id(),
            name: category.name.clone(),
            parent_id: category.parent(),
            sort_order: category.sort_order,
            is_active: category.is_active,
            depth,
            index: rows.len(),
            has_children: node.has_children(),
            is_expanded,
        });

        if is_expanded {
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }

    rows
}
