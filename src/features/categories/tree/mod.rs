//! Category tree pipeline.
//!
//! Flat records go through [`build_forest`], [`sorter::sort_forest`] and, together with
//! an [`ExpansionState`], [`flatten`] into the rows a view renders. A drop on
//! those rows becomes a [`ReorderPlan`] via [`plan_reorder`]. Everything here is
//! synchronous and side-effect free; persisting a plan is the view's job.

pub mod builder;
pub mod expansion;
pub mod flattener;
pub mod reorder;
pub mod sorter;

pub use builder::{build_forest, TreeNode};
pub use expansion::ExpansionState;
pub use flattener::{flatten, FlatRow};
pub use reorder::{plan_reorder, DragEnd, ReorderPlan};
pub use sorter::sorted_forest;

use crate::features::categories::models::Category;

/// Build, sort and flatten in one go
pub fn project(categories: Vec<Category>, expansion: &ExpansionState) -> (Vec<TreeNode>, Vec<FlatRow>) {
    let forest = sorted_forest(build_forest(categories));
    let rows = flatten(&forest, expansion);
    (forest, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{category, node_id};

    fn names(rows: &[FlatRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_projection_is_idempotent() {
        let input = vec![
            category(1, "A", None, Some(2)),
            category(2, "B", Some(1), Some(0)),
            category(3, "C", None, Some(1)),
            category(4, "D", Some(1), Some(0)),
        ];
        let mut expansion = ExpansionState::new();
        expansion.expand(node_id(1));

        let first = project(input.clone(), &expansion);
        let second = project(input, &expansion);

        assert_eq!(first, second);
    }

    #[test]
    fn test_drop_then_refetch_keeps_tie_in_input_order() {
        let before = vec![
            category(1, "A", None, Some(0)),
            category(2, "B", Some(1), Some(0)),
            category(3, "C", None, Some(1)),
        ];
        let (_, rows) = project(before, &ExpansionState::new());
        assert_eq!(names(&rows), vec!["A", "C"]);

        let plan = plan_reorder(
            &rows,
            &DragEnd {
                source_id: node_id(3),
                target_id: Some(node_id(1)),
            },
        );
        let ReorderPlan::Move(update) = plan else {
            panic!("expected a move, got {:?}", plan);
        };
        assert_eq!(update.sort_order, 0);

        // The store hands back A:0, B:0, C:0 in its own order
        let after = vec![
            category(1, "A", None, Some(0)),
            category(2, "B", Some(1), Some(0)),
            category(3, "C", None, Some(update.sort_order)),
        ];
        let (_, rows) = project(after, &ExpansionState::new());
        assert_eq!(names(&rows), vec!["A", "C"]);
    }

    #[test]
    fn test_deep_chain_projects_every_expanded_level() {
        let depth: u128 = 12_000;
        let chain: Vec<Category> = (1..=depth)
            .map(|i| category(i, "link", (i > 1).then(|| i - 1), Some(0)))
            .collect();
        let mut expansion = ExpansionState::new();
        for i in 1..depth {
            expansion.expand(node_id(i));
        }

        let (forest, rows) = project(chain, &expansion);

        assert_eq!(forest.len(), 1);
        assert_eq!(rows.len(), depth as usize);
        assert_eq!(rows.last().map(|r| r.depth), Some(depth as usize - 1));
    }

    #[test]
    fn test_deleted_parent_promotes_children() {
        // Parent 1 is gone from the store; its children still reference it
        let (forest, rows) = project(
            vec![
                category(2, "B", Some(1), Some(1)),
                category(3, "C", Some(1), Some(0)),
                category(4, "D", None, Some(2)),
            ],
            &ExpansionState::new(),
        );

        assert_eq!(forest.len(), 3);
        assert_eq!(names(&rows), vec!["C", "B", "D"]);
        assert!(rows.iter().all(|r| r.depth == 0));
    }
}
