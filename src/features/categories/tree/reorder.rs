use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FlatRow;

/// A finished drag: the dragged row and the row it was dropped on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEnd {
    pub source_id: Uuid,
    #[serde(default)]
    pub target_id: Option<Uuid>,
}

/// The single write a drop translates into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortOrderUpdate {
    pub id: Uuid,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderPlan {
    /// Dropped nowhere, or onto itself
    Unchanged,
    /// One of the ids is not among the rendered rows anymore
    Stale { missing: Uuid },
    Move(SortOrderUpdate),
}

/// Translate a drop into at most one sort order update.
///
/// The dragged category takes over the target's sort order, or the target's
/// row index when the target has none. Siblings are not renumbered and the
/// parent never changes; after the next fetch the stable sort puts the moved
/// row next to the target.
pub fn plan_reorder(rows: &[FlatRow], event: &DragEnd) -> ReorderPlan {
    let target_id = match event.target_id {
        Some(target_id) if target_id != event.source_id => target_id,
        _ => return ReorderPlan::Unchanged,
    };

    if !rows.iter().any(|row| row.id == event.source_id) {
        return ReorderPlan::Stale {
            missing: event.source_id,
        };
    }

    let Some((target_index, target)) = rows.iter().enumerate().find(|(_, row)| row.id == target_id)
    else {
        return ReorderPlan::Stale { missing: target_id };
    };

    let sort_order = target
        .sort_order
        .unwrap_or_else(|| i32::try_from(target_index).unwrap_or(i32::MAX));

    ReorderPlan::Move(SortOrderUpdate {
        id: event.source_id,
        sort_order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::tree::{build_forest, flatten, sorted_forest, ExpansionState};
    use crate::shared::test_helpers::{category, node_id};

    fn rows() -> Vec<FlatRow> {
        let forest = sorted_forest(build_forest(vec![
            category(1, "A", None, Some(0)),
            category(2, "B", Some(1), Some(0)),
            category(3, "C", None, Some(1)),
            category(4, "D", None, None),
        ]));
        flatten(&forest, &ExpansionState::new())
    }

    fn drag(source: u128, target: Option<u128>) -> DragEnd {
        DragEnd {
            source_id: node_id(source),
            target_id: target.map(node_id),
        }
    }

    #[test]
    fn test_drop_copies_target_sort_order() {
        let plan = plan_reorder(&rows(), &drag(3, Some(1)));

        assert_eq!(
            plan,
            ReorderPlan::Move(SortOrderUpdate {
                id: node_id(3),
                sort_order: 0
            })
        );
    }

    #[test]
    fn test_target_without_sort_order_uses_row_index() {
        // D has no sort order, sorts as 0, lands at index 1 between A and C
        let rows = rows();
        let d_index = rows.iter().position(|r| r.id == node_id(4)).unwrap();

        let plan = plan_reorder(&rows, &drag(3, Some(4)));

        assert_eq!(
            plan,
            ReorderPlan::Move(SortOrderUpdate {
                id: node_id(3),
                sort_order: d_index as i32
            })
        );
    }

    #[test]
    fn test_no_target_or_same_target_is_a_noop() {
        assert_eq!(plan_reorder(&rows(), &drag(3, None)), ReorderPlan::Unchanged);
        assert_eq!(
            plan_reorder(&rows(), &drag(3, Some(3))),
            ReorderPlan::Unchanged
        );
    }

    #[test]
    fn test_hidden_or_vanished_rows_are_stale() {
        // B sits under collapsed A, so it is not a rendered row
        assert_eq!(
            plan_reorder(&rows(), &drag(2, Some(1))),
            ReorderPlan::Stale {
                missing: node_id(2)
            }
        );
        assert_eq!(
            plan_reorder(&rows(), &drag(1, Some(99))),
            ReorderPlan::Stale {
                missing: node_id(99)
            }
        );
    }

    #[test]
    fn test_drag_end_deserializes_without_target() {
        let event: DragEnd =
            serde_json::from_value(serde_json::json!({ "source_id": node_id(1) })).unwrap();
        assert_eq!(event.target_id, None);
    }
}
