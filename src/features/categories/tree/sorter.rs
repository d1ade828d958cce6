use super::TreeNode;

/// Sort every level of the forest by ascending sort order.
///
/// `sort_by_key` is stable, so ties keep the order the records arrived in.
/// Levels are visited from a worklist, so depth does not grow the call stack.
pub fn sort_forest(nodes: &mut [TreeNode]) {
    let mut levels: Vec<&mut [TreeNode]> = vec![nodes];
    while let Some(level) = levels.pop() {
        level.sort_by_key(|node| node.category.sort_key());
        for node in level {
            levels.push(node.children.as_mut_slice());
        }
    }
}

pub fn sorted_forest(mut nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    sort_forest(&mut nodes);
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::tree::build_forest;
    use crate::shared::test_helpers::{category, node_id};
    use uuid::Uuid;

    fn names(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.category.name.as_str()).collect()
    }

    #[test]
    fn test_sorts_each_level() {
        let forest = sorted_forest(build_forest(vec![
            category(1, "Root-late", None, Some(5)),
            category(2, "Root-early", None, Some(1)),
            category(3, "c3", Some(2), Some(30)),
            category(4, "c1", Some(2), Some(10)),
            category(5, "c2", Some(2), Some(20)),
            category(6, "g2", Some(4), Some(2)),
            category(7, "g1", Some(4), Some(1)),
        ]));

        assert_eq!(names(&forest), vec!["Root-early", "Root-late"]);
        assert_eq!(names(&forest[0].children), vec!["c1", "c2", "c3"]);
        assert_eq!(names(&forest[0].children[0].children), vec!["g1", "g2"]);
    }

    #[test]
    fn test_missing_sort_order_sorts_as_zero() {
        let forest = sorted_forest(build_forest(vec![
            category(1, "one", None, Some(1)),
            category(2, "none", None, None),
            category(3, "negative", None, Some(-1)),
        ]));

        assert_eq!(names(&forest), vec!["negative", "none", "one"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let forest = sorted_forest(build_forest(vec![
            category(1, "A", None, Some(0)),
            category(3, "C", None, Some(0)),
            category(2, "B", None, Some(0)),
        ]));

        let order: Vec<Uuid> = forest.iter().map(TreeNode::id).collect();
        assert_eq!(order, vec![node_id(1), node_id(3), node_id(2)]);
    }

    #[test]
    fn test_sorts_deep_chain_level_by_level() {
        // 1 <- 2 <- ... <- 15000, and every link also has a leaf sibling
        // that should sort before it
        let depth: u128 = 15_000;
        let mut input = Vec::new();
        for i in 1..=depth {
            input.push(category(i, "link", (i > 1).then(|| i - 1), Some(1)));
            input.push(category(depth + i, "leaf", Some(i), Some(0)));
        }

        let forest = sorted_forest(build_forest(input));

        let mut node = &forest[0];
        let mut visited = 1;
        while node.has_children() {
            assert_eq!(names(&node.children)[0], "leaf");
            match node.children.get(1) {
                Some(next) => node = next,
                None => break,
            }
            visited += 1;
        }
        assert_eq!(visited, depth);
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let once = sorted_forest(build_forest(vec![
            category(1, "x", None, Some(2)),
            category(2, "y", None, Some(1)),
            category(3, "z", Some(1), Some(0)),
        ]));
        let twice = sorted_forest(once.clone());

        assert_eq!(once, twice);
    }
}
