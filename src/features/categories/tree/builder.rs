use std::collections::HashMap;

use uuid::Uuid;

use crate::features::categories::models::Category;

/// A category together with its ordered children
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub category: Category,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn id(&self) -> Uuid {
        self.category.id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

// Parent chains can be thousands of levels deep; the derived drop would
// recurse once per level.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

struct Slot {
    category: Category,
    parent: Option<Uuid>,
    children: Vec<usize>,
    placed_under: Option<usize>,
}

/// Build a forest from a flat, parent-referencing list of one domain.
///
/// Every record is placed exactly once: under its parent when the parent id
/// resolves to another record, otherwise as a root. Records pointing at
/// themselves or at a missing id become roots. Records caught in a cycle are
/// unreachable after placement; they are detached and promoted to roots in
/// input order, which cuts each cycle at its first member. Malformed input
/// therefore yields extra roots and never an error.
///
/// Siblings and roots keep input order; use [`super::sorter::sort_forest`] afterwards.
pub fn build_forest(categories: Vec<Category>) -> Vec<TreeNode> {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(categories.len());
    let mut slots: Vec<Slot> = Vec::with_capacity(categories.len());

    for category in categories {
        if index.contains_key(&category.id) {
            tracing::warn!(
                "Duplicate category id {} ignored while building tree",
                category.id
            );
            continue;
        }
        let parent = category.parent();
        index.insert(category.id, slots.len());
        slots.push(Slot {
            category,
            parent,
            children: Vec::new(),
            placed_under: None,
        });
    }

    let mut roots = Vec::new();
    for i in 0..slots.len() {
        let own_id = slots[i].category.id;
        let parent_idx = slots[i]
            .parent
            .filter(|parent| *parent != own_id)
            .and_then(|parent| index.get(&parent).copied());

        match parent_idx {
            Some(p) => {
                slots[p].children.push(i);
                slots[i].placed_under = Some(p);
            }
            None => roots.push(i),
        }
    }

    let mut reachable = vec![false; slots.len()];
    mark_reachable(&slots, &roots, &mut reachable);

    for i in 0..slots.len() {
        if reachable[i] {
            continue;
        }
        if let Some(p) = slots[i].placed_under.take() {
            slots[p].children.retain(|&child| child != i);
        }
        tracing::warn!(
            "Category {} is part of a parent cycle, promoting it to root",
            slots[i].category.id
        );
        roots.push(i);
        mark_reachable(&slots, &[i], &mut reachable);
    }
    // Slot indices are input positions
    roots.sort_unstable();

    let mut taken: Vec<Option<(Category, Vec<usize>)>> = slots
        .into_iter()
        .map(|slot| Some((slot.category, slot.children)))
        .collect();

    roots
        .into_iter()
        .filter_map(|i| materialize(i, &mut taken))
        .collect()
}

fn mark_reachable(slots: &[Slot], from: &[usize], reachable: &mut [bool]) {
    let mut stack: Vec<usize> = from.to_vec();
    while let Some(i) = stack.pop() {
        if reachable[i] {
            continue;
        }
        reachable[i] = true;
        stack.extend(slots[i].children.iter().copied());
    }
}

struct Pending {
    category: Category,
    child_indices: std::vec::IntoIter<usize>,
    children: Vec<TreeNode>,
}

impl Pending {
    fn new((category, child_indices): (Category, Vec<usize>)) -> Self {
        Self {
            category,
            child_indices: child_indices.into_iter(),
            children: Vec::new(),
        }
    }
}

/// Assemble the subtree under slot `root` bottom-up with an explicit stack.
/// Each slot is taken once, so a malformed arena cannot loop here.
fn materialize(root: usize, taken: &mut [Option<(Category, Vec<usize>)>]) -> Option<TreeNode> {
    let mut stack = vec![Pending::new(taken[root].take()?)];

    loop {
        let top = stack.last_mut()?;
        if let Some(child) = top.child_indices.next() {
            if let Some(entry) = taken[child].take() {
                stack.push(Pending::new(entry));
            }
            continue;
        }

        let done = stack.pop()?;
        let node = TreeNode {
            category: done.category,
            children: done.children,
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => return Some(node),
        }
    }
}
