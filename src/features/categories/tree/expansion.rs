use std::collections::HashSet;

use uuid::Uuid;

/// Ids of the nodes a tree view currently shows expanded.
///
/// Starts empty, so only roots are visible. Belongs to one view and is never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<Uuid>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the node's state; returns whether it is expanded afterwards
    pub fn toggle(&mut self, id: Uuid) -> bool {
        if self.is_expanded(&id) {
            self.collapse(id);
            false
        } else {
            self.expand(id);
            true
        }
    }

    pub fn expand(&mut self, id: Uuid) {
        self.expanded.insert(id);
    }

    pub fn collapse(&mut self, id: Uuid) {
        self.expanded.remove(&id);
    }

    pub fn is_expanded(&self, id: &Uuid) -> bool {
        self.expanded.contains(id)
    }

    /// Forget ids for which `present` is false, e.g. deleted categories
    pub fn retain_present<F>(&mut self, mut present: F)
    where
        F: FnMut(&Uuid) -> bool,
    {
        self.expanded.retain(|id| present(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uuid> {
        self.expanded.iter()
    }
}
