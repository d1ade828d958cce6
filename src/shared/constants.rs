/// Sort order given to new categories when the form leaves it empty
pub const DEFAULT_SORT_ORDER: i32 = 0;

/// Deepest category tree returned as nested JSON; deeper trees use the flat list
pub const MAX_NESTED_TREE_DEPTH: usize = 128;
