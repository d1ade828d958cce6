pub mod category_service;
pub mod editor;
pub mod tree_view;

pub use category_service::CategoryService;
pub use editor::{CategoryEditor, CategoryForm};
pub use tree_view::{ReorderOutcome, TreeViewService, TreeViewSnapshot};
