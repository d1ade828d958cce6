pub mod category;
pub mod domain;

pub use category::{Category, CategoryPatch, NewCategory, ParentRef};
pub use domain::CategoryDomain;
