pub mod memory;
pub mod postgres;

pub use memory::InMemoryCategoryStore;
pub use postgres::PgCategoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryDomain, CategoryPatch, NewCategory};

/// Persistence for category records, parameterized by domain.
///
/// The store is authoritative; trees are rebuilt from `list` on every fetch.
/// `delete` fails with `AppError::Conflict` while records of the domain still
/// reference the category.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories of a domain, ordered by sort order then name
    async fn list(&self, domain: CategoryDomain, include_inactive: bool) -> Result<Vec<Category>>;

    async fn get(&self, domain: CategoryDomain, id: Uuid) -> Result<Category>;

    async fn create(&self, domain: CategoryDomain, new: NewCategory) -> Result<Category>;

    async fn update(&self, domain: CategoryDomain, id: Uuid, patch: CategoryPatch) -> Result<Category>;

    async fn delete(&self, domain: CategoryDomain, id: Uuid) -> Result<()>;
}

pub(crate) fn not_found(domain: CategoryDomain, id: Uuid) -> AppError {
    AppError::NotFound(format!(
        "Category {} not found in {} categories",
        id, domain
    ))
}

pub(crate) fn still_referenced(domain: CategoryDomain, id: Uuid) -> AppError {
    AppError::Conflict(format!(
        "Category {} is still used by {} and cannot be deleted",
        id,
        domain.dependent_label()
    ))
}
