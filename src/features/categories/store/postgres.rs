use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{not_found, still_referenced, CategoryStore};
use crate::core::error::{AppError, Result};
use crate::features::categories::models::{
    Category, CategoryDomain, CategoryPatch, NewCategory, ParentRef,
};

/// Row shape shared by the three category tables
#[derive(Debug, Clone, FromRow)]
struct CategoryRow {
    id: Uuid,
    parent_id: Option<Uuid>,
    name: String,
    sort_order: Option<i32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id.map(ParentRef::Id),
            sort_order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, parent_id, name, sort_order, is_active, created_at, updated_at";

/// Map constraint violations to domain errors
fn handle_db_error(domain: CategoryDomain, id: Option<Uuid>, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // foreign_key_violation: a dependent record still points at the category
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23503")) {
            return match id {
                Some(id) => still_referenced(domain, id),
                None => AppError::BadRequest("Referenced record does not exist.".to_string()),
            };
        }
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23514")) {
            return AppError::Validation(format!("Category rejected by {}: {}", domain, db_err));
        }
    }

    tracing::error!("Category store error ({}): {:?}", domain, e);
    AppError::Database(e)
}

/// `CategoryStore` over Postgres, one table per domain
pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn has_dependents(&self, domain: CategoryDomain, id: Uuid) -> Result<bool> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE category_id = $1)",
            domain.dependents_table()
        );

        sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(domain, None, e))
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self, domain: CategoryDomain, include_inactive: bool) -> Result<Vec<Category>> {
        let filter = if include_inactive {
            ""
        } else {
            "WHERE is_active = TRUE"
        };
        let query = format!(
            "SELECT {} FROM {} {} ORDER BY COALESCE(sort_order, 0), name, id",
            COLUMNS,
            domain.table(),
            filter
        );

        let rows: Vec<CategoryRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| handle_db_error(domain, None, e))?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get(&self, domain: CategoryDomain, id: Uuid) -> Result<Category> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", COLUMNS, domain.table());

        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| handle_db_error(domain, None, e))?
            .map(Category::from)
            .ok_or_else(|| not_found(domain, id))
    }

    async fn create(&self, domain: CategoryDomain, new: NewCategory) -> Result<Category> {
        let query = format!(
            r#"
            INSERT INTO {} (id, parent_id, name, sort_order, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            domain.table(),
            COLUMNS
        );

        let row: CategoryRow = sqlx::query_as(&query)
            .bind(Uuid::now_v7())
            .bind(new.parent_id)
            .bind(&new.name)
            .bind(new.sort_order)
            .bind(new.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(domain, None, e))?;

        tracing::info!("Created {} category {} ({})", domain, row.id, row.name);
        Ok(row.into())
    }

    async fn update(&self, domain: CategoryDomain, id: Uuid, patch: CategoryPatch) -> Result<Category> {
        let query = format!(
            r#"
            UPDATE {}
            SET name = COALESCE($1, name),
                parent_id = CASE WHEN $2 THEN $3 ELSE parent_id END,
                sort_order = COALESCE($4, sort_order),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            domain.table(),
            COLUMNS
        );

        let row: CategoryRow = sqlx::query_as(&query)
            .bind(patch.name)
            .bind(patch.parent_id.is_some())
            .bind(patch.parent_id.flatten())
            .bind(patch.sort_order)
            .bind(patch.is_active)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| handle_db_error(domain, None, e))?
            .ok_or_else(|| not_found(domain, id))?;

        Ok(row.into())
    }

    async fn delete(&self, domain: CategoryDomain, id: Uuid) -> Result<()> {
        if self.has_dependents(domain, id).await? {
            return Err(still_referenced(domain, id));
        }

        let query = format!("DELETE FROM {} WHERE id = $1", domain.table());
        let result = sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| handle_db_error(domain, Some(id), e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(domain, id));
        }

        tracing::info!("Deleted {} category {}", domain, id);
        Ok(())
    }
}
