use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{not_found, still_referenced, CategoryStore};
use crate::core::error::{AppError, Result};
use crate::features::categories::models::{
    Category, CategoryDomain, CategoryPatch, NewCategory, ParentRef,
};

#[derive(Default)]
struct MemoryState {
    categories: HashMap<CategoryDomain, Vec<Category>>,
    referenced: HashSet<(CategoryDomain, Uuid)>,
    fail_next_write: Option<String>,
}

impl MemoryState {
    fn take_failure(&mut self) -> Result<()> {
        match self.fail_next_write.take() {
            Some(message) => Err(AppError::Internal(message)),
            None => Ok(()),
        }
    }
}

/// Process-local `CategoryStore`.
///
/// Serves the `memory` backend and the tests. Dependent references are
/// simulated with [`mark_referenced`](Self::mark_referenced) and a single write
/// failure can be queued with [`fail_next_write`](Self::fail_next_write).
#[derive(Default)]
pub struct InMemoryCategoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert records as-is, keeping their ids and parents
    pub async fn seed(&self, domain: CategoryDomain, categories: Vec<Category>) {
        let mut state = self.state.write().await;
        state
            .categories
            .entry(domain)
            .or_default()
            .extend(categories);
    }

    /// Build a store from a JSON object keyed by domain, e.g.
    /// `{"question": [{"id": "...", "name": "Safety"}]}`
    pub async fn from_seed_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let seed: HashMap<CategoryDomain, Vec<Category>> = serde_json::from_str(json)?;
        let store = Self::new();
        for (domain, categories) in seed {
            tracing::info!("Seeding {} {} categories", categories.len(), domain);
            store.seed(domain, categories).await;
        }
        Ok(store)
    }

    /// Pretend some record of the domain references this category
    #[cfg(test)]
    pub async fn mark_referenced(&self, domain: CategoryDomain, id: Uuid) {
        self.state.write().await.referenced.insert((domain, id));
    }

    /// The next create/update/delete fails with `message`
    #[cfg(test)]
    pub async fn fail_next_write(&self, message: impl Into<String>) {
        self.state.write().await.fail_next_write = Some(message.into());
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn list(&self, domain: CategoryDomain, include_inactive: bool) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state
            .categories
            .get(&domain)
            .map(|all| {
                all.iter()
                    .filter(|c| include_inactive || c.is_active)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        categories.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(categories)
    }

    async fn get(&self, domain: CategoryDomain, id: Uuid) -> Result<Category> {
        let state = self.state.read().await;
        state
            .categories
            .get(&domain)
            .and_then(|all| all.iter().find(|c| c.id == id))
            .cloned()
            .ok_or_else(|| not_found(domain, id))
    }

    async fn create(&self, domain: CategoryDomain, new: NewCategory) -> Result<Category> {
        let mut state = self.state.write().await;
        state.take_failure()?;

        let now = Utc::now();
        let category = Category {
            id: Uuid::now_v7(),
            name: new.name,
            parent_id: new.parent_id.map(ParentRef::Id),
            sort_order: Some(new.sort_order),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        state
            .categories
            .entry(domain)
            .or_default()
            .push(category.clone());

        Ok(category)
    }

    async fn update(&self, domain: CategoryDomain, id: Uuid, patch: CategoryPatch) -> Result<Category> {
        let mut state = self.state.write().await;
        state.take_failure()?;

        let category = state
            .categories
            .get_mut(&domain)
            .and_then(|all| all.iter_mut().find(|c| c.id == id))
            .ok_or_else(|| not_found(domain, id))?;

        patch.apply_to(category);
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn delete(&self, domain: CategoryDomain, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        state.take_failure()?;

        if state.referenced.contains(&(domain, id)) {
            return Err(still_referenced(domain, id));
        }

        let all = state
            .categories
            .get_mut(&domain)
            .ok_or_else(|| not_found(domain, id))?;
        let before = all.len();
        all.retain(|c| c.id != id);
        if all.len() == before {
            return Err(not_found(domain, id));
        }
        Ok(())
    }
}
