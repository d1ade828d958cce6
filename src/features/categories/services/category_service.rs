use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::categories::models::{Category, CategoryDomain, CategoryPatch, NewCategory};
use crate::features::categories::services::editor::selectable_parents;
use crate::features::categories::store::CategoryStore;
use crate::features::categories::tree::{build_forest, sorted_forest, TreeNode};

// Full list of one domain, inactive records included
struct CachedCategories {
    categories: Vec<Category>,
    fetched_at: Instant,
}

#[derive(Default)]
struct ListCache {
    entries: HashMap<CategoryDomain, CachedCategories>,
    // Bumped on every invalidation; a fetch that straddles one is not stored
    generations: HashMap<CategoryDomain, u64>,
}

impl ListCache {
    fn generation(&self, domain: CategoryDomain) -> u64 {
        self.generations.get(&domain).copied().unwrap_or(0)
    }
}

/// Category reads and writes for all domains.
///
/// Lists are cached per domain; every successful write drops the cache entry
/// of its own domain and leaves the others alone.
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    cache: RwLock<ListCache>,
    cache_ttl: Duration,
}

impl std::fmt::Debug for CategoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryService")
            .field("store", &"<dyn CategoryStore>")
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache: RwLock::new(ListCache::default()),
            cache_ttl,
        }
    }

    /// Categories of a domain in store order
    pub async fn list(&self, domain: CategoryDomain, include_inactive: bool) -> Result<Vec<Category>> {
        let generation = {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.entries.get(&domain) {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(filter_active(&cached.categories, include_inactive));
                }
            }
            cache.generation(domain)
        };

        let categories = self.store.list(domain, true).await.map_err(|e| {
            tracing::error!("Failed to list {} categories: {}", domain, e);
            e
        })?;
        tracing::debug!("Fetched {} {} categories", categories.len(), domain);

        let visible = filter_active(&categories, include_inactive);
        let mut cache = self.cache.write().await;
        if cache.generation(domain) == generation {
            cache.entries.insert(
                domain,
                CachedCategories {
                    categories,
                    fetched_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!(
                "{} categories changed while fetching, not caching the result",
                domain
            );
        }

        Ok(visible)
    }

    /// Sorted forest of a domain
    pub async fn tree(&self, domain: CategoryDomain, include_inactive: bool) -> Result<Vec<TreeNode>> {
        let categories = self.list(domain, include_inactive).await?;
        Ok(sorted_forest(build_forest(categories)))
    }

    pub async fn get(&self, domain: CategoryDomain, id: Uuid) -> Result<Category> {
        self.store.get(domain, id).await
    }

    /// Categories that may be chosen as parent of `id`
    pub async fn parent_options(&self, domain: CategoryDomain, id: Uuid) -> Result<Vec<Category>> {
        // 404 for unknown ids instead of an unfiltered list
        self.get(domain, id).await?;
        let categories = self.list(domain, true).await?;
        Ok(selectable_parents(&categories, Some(id)))
    }

    pub async fn create(&self, domain: CategoryDomain, new: NewCategory) -> Result<Category> {
        let category = self.store.create(domain, new).await?;
        self.invalidate(domain).await;
        Ok(category)
    }

    pub async fn update(&self, domain: CategoryDomain, id: Uuid, patch: CategoryPatch) -> Result<Category> {
        let category = self.store.update(domain, id, patch).await?;
        self.invalidate(domain).await;
        Ok(category)
    }

    pub async fn delete(&self, domain: CategoryDomain, id: Uuid) -> Result<()> {
        self.store.delete(domain, id).await.map_err(|e| {
            tracing::warn!("Delete of {} category {} rejected: {}", domain, id, e);
            e
        })?;
        self.invalidate(domain).await;
        Ok(())
    }

    /// Drop the cached list of one domain, including any fetch still in flight
    pub async fn invalidate(&self, domain: CategoryDomain) {
        let mut cache = self.cache.write().await;
        cache.entries.remove(&domain);
        *cache.generations.entry(domain).or_default() += 1;
    }

    #[cfg(test)]
    async fn is_cached(&self, domain: CategoryDomain) -> bool {
        self.cache.read().await.entries.contains_key(&domain)
    }
}

fn filter_active(categories: &[Category], include_inactive: bool) -> Vec<Category> {
    categories
        .iter()
        .filter(|c| include_inactive || c.is_active)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::features::categories::store::InMemoryCategoryStore;
    use crate::shared::test_helpers::{category, category_service, node_id};

    /// Holds the first `list` after it has read the store until released
    struct HeldListStore {
        inner: Arc<InMemoryCategoryStore>,
        hold_next: AtomicBool,
        listed: Notify,
        release: Notify,
    }

    impl HeldListStore {
        fn new(inner: Arc<InMemoryCategoryStore>) -> Self {
            Self {
                inner,
                hold_next: AtomicBool::new(true),
                listed: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl CategoryStore for HeldListStore {
        async fn list(&self, domain: CategoryDomain, include_inactive: bool) -> Result<Vec<Category>> {
            let categories = self.inner.list(domain, include_inactive).await?;
            if self.hold_next.swap(false, Ordering::SeqCst) {
                self.listed.notify_one();
                self.release.notified().await;
            }
            Ok(categories)
        }

        async fn get(&self, domain: CategoryDomain, id: Uuid) -> Result<Category> {
            self.inner.get(domain, id).await
        }

        async fn create(&self, domain: CategoryDomain, new: NewCategory) -> Result<Category> {
            self.inner.create(domain, new).await
        }

        async fn update(&self, domain: CategoryDomain, id: Uuid, patch: CategoryPatch) -> Result<Category> {
            self.inner.update(domain, id, patch).await
        }

        async fn delete(&self, domain: CategoryDomain, id: Uuid) -> Result<()> {
            self.inner.delete(domain, id).await
        }
    }

    async fn seeded() -> (Arc<InMemoryCategoryStore>, Arc<CategoryService>) {
        let store = Arc::new(InMemoryCategoryStore::new());
        for domain in CategoryDomain::ALL {
            store
                .seed(domain, vec![category(1, "Root", None, Some(0))])
                .await;
        }
        let service = category_service(Arc::clone(&store));
        (store, service)
    }

    #[tokio::test]
    async fn test_list_is_served_from_cache() {
        let (store, service) = seeded().await;
        service.list(CategoryDomain::Question, false).await.unwrap();

        // Written behind the service's back, so the cache still wins
        store
            .seed(
                CategoryDomain::Question,
                vec![category(2, "Sneaky", None, None)],
            )
            .await;

        let cached = service.list(CategoryDomain::Question, false).await.unwrap();
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn test_write_invalidates_only_its_domain() {
        let (_store, service) = seeded().await;
        for domain in CategoryDomain::ALL {
            service.list(domain, false).await.unwrap();
        }

        service
            .update(
                CategoryDomain::Shop,
                node_id(1),
                CategoryPatch::sort_order_only(3),
            )
            .await
            .unwrap();

        assert!(!service.is_cached(CategoryDomain::Shop).await);
        assert!(service.is_cached(CategoryDomain::Question).await);
        assert!(service.is_cached(CategoryDomain::KnowledgeBase).await);
    }

    #[tokio::test]
    async fn test_list_racing_a_write_is_not_cached() {
        let inner = Arc::new(InMemoryCategoryStore::new());
        inner
            .seed(CategoryDomain::Shop, vec![category(1, "Root", None, Some(5))])
            .await;
        let store = Arc::new(HeldListStore::new(inner));
        let service = Arc::new(CategoryService::new(
            store.clone(),
            Duration::from_secs(300),
        ));

        let in_flight = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.list(CategoryDomain::Shop, true).await })
        };
        store.listed.notified().await;

        service
            .update(
                CategoryDomain::Shop,
                node_id(1),
                CategoryPatch::sort_order_only(0),
            )
            .await
            .unwrap();
        store.release.notify_one();

        // The in-flight call still answers with what it read
        let stale = in_flight.await.unwrap().unwrap();
        assert_eq!(stale[0].sort_order, Some(5));
        assert!(!service.is_cached(CategoryDomain::Shop).await);

        let fresh = service.list(CategoryDomain::Shop, true).await.unwrap();
        assert_eq!(fresh[0].sort_order, Some(0));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() {
        let (store, service) = seeded().await;
        service.list(CategoryDomain::Shop, false).await.unwrap();
        store.fail_next_write("backend down").await;

        let result = service
            .update(
                CategoryDomain::Shop,
                node_id(1),
                CategoryPatch::sort_order_only(3),
            )
            .await;

        assert!(result.is_err());
        assert!(service.is_cached(CategoryDomain::Shop).await);
    }

    #[tokio::test]
    async fn test_inactive_filtered_from_cached_list() {
        let store = Arc::new(InMemoryCategoryStore::new());
        let mut retired = category(2, "Retired", None, Some(1));
        retired.is_active = false;
        store
            .seed(
                CategoryDomain::Question,
                vec![category(1, "Live", None, Some(0)), retired],
            )
            .await;
        let service = category_service(store);

        assert_eq!(
            service.list(CategoryDomain::Question, false).await.unwrap().len(),
            1
        );
        assert_eq!(
            service.list(CategoryDomain::Question, true).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_parent_options_exclude_self() {
        let store = Arc::new(InMemoryCategoryStore::new());
        store
            .seed(
                CategoryDomain::KnowledgeBase,
                vec![
                    category(1, "A", None, None),
                    category(2, "B", Some(1), None),
                    category(3, "Self", Some(3), None),
                ],
            )
            .await;
        let service = category_service(store);

        let options = service
            .parent_options(CategoryDomain::KnowledgeBase, node_id(3))
            .await
            .unwrap();
        let ids: Vec<_> = options.iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![node_id(1), node_id(2)]);
    }
}
