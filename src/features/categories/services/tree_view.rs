use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryDomain, CategoryPatch};
use crate::features::categories::services::CategoryService;
use crate::features::categories::tree::{
    flatten, plan_reorder, project, DragEnd, ExpansionState, FlatRow, ReorderPlan, TreeNode,
};

/// What happened to a drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReorderOutcome {
    Applied { id: Uuid, sort_order: i32 },
    Unchanged,
    Stale { missing: Uuid },
    Failed { message: String },
}

/// A mounted tree of one domain.
///
/// Owns its expansion state and the last projection of the store data. The
/// state lives exactly as long as the view.
#[derive(Debug)]
pub struct CategoryTreeView {
    id: Uuid,
    domain: CategoryDomain,
    include_inactive: bool,
    expansion: ExpansionState,
    forest: Vec<TreeNode>,
    rows: Vec<FlatRow>,
    last_used: Instant,
}

impl CategoryTreeView {
    pub fn new(domain: CategoryDomain, include_inactive: bool) -> Self {
        Self {
            id: Uuid::now_v7(),
            domain,
            include_inactive,
            expansion: ExpansionState::new(),
            forest: Vec::new(),
            rows: Vec::new(),
            last_used: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn domain(&self) -> CategoryDomain {
        self.domain
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Rebuild forest and rows from freshly fetched records
    pub fn load(&mut self, categories: Vec<Category>) {
        let present: HashSet<Uuid> = categories.iter().map(|c| c.id).collect();
        self.expansion.retain_present(|id| present.contains(id));
        let (forest, rows) = project(categories, &self.expansion);
        tracing::debug!(
            "{} tree view {} shows {} of {} categories",
            self.domain,
            self.id,
            rows.len(),
            forest.iter().map(TreeNode::subtree_len).sum::<usize>()
        );
        self.forest = forest;
        self.rows = rows;
    }

    /// Expand or collapse a node; rows are re-flattened from the current forest
    pub fn toggle(&mut self, id: Uuid) -> bool {
        let expanded = self.expansion.toggle(id);
        self.rows = flatten(&self.forest, &self.expansion);
        expanded
    }

    pub async fn refresh(&mut self, service: &CategoryService) -> Result<()> {
        let categories = service.list(self.domain, self.include_inactive).await?;
        self.load(categories);
        Ok(())
    }

    /// Apply a drop against the rows currently rendered.
    ///
    /// At most one sort order update is written. Nothing here fails the
    /// caller: stale ids and store errors are logged and reported in the
    /// outcome, and the rows keep their pre-drop state until the next refresh.
    pub async fn reorder(&mut self, service: &CategoryService, event: DragEnd) -> ReorderOutcome {
        let update = match plan_reorder(&self.rows, &event) {
            ReorderPlan::Unchanged => return ReorderOutcome::Unchanged,
            ReorderPlan::Stale { missing } => {
                tracing::warn!(
                    "Ignoring drop in {} tree view {}: category {} is not rendered",
                    self.domain,
                    self.id,
                    missing
                );
                return ReorderOutcome::Stale { missing };
            }
            ReorderPlan::Move(update) => update,
        };

        if let Err(e) = service
            .update(
                self.domain,
                update.id,
                CategoryPatch::sort_order_only(update.sort_order),
            )
            .await
        {
            tracing::error!(
                "Failed to persist new sort order {} for {} category {}: {}",
                update.sort_order,
                self.domain,
                update.id,
                e
            );
            return ReorderOutcome::Failed {
                message: e.to_string(),
            };
        }

        if let Err(e) = self.refresh(service).await {
            tracing::warn!(
                "Sort order saved but {} tree view {} could not refresh: {}",
                self.domain,
                self.id,
                e
            );
        }

        ReorderOutcome::Applied {
            id: update.id,
            sort_order: update.sort_order,
        }
    }

    fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_used.elapsed()
    }
}

struct ViewEntry {
    domain: CategoryDomain,
    view: Arc<Mutex<CategoryTreeView>>,
}

/// Registry of mounted tree views.
///
/// Each view sits behind its own mutex so operations on one view run one at a
/// time while other views proceed.
pub struct TreeViewService {
    categories: Arc<CategoryService>,
    views: RwLock<HashMap<Uuid, ViewEntry>>,
    idle_ttl: Duration,
}

impl TreeViewService {
    pub fn new(categories: Arc<CategoryService>, idle_ttl: Duration) -> Self {
        Self {
            categories,
            views: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Mount a view and load its first projection
    pub async fn open(&self, domain: CategoryDomain, include_inactive: bool) -> Result<TreeViewSnapshot> {
        self.prune_idle().await;

        let mut view = CategoryTreeView::new(domain, include_inactive);
        view.refresh(&self.categories).await?;
        let snapshot = TreeViewSnapshot::of(&view);

        self.views.write().await.insert(
            view.id(),
            ViewEntry {
                domain,
                view: Arc::new(Mutex::new(view)),
            },
        );
        tracing::info!("Opened {} tree view {}", domain, snapshot.view_id);

        Ok(snapshot)
    }

    /// Re-render from the (possibly refetched) domain list
    pub async fn render(&self, domain: CategoryDomain, view_id: Uuid) -> Result<TreeViewSnapshot> {
        let view = self.find(domain, view_id).await?;
        let mut view = view.lock().await;
        view.touch();
        view.refresh(&self.categories).await?;
        Ok(TreeViewSnapshot::of(&view))
    }

    pub async fn toggle(&self, domain: CategoryDomain, view_id: Uuid, node_id: Uuid) -> Result<TreeViewSnapshot> {
        let view = self.find(domain, view_id).await?;
        let mut view = view.lock().await;
        view.touch();
        view.toggle(node_id);
        Ok(TreeViewSnapshot::of(&view))
    }

    pub async fn reorder(
        &self,
        domain: CategoryDomain,
        view_id: Uuid,
        event: DragEnd,
    ) -> Result<(ReorderOutcome, TreeViewSnapshot)> {
        let view = self.find(domain, view_id).await?;
        let mut view = view.lock().await;
        view.touch();
        let outcome = view.reorder(&self.categories, event).await;
        Ok((outcome, TreeViewSnapshot::of(&view)))
    }

    /// Unmount; the view's expansion state is gone afterwards
    pub async fn close(&self, domain: CategoryDomain, view_id: Uuid) -> Result<()> {
        self.find(domain, view_id).await?;
        self.views.write().await.remove(&view_id);
        tracing::info!("Closed {} tree view {}", domain, view_id);
        Ok(())
    }

    async fn find(&self, domain: CategoryDomain, view_id: Uuid) -> Result<Arc<Mutex<CategoryTreeView>>> {
        let not_found =
            || AppError::NotFound(format!("Tree view {} not found for {} categories", view_id, domain));

        let views = self.views.read().await;
        // Views of other domains are invisible here
        views
            .get(&view_id)
            .filter(|entry| entry.domain == domain)
            .map(|entry| Arc::clone(&entry.view))
            .ok_or_else(not_found)
    }

    /// Drop views idle past the TTL; busy views are skipped
    async fn prune_idle(&self) {
        let mut views = self.views.write().await;
        let before = views.len();
        views.retain(|_, entry| match entry.view.try_lock() {
            Ok(view) => view.idle_for() < self.idle_ttl,
            Err(_) => true,
        });
        let pruned = before - views.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} idle tree views", pruned);
        }
    }
}

/// Rendered state of a view at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct TreeViewSnapshot {
    pub view_id: Uuid,
    pub domain: CategoryDomain,
    pub expanded: Vec<Uuid>,
    pub rows: Vec<FlatRow>,
}

impl TreeViewSnapshot {
    fn of(view: &CategoryTreeView) -> Self {
        let mut expanded: Vec<Uuid> = view.expansion().iter().copied().collect();
        expanded.sort_unstable();
        Self {
            view_id: view.id(),
            domain: view.domain(),
            expanded,
            rows: view.rows().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::store::{CategoryStore, InMemoryCategoryStore};
    use crate::shared::test_helpers::{category, category_service, node_id};

    fn names(rows: &[FlatRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    async fn seeded_view() -> (Arc<InMemoryCategoryStore>, Arc<CategoryService>, CategoryTreeView) {
        let store = Arc::new(InMemoryCategoryStore::new());
        store
            .seed(
                CategoryDomain::Question,
                vec![
                    category(1, "A", None, Some(0)),
                    category(2, "B", Some(1), Some(0)),
                    category(3, "C", None, Some(1)),
                ],
            )
            .await;
        let service = category_service(Arc::clone(&store));
        let mut view = CategoryTreeView::new(CategoryDomain::Question, false);
        view.refresh(&service).await.unwrap();
        (store, service, view)
    }

    fn drag(source: u128, target: u128) -> DragEnd {
        DragEnd {
            source_id: node_id(source),
            target_id: Some(node_id(target)),
        }
    }

    #[tokio::test]
    async fn test_toggle_expands_and_collapses() {
        let (_store, _service, mut view) = seeded_view().await;
        assert_eq!(names(view.rows()), vec!["A", "C"]);

        assert!(view.toggle(node_id(1)));
        assert_eq!(names(view.rows()), vec!["A", "B", "C"]);

        assert!(!view.toggle(node_id(1)));
        assert_eq!(names(view.rows()), vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_reorder_writes_one_sort_order_and_refreshes() {
        let (store, service, mut view) = seeded_view().await;

        let outcome = view.reorder(&service, drag(3, 1)).await;

        assert_eq!(
            outcome,
            ReorderOutcome::Applied {
                id: node_id(3),
                sort_order: 0
            }
        );
        let moved = store
            .get(CategoryDomain::Question, node_id(3))
            .await
            .unwrap();
        assert_eq!(moved.sort_order, Some(0));
        assert_eq!(moved.parent(), None);
        // A:0 and C:0 tie; store order (by name) keeps A first
        assert_eq!(names(view.rows()), vec!["A", "C"]);
        assert_eq!(view.rows()[1].sort_order, Some(0));
    }

    #[tokio::test]
    async fn test_failed_reorder_keeps_rows() {
        let (store, service, mut view) = seeded_view().await;
        let before = view.rows().to_vec();
        store.fail_next_write("network unreachable").await;

        let outcome = view.reorder(&service, drag(3, 1)).await;

        assert!(matches!(outcome, ReorderOutcome::Failed { .. }));
        assert_eq!(view.rows(), before.as_slice());
        let untouched = store
            .get(CategoryDomain::Question, node_id(3))
            .await
            .unwrap();
        assert_eq!(untouched.sort_order, Some(1));
    }

    #[tokio::test]
    async fn test_drop_on_hidden_row_is_stale() {
        let (_store, service, mut view) = seeded_view().await;

        let outcome = view.reorder(&service, drag(3, 2)).await;

        assert_eq!(
            outcome,
            ReorderOutcome::Stale {
                missing: node_id(2)
            }
        );
    }

    #[tokio::test]
    async fn test_refresh_forgets_deleted_expanded_nodes() {
        let (store, service, mut view) = seeded_view().await;
        view.toggle(node_id(1));

        store
            .delete(CategoryDomain::Question, node_id(1))
            .await
            .unwrap();
        service.invalidate(CategoryDomain::Question).await;
        view.refresh(&service).await.unwrap();

        assert_eq!(view.expansion().iter().count(), 0);
        // B lost its parent and shows up as a root
        assert_eq!(names(view.rows()), vec!["B", "C"]);
    }

    #[tokio::test]
    async fn test_views_are_scoped_to_their_domain() {
        let store = Arc::new(InMemoryCategoryStore::new());
        store
            .seed(CategoryDomain::Shop, vec![category(1, "Gear", None, None)])
            .await;
        let views = TreeViewService::new(category_service(store), Duration::from_secs(60));

        let shop = views.open(CategoryDomain::Shop, false).await.unwrap();
        let question = views.open(CategoryDomain::Question, false).await.unwrap();

        assert_eq!(shop.rows.len(), 1);
        assert!(question.rows.is_empty());
        assert!(views
            .render(CategoryDomain::Question, shop.view_id)
            .await
            .is_err());

        views
            .toggle(CategoryDomain::Shop, shop.view_id, node_id(1))
            .await
            .unwrap();
        let question_again = views
            .render(CategoryDomain::Question, question.view_id)
            .await
            .unwrap();
        assert!(question_again.expanded.is_empty());
    }

    #[tokio::test]
    async fn test_closed_view_is_gone() {
        let store = Arc::new(InMemoryCategoryStore::new());
        let views = TreeViewService::new(category_service(store), Duration::from_secs(60));
        let snapshot = views
            .open(CategoryDomain::KnowledgeBase, true)
            .await
            .unwrap();

        views
            .close(CategoryDomain::KnowledgeBase, snapshot.view_id)
            .await
            .unwrap();

        assert!(matches!(
            views
                .render(CategoryDomain::KnowledgeBase, snapshot.view_id)
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_idle_views_are_pruned_on_open() {
        let store = Arc::new(InMemoryCategoryStore::new());
        let views = TreeViewService::new(category_service(store), Duration::ZERO);
        let first = views.open(CategoryDomain::Shop, false).await.unwrap();

        views.open(CategoryDomain::Shop, false).await.unwrap();

        assert!(views.render(CategoryDomain::Shop, first.view_id).await.is_err());
    }
}
