use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::{CategoryService, TreeViewService};

/// Create routes for the categories feature
///
/// Every route is scoped by the `{domain}` path segment.
pub fn routes(categories: Arc<CategoryService>, views: Arc<TreeViewService>) -> Router {
    let category_routes = Router::new()
        .route(
            "/api/admin/{domain}/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/admin/{domain}/categories/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/api/admin/{domain}/categories/{id}/parent-options",
            get(handlers::list_parent_options),
        )
        .with_state(categories);

    let view_routes = Router::new()
        .route(
            "/api/admin/{domain}/category-views",
            post(handlers::open_tree_view),
        )
        .route(
            "/api/admin/{domain}/category-views/{view_id}",
            get(handlers::render_tree_view).delete(handlers::close_tree_view),
        )
        .route(
            "/api/admin/{domain}/category-views/{view_id}/toggle",
            post(handlers::toggle_tree_node),
        )
        .route(
            "/api/admin/{domain}/category-views/{view_id}/reorder",
            post(handlers::reorder_tree_view),
        )
        .with_state(views);

    category_routes.merge(view_routes)
}
