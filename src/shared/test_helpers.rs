//! Fixtures shared by the unit and HTTP tests

use std::{sync::Arc, time::Duration};

use axum_test::TestServer;
use chrono::Utc;
use uuid::Uuid;

use crate::features::categories::{
    models::{Category, ParentRef},
    routes,
    store::InMemoryCategoryStore,
    CategoryService, TreeViewService,
};

/// Deterministic id for fixtures, `node_id(1)` reads like "category 1"
pub fn node_id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub fn category(id: u128, name: &str, parent: Option<u128>, sort_order: Option<i32>) -> Category {
    let now = Utc::now();
    Category {
        id: node_id(id),
        name: name.to_string(),
        parent_id: parent.map(|p| ParentRef::Id(node_id(p))),
        sort_order,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn category_service(store: Arc<InMemoryCategoryStore>) -> Arc<CategoryService> {
    Arc::new(CategoryService::new(store, Duration::from_secs(300)))
}

/// Router over an in-memory store, as mounted by `main`
pub fn test_server(store: Arc<InMemoryCategoryStore>) -> TestServer {
    let categories = category_service(store);
    let views = Arc::new(TreeViewService::new(
        Arc::clone(&categories),
        Duration::from_secs(1800),
    ));
    let app = routes::routes(categories, views);
    TestServer::new(app).unwrap()
}
