//! Hierarchical categories of the back office.
//!
//! Three independent domains (question, knowledge-base, shop) share one
//! pipeline: a store holds flat records, the tree module turns them into a
//! sorted forest and flattened rows, and view sessions keep per-view
//! expansion state and apply drag-and-drop reorders.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/admin/{domain}/categories` | List categories (flat or `?tree=true`) |
//! | POST | `/api/admin/{domain}/categories` | Create a category |
//! | GET | `/api/admin/{domain}/categories/{id}` | Get a category |
//! | PUT | `/api/admin/{domain}/categories/{id}` | Update a category |
//! | DELETE | `/api/admin/{domain}/categories/{id}` | Delete an unreferenced category |
//! | GET | `/api/admin/{domain}/categories/{id}/parent-options` | Parent choices for the edit dialog |
//! | POST | `/api/admin/{domain}/category-views` | Open a tree view |
//! | GET | `/api/admin/{domain}/category-views/{view_id}` | Render a tree view |
//! | DELETE | `/api/admin/{domain}/category-views/{view_id}` | Close a tree view |
//! | POST | `/api/admin/{domain}/category-views/{view_id}/toggle` | Expand or collapse a node |
//! | POST | `/api/admin/{domain}/category-views/{view_id}/reorder` | Apply a drag-end event |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod tree;

pub use services::{CategoryService, TreeViewService};
