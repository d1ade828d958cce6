use utoipa::{Modify, OpenApi};

use crate::features::categories::{
    dtos as categories_dtos, handlers as categories_handlers, models as categories_models,
    services as categories_services,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::list_parent_options,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Category tree views
        categories_handlers::open_tree_view,
        categories_handlers::render_tree_view,
        categories_handlers::toggle_tree_node,
        categories_handlers::reorder_tree_view,
        categories_handlers::close_tree_view,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Categories
            categories_models::CategoryDomain,
            categories_models::ParentRef,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryTreeDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<Vec<categories_dtos::CategoryTreeDto>>,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            // Category tree views
            categories_services::ReorderOutcome,
            categories_dtos::OpenTreeViewDto,
            categories_dtos::ToggleNodeDto,
            categories_dtos::ReorderCategoryDto,
            categories_dtos::FlatRowDto,
            categories_dtos::TreeViewResponseDto,
            categories_dtos::ReorderResponseDto,
            ApiResponse<categories_dtos::TreeViewResponseDto>,
            ApiResponse<categories_dtos::ReorderResponseDto>,
        )
    ),
    tags(
        (name = "categories", description = "Hierarchical categories per domain (question, knowledge-base, shop)"),
        (name = "category-views", description = "Mounted category trees: expansion and drag-and-drop reorder"),
    ),
    info(
        title = "Quizdesk Admin API",
        version = "0.1.0",
        description = "Back-office API for category management",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
