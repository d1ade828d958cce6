use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::categories::dtos::{
    CategoryResponseDto, CategoryTreeDto, CreateCategoryDto, ListCategoriesQuery,
    OpenTreeViewDto, ReorderCategoryDto, ReorderResponseDto, ToggleNodeDto, TreeViewResponseDto,
    UpdateCategoryDto,
};
use crate::features::categories::models::CategoryDomain;
use crate::features::categories::services::{CategoryEditor, CategoryService, TreeViewService};
use crate::shared::types::{ApiResponse, Meta};

/// List categories of a domain
///
/// Returns a flat list, or the sorted tree when `tree=true`.
#[utoipa::path(
    get,
    path = "/api/admin/{domain}/categories",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ListCategoriesQuery
    ),
    responses(
        (status = 200, description = "Flat list of categories, or `CategoryTreeDto` roots when tree=true", body = ApiResponse<Vec<CategoryResponseDto>>),
        (status = 400, description = "Tree too deep for nested output")
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    Path(domain): Path<CategoryDomain>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Response> {
    if query.tree {
        let forest = service.tree(domain, query.include_inactive).await?;
        let tree = CategoryTreeDto::from_forest(&forest)?;
        let meta = Meta::total(tree.len());
        Ok(Json(ApiResponse::success(Some(tree), None, Some(meta))).into_response())
    } else {
        let categories: Vec<CategoryResponseDto> = service
            .list(domain, query.include_inactive)
            .await?
            .into_iter()
            .map(CategoryResponseDto::from)
            .collect();
        let meta = Meta::total(categories.len());
        Ok(Json(ApiResponse::success(Some(categories), None, Some(meta))).into_response())
    }
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/admin/{domain}/categories/{id}",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path((domain, id)): Path<(CategoryDomain, Uuid)>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get(domain, id).await?;
    Ok(Json(ApiResponse::success(
        Some(CategoryResponseDto::from(category)),
        None,
        None,
    )))
}

/// Parent choices for the edit dialog of a category (every category except itself)
#[utoipa::path(
    get,
    path = "/api/admin/{domain}/categories/{id}/parent-options",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ("id" = Uuid, Path, description = "Category being edited")
    ),
    responses(
        (status = 200, description = "Selectable parents", body = ApiResponse<Vec<CategoryResponseDto>>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn list_parent_options(
    State(service): State<Arc<CategoryService>>,
    Path((domain, id)): Path<(CategoryDomain, Uuid)>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let options: Vec<CategoryResponseDto> = service
        .parent_options(domain, id)
        .await?
        .into_iter()
        .map(CategoryResponseDto::from)
        .collect();
    let meta = Meta::total(options.len());
    Ok(Json(ApiResponse::success(Some(options), None, Some(meta))))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/admin/{domain}/categories",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain")
    ),
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(service): State<Arc<CategoryService>>,
    Path(domain): Path<CategoryDomain>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    let mut editor = CategoryEditor::create(domain);
    dto.apply_to(editor.form_mut());

    let category = editor.submit(&service).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(CategoryResponseDto::from(category)),
            Some("Category created".to_string()),
            None,
        )),
    ))
}

/// Update a category; omitted fields are left untouched
#[utoipa::path(
    put,
    path = "/api/admin/{domain}/categories/{id}",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(service): State<Arc<CategoryService>>,
    Path((domain, id)): Path<(CategoryDomain, Uuid)>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let original = service.get(domain, id).await?;
    let mut editor = CategoryEditor::edit(domain, original);
    dto.apply_to(editor.form_mut());

    let category = editor.submit(&service).await?;
    Ok(Json(ApiResponse::success(
        Some(CategoryResponseDto::from(category)),
        Some("Category updated".to_string()),
        None,
    )))
}

/// Delete a category
///
/// Refused with 409 while records of the domain still reference it.
#[utoipa::path(
    delete,
    path = "/api/admin/{domain}/categories/{id}",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still in use")
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(service): State<Arc<CategoryService>>,
    Path((domain, id)): Path<(CategoryDomain, Uuid)>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(domain, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Category deleted".to_string()),
        None,
    )))
}

/// Mount a tree view; every node starts collapsed
#[utoipa::path(
    post,
    path = "/api/admin/{domain}/category-views",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain")
    ),
    request_body = OpenTreeViewDto,
    responses(
        (status = 201, description = "Tree view opened", body = ApiResponse<TreeViewResponseDto>)
    ),
    tag = "category-views"
)]
pub async fn open_tree_view(
    State(views): State<Arc<TreeViewService>>,
    Path(domain): Path<CategoryDomain>,
    AppJson(dto): AppJson<OpenTreeViewDto>,
) -> Result<(StatusCode, Json<ApiResponse<TreeViewResponseDto>>)> {
    let snapshot = views.open(domain, dto.include_inactive).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(TreeViewResponseDto::from(snapshot)),
            None,
            None,
        )),
    ))
}

/// Re-render a tree view from the current category list
#[utoipa::path(
    get,
    path = "/api/admin/{domain}/category-views/{view_id}",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ("view_id" = Uuid, Path, description = "Tree view ID")
    ),
    responses(
        (status = 200, description = "Rendered rows", body = ApiResponse<TreeViewResponseDto>),
        (status = 404, description = "Tree view not found")
    ),
    tag = "category-views"
)]
pub async fn render_tree_view(
    State(views): State<Arc<TreeViewService>>,
    Path((domain, view_id)): Path<(CategoryDomain, Uuid)>,
) -> Result<Json<ApiResponse<TreeViewResponseDto>>> {
    let snapshot = views.render(domain, view_id).await?;
    Ok(Json(ApiResponse::success(
        Some(TreeViewResponseDto::from(snapshot)),
        None,
        None,
    )))
}

/// Expand or collapse one node
#[utoipa::path(
    post,
    path = "/api/admin/{domain}/category-views/{view_id}/toggle",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ("view_id" = Uuid, Path, description = "Tree view ID")
    ),
    request_body = ToggleNodeDto,
    responses(
        (status = 200, description = "Rendered rows after the toggle", body = ApiResponse<TreeViewResponseDto>),
        (status = 404, description = "Tree view not found")
    ),
    tag = "category-views"
)]
pub async fn toggle_tree_node(
    State(views): State<Arc<TreeViewService>>,
    Path((domain, view_id)): Path<(CategoryDomain, Uuid)>,
    AppJson(dto): AppJson<ToggleNodeDto>,
) -> Result<Json<ApiResponse<TreeViewResponseDto>>> {
    let snapshot = views.toggle(domain, view_id, dto.id).await?;
    Ok(Json(ApiResponse::success(
        Some(TreeViewResponseDto::from(snapshot)),
        None,
        None,
    )))
}

/// Apply a drag-end event to a tree view
///
/// The source takes the target's sort order. Stale drops and store failures
/// are reported in `outcome` with status 200; the rows then stay as they were.
#[utoipa::path(
    post,
    path = "/api/admin/{domain}/category-views/{view_id}/reorder",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ("view_id" = Uuid, Path, description = "Tree view ID")
    ),
    request_body = ReorderCategoryDto,
    responses(
        (status = 200, description = "Drop handled", body = ApiResponse<ReorderResponseDto>),
        (status = 404, description = "Tree view not found")
    ),
    tag = "category-views"
)]
pub async fn reorder_tree_view(
    State(views): State<Arc<TreeViewService>>,
    Path((domain, view_id)): Path<(CategoryDomain, Uuid)>,
    AppJson(dto): AppJson<ReorderCategoryDto>,
) -> Result<Json<ApiResponse<ReorderResponseDto>>> {
    let (outcome, snapshot) = views.reorder(domain, view_id, dto.into()).await?;
    Ok(Json(ApiResponse::success(
        Some(ReorderResponseDto {
            outcome,
            view: TreeViewResponseDto::from(snapshot),
        }),
        None,
        None,
    )))
}

/// Unmount a tree view and forget its expansion state
#[utoipa::path(
    delete,
    path = "/api/admin/{domain}/category-views/{view_id}",
    params(
        ("domain" = CategoryDomain, Path, description = "Category domain"),
        ("view_id" = Uuid, Path, description = "Tree view ID")
    ),
    responses(
        (status = 200, description = "Tree view closed"),
        (status = 404, description = "Tree view not found")
    ),
    tag = "category-views"
)]
pub async fn close_tree_view(
    State(views): State<Arc<TreeViewService>>,
    Path((domain, view_id)): Path<(CategoryDomain, Uuid)>,
) -> Result<Json<ApiResponse<()>>> {
    views.close(domain, view_id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Tree view closed".to_string()),
        None,
    )))
}
