//! Catalog item handlers.

use super::ListItemsQuery;
use crate::api::AppState;
use crate::pipeline::ListQuery;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

/// GET /items - Filtered, paginated listing
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "One page of the filtered item set", body = crate::types::PageResult),
        (status = 400, description = "Invalid paging parameters", body = crate::error::ApiError),
        (status = 404, description = "Catalog could not be fetched", body = crate::error::ApiError)
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> impl IntoResponse {
    let list_query = ListQuery {
        name_filter: query.name_filter,
        category_filter: query.category_filter,
        page_number: query.page.unwrap_or(1),
        page_size: query
            .limit
            .unwrap_or(state.config.pipeline.default_page_size as i64),
    };

    match state.pipeline.list_filtered(&list_query).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /items/categories - Every known category
#[utoipa::path(
    get,
    path = "/items/categories",
    tag = "items",
    responses(
        (status = 200, description = "Category list; empty when the upstream listing is unavailable", body = Vec<crate::types::CategoryRef>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    let categories = state.pipeline.categories().await;
    (StatusCode::OK, Json(categories))
}

/// GET /items/:name - Single-item summary with localized description
#[utoipa::path(
    get,
    path = "/items/{name}",
    tag = "items",
    params(("name" = String, Path, description = "Item name")),
    responses(
        (status = 200, description = "Item summary", body = crate::types::ItemSummary),
        (status = 404, description = "Item not found", body = crate::error::ApiError)
    )
)]
pub async fn get_item(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    match state.pipeline.item_summary(&name).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    }
}
