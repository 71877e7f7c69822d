use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::domain::catalog::{CatalogTool, Category, ToolFilter, Vendor};
use crate::recommendations::CATALOG_QUERY_LIMIT;

use super::{ApiError, not_found, store_error};

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/{slug}", get(get_tool))
        .route("/categories", get(list_categories))
        .route("/vendors", get(list_vendors))
}

#[derive(Debug, Deserialize)]
struct ToolListQuery {
    category: Option<String>,
    vendor: Option<String>,
}

/// GET /api/tools - Published tools, optionally narrowed by category or vendor.
async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ToolListQuery>,
) -> Result<Json<Vec<CatalogTool>>, ApiError> {
    let filter = ToolFilter {
        category: query.category.filter(|c| !c.is_empty()),
        vendor: query.vendor.filter(|v| !v.is_empty()),
        limit: Some(CATALOG_QUERY_LIMIT),
        ..ToolFilter::published()
    };
    let tools = state
        .persistence
        .find_tools(&filter)
        .await
        .map_err(|e| store_error(&e))?;
    Ok(Json(tools))
}

/// GET /api/tools/{slug} - One published tool. Drafts are not visible here.
async fn get_tool(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogTool>, ApiError> {
    let tool = state
        .persistence
        .get_tool_by_slug(&slug)
        .await
        .map_err(|e| store_error(&e))?
        .filter(CatalogTool::is_published)
        .ok_or_else(|| not_found("Tool", &slug))?;
    Ok(Json(tool))
}

/// GET /api/categories
async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = state
        .persistence
        .list_categories()
        .await
        .map_err(|e| store_error(&e))?;
    Ok(Json(categories))
}

/// GET /api/vendors
async fn list_vendors(State(state): State<AppState>) -> Result<Json<Vec<Vendor>>, ApiError> {
    let vendors = state
        .persistence
        .list_vendors()
        .await
        .map_err(|e| store_error(&e))?;
    Ok(Json(vendors))
}
