//! Staff-only management API for leads, tools, vendors and categories.
//!
//! Mounted under `/api/admin` behind
//! [`admin_auth_middleware`](crate::security::middleware::admin_auth_middleware).

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    routing::{get, patch, post},
};
use serde::Deserialize;

use crate::AppState;
use crate::domain::catalog::{
    CatalogTool, Category, NewTool, NewVendor, ToolFilter, ToolStatus, Vendor, is_valid_slug,
};
use crate::domain::lead::{Lead, LeadStatus};
use crate::domain::validation::{ValidationError, optional_text, required_text};
use crate::security::claims::StaffContext;

use super::{ApiError, invalid, not_found, store_error};

const DEFAULT_PAGE_LIMIT: usize = 50;
const MAX_PAGE_LIMIT: usize = 500;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads))
        .route("/leads/{id}", patch(update_lead))
        .route("/tools", get(list_tools).post(create_tool))
        .route("/tools/{slug}/status", patch(update_tool_status))
        .route("/vendors", get(list_vendors).post(create_vendor))
        .route("/categories", post(create_category))
}

/// Who performed an admin action, for audit logs. `anonymous` when tokens
/// are not required and none was sent.
#[derive(Debug)]
struct Actor(String);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<StaffContext>()
                .map_or_else(|| "anonymous".to_string(), |ctx| ctx.user_id.clone()),
        ))
    }
}

// =============================================================================
// Leads
// =============================================================================

#[derive(Debug, Deserialize)]
struct LeadListQuery {
    status: Option<LeadStatus>,
    limit: Option<usize>,
}

/// GET /leads - Newest first, optionally filtered by status.
async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
    let leads = state
        .persistence
        .list_leads(query.status, limit)
        .await
        .map_err(|e| store_error(&e))?;
    Ok(Json(leads))
}

#[derive(Debug, Deserialize)]
struct LeadStatusUpdate {
    status: LeadStatus,
}

/// PATCH /leads/{id} - Move a lead through the pipeline.
async fn update_lead(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    Json(req): Json<LeadStatusUpdate>,
) -> Result<Json<Lead>, ApiError> {
    let lead = state
        .persistence
        .update_lead_status(&id, req.status)
        .await
        .map_err(|e| store_error(&e))?
        .ok_or_else(|| not_found("Lead", &id))?;

    tracing::info!(name: "admin.lead.updated", %actor, lead_id = %id, status = req.status.as_str(), "Lead status changed");
    Ok(Json(lead))
}

// =============================================================================
// Tools
// =============================================================================

/// GET /tools - Any status unless `?status=` is given.
async fn list_tools(
    State(state): State<AppState>,
    Query(mut filter): Query<ToolFilter>,
) -> Result<Json<Vec<CatalogTool>>, ApiError> {
    filter.limit = Some(filter.limit.unwrap_or(MAX_PAGE_LIMIT).min(MAX_PAGE_LIMIT));
    let tools = state
        .persistence
        .find_tools(&filter)
        .await
        .map_err(|e| store_error(&e))?;
    Ok(Json(tools))
}

/// POST /tools - Create a tool. Unknown vendor → 422, taken slug → 409.
async fn create_tool(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(req): Json<NewTool>,
) -> Result<(StatusCode, Json<CatalogTool>), ApiError> {
    let new_tool = req.validated().map_err(|e| invalid(&e))?;
    let tool = state
        .persistence
        .create_tool(&new_tool)
        .await
        .map_err(|e| store_error(&e))?;

    tracing::info!(name: "admin.tool.created", %actor, slug = %tool.slug, status = tool.status.as_str(), "Tool created");
    Ok((StatusCode::CREATED, Json(tool)))
}

#[derive(Debug, Deserialize)]
struct ToolStatusUpdate {
    status: ToolStatus,
}

/// PATCH /tools/{slug}/status - Publish or unpublish.
async fn update_tool_status(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(slug): Path<String>,
    Json(req): Json<ToolStatusUpdate>,
) -> Result<Json<CatalogTool>, ApiError> {
    let tool = state
        .persistence
        .set_tool_status(&slug, req.status)
        .await
        .map_err(|e| store_error(&e))?
        .ok_or_else(|| not_found("Tool", &slug))?;

    tracing::info!(name: "admin.tool.status", %actor, %slug, status = req.status.as_str(), "Tool status changed");
    Ok(Json(tool))
}

// =============================================================================
// Vendors & categories
// =============================================================================

async fn list_vendors(State(state): State<AppState>) -> Result<Json<Vec<Vendor>>, ApiError> {
    let vendors = state
        .persistence
        .list_vendors()
        .await
        .map_err(|e| store_error(&e))?;
    Ok(Json(vendors))
}

async fn create_vendor(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(req): Json<NewVendor>,
) -> Result<(StatusCode, Json<Vendor>), ApiError> {
    let slug = required_text("slug", &req.slug, 80).map_err(|e| invalid(&e))?;
    if !is_valid_slug(&slug) {
        return Err(invalid(&ValidationError::invalid(
            "slug",
            "use lowercase letters, digits and single dashes",
        )));
    }
    let vendor = NewVendor {
        slug,
        name: required_text("name", &req.name, 120).map_err(|e| invalid(&e))?,
        website: optional_text("website", req.website.as_deref(), 240).map_err(|e| invalid(&e))?,
    };

    let vendor = state
        .persistence
        .create_vendor(&vendor)
        .await
        .map_err(|e| store_error(&e))?;

    tracing::info!(name: "admin.vendor.created", %actor, slug = %vendor.slug, "Vendor created");
    Ok((StatusCode::CREATED, Json(vendor)))
}

async fn create_category(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(req): Json<Category>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let slug = required_text("slug", &req.slug, 80).map_err(|e| invalid(&e))?;
    if !is_valid_slug(&slug) {
        return Err(invalid(&ValidationError::invalid(
            "slug",
            "use lowercase letters, digits and single dashes",
        )));
    }
    let category = Category {
        slug,
        name: required_text("name", &req.name, 120).map_err(|e| invalid(&e))?,
        description: optional_text("description", req.description.as_deref(), 1000)
            .map_err(|e| invalid(&e))?,
    };

    let category = state
        .persistence
        .create_category(&category)
        .await
        .map_err(|e| store_error(&e))?;

    tracing::info!(name: "admin.category.created", %actor, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}
