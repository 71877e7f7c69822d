//! HTTP handlers, grouped by audience.
//!
//! - [`catalog`]: public catalog reads
//! - [`recommendations`]: questionnaire and shortlist endpoints
//! - [`leads`]: lead capture
//! - [`admin`]: staff-only management API
//! - [`sitemap`]: `/sitemap.xml`

pub mod admin;
pub mod catalog;
pub mod leads;
pub mod recommendations;
pub mod sitemap;

use axum::http::StatusCode;

use crate::domain::validation::ValidationError;
use crate::persistence::StoreError;

/// Error half of every handler result.
pub type ApiError = (StatusCode, String);

/// Map a persistence failure onto a response.
pub(crate) fn store_error(e: &anyhow::Error) -> ApiError {
    match e.downcast_ref::<StoreError>() {
        Some(StoreError::Duplicate { .. }) => (StatusCode::CONFLICT, e.to_string()),
        Some(StoreError::MissingReference { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        None => {
            tracing::error!(error = ?e, "Store operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage unavailable".to_string(),
            )
        }
    }
}

pub(crate) fn invalid(e: &ValidationError) -> ApiError {
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}

pub(crate) fn not_found(kind: &str, id: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{kind} '{id}' not found"))
}
