use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Serialize;

use crate::AppState;
use crate::domain::lead::NewLead;

use super::{ApiError, invalid, store_error};

pub fn build_router() -> Router<AppState> {
    Router::new().route("/leads", post(create_lead))
}

#[derive(Debug, Serialize)]
struct LeadCreatedResponse {
    id: String,
    status: &'static str,
}

/// POST /api/leads - Contact / demo-request form.
///
/// Submissions that fill the honeypot field get the same response as real
/// ones but are not stored.
async fn create_lead(
    State(state): State<AppState>,
    Json(payload): Json<NewLead>,
) -> Result<(StatusCode, Json<LeadCreatedResponse>), ApiError> {
    if payload.is_spam() {
        tracing::info!(name: "lead.honeypot", "Dropped lead caught by honeypot");
        return Ok((
            StatusCode::CREATED,
            Json(LeadCreatedResponse {
                id: uuid::Uuid::new_v4().to_string(),
                status: "received",
            }),
        ));
    }

    let lead = payload.into_lead().map_err(|e| invalid(&e))?;
    state
        .persistence
        .save_lead(&lead)
        .await
        .map_err(|e| store_error(&e))?;

    metrics::counter!("shortlist_leads_total", "source" => "contact").increment(1);
    tracing::info!(
        name: "lead.captured",
        lead_id = %lead.id,
        source = "contact",
        tool = ?lead.tool_slug,
        utm_source = ?lead.utm.source,
        utm_campaign = ?lead.utm.campaign,
        "Lead captured"
    );

    Ok((
        StatusCode::CREATED,
        Json(LeadCreatedResponse {
            id: lead.id,
            status: "received",
        }),
    ))
}
