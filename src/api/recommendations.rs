use axum::{
    Form, Json, Router,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::domain::criteria::{BuyerCriteria, SizeBand, split_list};
use crate::domain::lead::{NewLead, UtmParams};
use crate::domain::recommendation::{
    RecommendationResult, RecommendationSubmission, SubmissionContact,
};
use crate::domain::validation::ValidationError;

use super::{ApiError, invalid, not_found, store_error};

/// Size band assumed when the questionnaire form omits it.
const FORM_DEFAULT_SIZE_BAND: SizeBand = SizeBand::Small;

/// JSON endpoints, nested under `/api`.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(create_recommendation))
        .route("/results/{id}", get(get_result))
}

/// Questionnaire form endpoint, mounted at the site root.
pub fn build_form_router() -> Router<AppState> {
    Router::new().route("/recommend", post(submit_questionnaire))
}

/// POST /api/recommendations - Shortlist for JSON criteria.
///
/// The computed result is also stored as a submission; a storage failure
/// there is logged and does not fail the request.
async fn create_recommendation(
    State(state): State<AppState>,
    Json(criteria): Json<BuyerCriteria>,
) -> Result<Json<RecommendationResult>, ApiError> {
    let criteria = criteria.validated().map_err(|e| invalid(&e))?;

    let result = state
        .recommendations
        .recommend(&criteria)
        .await
        .map_err(|e| store_error(&e))?;

    let submission = RecommendationSubmission::new(result, None, UtmParams::default());
    if let Err(e) = state.persistence.save_submission(&submission).await {
        tracing::warn!(error = ?e, "Failed to record recommendation submission");
    }

    Ok(Json(submission.result))
}

/// Questionnaire as posted by the site's HTML form. List fields are
/// comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionnaireForm {
    #[serde(default)]
    pub size_band: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub integrations: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_term: Option<String>,
    #[serde(default)]
    pub utm_content: Option<String>,
    /// Honeypot.
    #[serde(default)]
    pub website: Option<String>,
}

impl QuestionnaireForm {
    pub fn criteria(&self) -> Result<BuyerCriteria, ValidationError> {
        let size_band = match self.size_band.as_deref().map(str::trim) {
            None | Some("") => FORM_DEFAULT_SIZE_BAND,
            Some(raw) => SizeBand::parse(raw)
                .ok_or_else(|| ValidationError::invalid("size_band", format!("unknown band '{raw}'")))?,
        };
        BuyerCriteria::new(
            size_band,
            split_list(self.categories.as_deref()),
            split_list(self.integrations.as_deref()),
        )
    }

    fn utm(&self) -> UtmParams {
        UtmParams {
            source: self.utm_source.clone(),
            medium: self.utm_medium.clone(),
            campaign: self.utm_campaign.clone(),
            term: self.utm_term.clone(),
            content: self.utm_content.clone(),
        }
    }

    /// Contact details as a lead, if the buyer left an email address.
    fn lead(&self, size_band: SizeBand) -> Option<NewLead> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        Some(NewLead {
            name: self.name.clone().unwrap_or_default(),
            email: email.to_string(),
            phone: self.phone.clone(),
            company: self.company.clone(),
            company_size: Some(size_band),
            message: None,
            tool_slug: None,
            utm: self.utm(),
            website: self.website.clone(),
        })
    }
}

/// POST /recommend - Questionnaire form submission.
///
/// Stores the shortlist (and the lead, when contact details were given) and
/// redirects to the results page. A failed lead write is logged against the
/// submission id; the buyer still gets their results.
async fn submit_questionnaire(
    State(state): State<AppState>,
    Form(form): Form<QuestionnaireForm>,
) -> Result<Redirect, ApiError> {
    let criteria = form.criteria().map_err(|e| invalid(&e))?;
    let utm = form.utm().sanitized().map_err(|e| invalid(&e))?;

    let lead = match form.lead(criteria.size_band) {
        Some(new_lead) if new_lead.is_spam() => {
            tracing::info!(name: "lead.honeypot", "Dropped questionnaire contact caught by honeypot");
            None
        }
        Some(new_lead) => Some(new_lead.into_lead().map_err(|e| invalid(&e))?),
        None => None,
    };
    let contact = lead.as_ref().map(|l| SubmissionContact {
        name: l.name.clone(),
        email: l.email.clone(),
        company: l.company.clone(),
        phone: l.phone.clone(),
    });

    let submission = state
        .recommendations
        .submit(&criteria, contact, utm)
        .await
        .map_err(|e| store_error(&e))?;

    if let Some(mut lead) = lead {
        lead.submission_id = Some(submission.id.clone());
        match state.persistence.save_lead(&lead).await {
            Ok(()) => {
                metrics::counter!("shortlist_leads_total", "source" => "questionnaire").increment(1);
                tracing::info!(name: "lead.captured", lead_id = %lead.id, source = "questionnaire", "Lead captured");
            }
            Err(e) => {
                // The contact is kept on the stored submission.
                metrics::counter!("shortlist_lead_store_failures_total").increment(1);
                tracing::error!(
                    name: "lead.store_failed",
                    error = ?e,
                    submission_id = %submission.id,
                    "Failed to store questionnaire lead"
                );
            }
        }
    }

    Ok(Redirect::to(&format!("/results/{}", submission.id)))
}

/// Public view of a stored submission. Contact details are not exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionView {
    id: String,
    #[serde(flatten)]
    result: RecommendationResult,
    created_at: DateTime<Utc>,
}

/// GET /api/results/{id} - Stored shortlist for the results page.
async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubmissionView>, ApiError> {
    let submission = state
        .persistence
        .get_submission(&id)
        .await
        .map_err(|e| store_error(&e))?
        .ok_or_else(|| not_found("Result", &id))?;

    Ok(Json(SubmissionView {
        id: submission.id,
        result: submission.result,
        created_at: submission.created_at,
    }))
}
