//! Recommendation output and the stored submission snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::CatalogTool;
use super::criteria::BuyerCriteria;
use super::lead::UtmParams;

/// The subset of a catalog tool shown on a shortlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    pub slug: String,
    pub name: String,
    pub tagline: Option<String>,
    pub vendor_name: Option<String>,
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl From<CatalogTool> for ToolSummary {
    fn from(tool: CatalogTool) -> Self {
        Self {
            slug: tool.slug,
            name: tool.name,
            tagline: tool.tagline,
            vendor_name: tool.vendor_name,
            last_verified_at: tool.last_verified_at,
        }
    }
}

/// One ranked tool with its score and the reasons behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub tool: ToolSummary,
    pub score: u32,
    /// Requested categories the tool covers, in the tool's order.
    pub matched_categories: Vec<String>,
    #[serde(rename = "why")]
    pub reasons: Vec<String>,
}

/// Criteria echo plus up to five tools, most fit first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub criteria: BuyerCriteria,
    pub tools: Vec<ScoredResult>,
}

/// Contact details captured alongside a questionnaire submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionContact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Immutable record of a questionnaire run, read back by the results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSubmission {
    pub id: String,
    #[serde(default)]
    pub contact: Option<SubmissionContact>,
    pub result: RecommendationResult,
    #[serde(default)]
    pub utm: UtmParams,
    pub created_at: DateTime<Utc>,
}

impl RecommendationSubmission {
    pub fn new(
        result: RecommendationResult,
        contact: Option<SubmissionContact>,
        utm: UtmParams,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            contact,
            result,
            utm,
            created_at: Utc::now(),
        }
    }
}
