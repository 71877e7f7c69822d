//! Deterministic shortlist engine.
//!
//! Filters the catalog by category overlap and required integrations, scores
//! each eligible tool and returns the top five with the reasons behind each
//! score. Pure: no I/O, no clock, no randomness.

use crate::domain::catalog::CatalogTool;
use crate::domain::criteria::BuyerCriteria;
use crate::domain::labels::{category_label, size_band_label};
use crate::domain::recommendation::{RecommendationResult, ScoredResult};

/// Maximum number of catalog records read per recommendation.
pub const CATALOG_QUERY_LIMIT: usize = 500;

/// Maximum number of tools in a shortlist.
pub const SHORTLIST_SIZE: usize = 5;

const POINTS_PER_CATEGORY: u32 = 4;
const POINTS_SIZE_BAND_FIT: u32 = 5;
const POINTS_PER_INTEGRATION: u32 = 2;
const POINTS_VERIFIED: u32 = 1;

/// Why a tool was left out of the shortlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    NoCategoryOverlap,
    MissingIntegrations(Vec<String>),
}

impl std::fmt::Display for Ineligible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCategoryOverlap => f.write_str("no category overlap"),
            Self::MissingIntegrations(missing) => {
                write!(f, "missing required integration: {}", missing.join(", "))
            }
        }
    }
}

/// Decide whether `tool` can be recommended for `criteria`.
///
/// On success returns the requested categories the tool covers, in the tool's
/// own category order.
pub fn eligibility(tool: &CatalogTool, criteria: &BuyerCriteria) -> Result<Vec<String>, Ineligible> {
    let matched: Vec<String> = tool
        .categories
        .iter()
        .filter(|c| criteria.needs_category(c))
        .cloned()
        .collect();
    if matched.is_empty() {
        return Err(Ineligible::NoCategoryOverlap);
    }

    let missing: Vec<String> = criteria
        .must_have_integrations
        .iter()
        .filter(|i| !tool.supports_integration(i))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Ineligible::MissingIntegrations(missing));
    }

    Ok(matched)
}

/// Score an eligible tool. Reasons are emitted in the same order the terms
/// are added, and only for terms that apply.
pub fn score(
    tool: &CatalogTool,
    criteria: &BuyerCriteria,
    matched_categories: &[String],
) -> (u32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    if !matched_categories.is_empty() {
        score += POINTS_PER_CATEGORY * count(matched_categories.len());
        let labels: Vec<&str> = matched_categories
            .iter()
            .map(|c| category_label(c))
            .collect();
        reasons.push(format!("Matches: {}.", labels.join(", ")));
    }

    let band = criteria.size_band.as_str();
    if tool.best_for_size_bands.is_empty() || tool.best_for_size_bands.iter().any(|b| b == band) {
        score += POINTS_SIZE_BAND_FIT;
        reasons.push(format!(
            "Good fit for {} employee teams.",
            size_band_label(band)
        ));
    }

    let supported: Vec<&str> = criteria
        .must_have_integrations
        .iter()
        .filter(|i| tool.supports_integration(i))
        .map(String::as_str)
        .collect();
    if !supported.is_empty() {
        score += POINTS_PER_INTEGRATION * count(supported.len());
        reasons.push(format!("Supports integrations: {}.", supported.join(", ")));
    }

    if tool.last_verified_at.is_some() {
        score += POINTS_VERIFIED;
        reasons.push("Recently verified listing.".to_string());
    }

    (score, reasons)
}

/// Order by score, highest first, and keep the top [`SHORTLIST_SIZE`].
///
/// The sort is stable: equal scores keep the order the catalog returned them
/// in. No other tie-break is applied.
pub fn rank(mut scored: Vec<ScoredResult>) -> Vec<ScoredResult> {
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(SHORTLIST_SIZE);
    scored
}

/// Build a shortlist for `criteria` from a catalog snapshot.
pub fn recommend<I>(criteria: &BuyerCriteria, catalog: I) -> RecommendationResult
where
    I: IntoIterator<Item = CatalogTool>,
{
    let mut scored = Vec::new();
    for tool in catalog {
        match eligibility(&tool, criteria) {
            Ok(matched_categories) => {
                let (score, reasons) = score(&tool, criteria, &matched_categories);
                scored.push(ScoredResult {
                    tool: tool.into(),
                    score,
                    matched_categories,
                    reasons,
                });
            }
            Err(reason) => {
                tracing::trace!(tool = %tool.slug, %reason, "Tool excluded from shortlist");
            }
        }
    }

    RecommendationResult {
        criteria: criteria.clone(),
        tools: rank(scored),
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
