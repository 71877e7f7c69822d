use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::domain::criteria::BuyerCriteria;
use crate::domain::lead::UtmParams;
use crate::domain::recommendation::{
    RecommendationResult, RecommendationSubmission, SubmissionContact,
};
use crate::persistence::PersistenceLayer;

use super::engine::{self, CATALOG_QUERY_LIMIT};

/// Fetches a catalog snapshot and runs the engine over it.
///
/// Holds no state between calls; every request does its own catalog read.
#[derive(Debug, Clone)]
pub struct RecommendationService {
    persistence: Arc<dyn PersistenceLayer>,
}

impl RecommendationService {
    pub fn new(persistence: Arc<dyn PersistenceLayer>) -> Self {
        Self { persistence }
    }

    /// Shortlist for `criteria`. Store failures propagate to the caller.
    pub async fn recommend(&self, criteria: &BuyerCriteria) -> Result<RecommendationResult> {
        let started = Instant::now();
        let catalog = self
            .persistence
            .find_published_tools(CATALOG_QUERY_LIMIT)
            .await?;
        let candidates = catalog.len();

        let result = engine::recommend(criteria, catalog);

        metrics::counter!("shortlist_recommendations_total").increment(1);
        if result.tools.is_empty() {
            metrics::counter!("shortlist_recommendations_empty_total").increment(1);
        }
        metrics::histogram!("shortlist_recommendation_seconds")
            .record(started.elapsed().as_secs_f64());

        tracing::info!(
            name: "recommendation.served",
            size_band = %criteria.size_band,
            categories = ?criteria.categories_needed,
            integrations = ?criteria.must_have_integrations,
            candidates,
            shortlisted = result.tools.len(),
            top_score = result.tools.first().map(|t| t.score),
            "Recommendation computed"
        );

        Ok(result)
    }

    /// Compute a shortlist and store it as an immutable submission snapshot.
    pub async fn submit(
        &self,
        criteria: &BuyerCriteria,
        contact: Option<SubmissionContact>,
        utm: UtmParams,
    ) -> Result<RecommendationSubmission> {
        let result = self.recommend(criteria).await?;
        let submission = RecommendationSubmission::new(result, contact, utm);
        self.persistence.save_submission(&submission).await?;

        tracing::info!(
            name: "recommendation.submission.saved",
            submission_id = %submission.id,
            has_contact = submission.contact.is_some(),
            "Recommendation submission stored"
        );
        Ok(submission)
    }
}
