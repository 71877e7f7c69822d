use crate::domain::catalog::{
    CatalogTool, Category, NewTool, NewVendor, ToolFilter, ToolStatus, Vendor,
};
use crate::domain::lead::{Lead, LeadStatus};
use crate::domain::recommendation::RecommendationSubmission;
use anyhow::Result;
use async_trait::async_trait;

pub mod providers;

/// Failure modes the API maps to specific status codes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} '{slug}' already exists")]
    Duplicate { kind: &'static str, slug: String },

    #[error("{kind} '{slug}' not found")]
    MissingReference { kind: &'static str, slug: String },
}

#[async_trait]
pub trait PersistenceLayer: Send + Sync + std::fmt::Debug {
    // =========================================================================
    // Catalog
    // =========================================================================

    /// Published tools with categories, integrations and vendor name joined,
    /// at most `limit` records, in the store's listing order.
    async fn find_published_tools(&self, limit: usize) -> Result<Vec<CatalogTool>>;

    /// Tools matching `filter`, any status unless the filter says otherwise.
    async fn find_tools(&self, filter: &ToolFilter) -> Result<Vec<CatalogTool>>;

    async fn get_tool_by_slug(&self, slug: &str) -> Result<Option<CatalogTool>>;

    /// Fails with [`StoreError::Duplicate`] if the slug is taken and
    /// [`StoreError::MissingReference`] if the vendor is unknown.
    async fn create_tool(&self, tool: &NewTool) -> Result<CatalogTool>;

    async fn set_tool_status(&self, slug: &str, status: ToolStatus)
    -> Result<Option<CatalogTool>>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn create_category(&self, category: &Category) -> Result<Category>;

    async fn list_vendors(&self) -> Result<Vec<Vendor>>;

    async fn create_vendor(&self, vendor: &NewVendor) -> Result<Vendor>;

    // =========================================================================
    // Leads
    // =========================================================================

    async fn save_lead(&self, lead: &Lead) -> Result<()>;

    /// Newest first.
    async fn list_leads(&self, status: Option<LeadStatus>, limit: usize) -> Result<Vec<Lead>>;

    async fn update_lead_status(&self, id: &str, status: LeadStatus) -> Result<Option<Lead>>;

    // =========================================================================
    // Recommendation submissions
    // =========================================================================

    async fn save_submission(&self, submission: &RecommendationSubmission) -> Result<()>;

    async fn get_submission(&self, id: &str) -> Result<Option<RecommendationSubmission>>;
}
