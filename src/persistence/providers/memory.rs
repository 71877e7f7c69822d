//! In-process store. Used for local development (optionally seeded from a
//! YAML catalog file) and by the test suite.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::catalog::{
    CatalogTool, Category, NewTool, NewVendor, ToolFilter, ToolStatus, Vendor,
};
use crate::domain::lead::{Lead, LeadStatus};
use crate::domain::recommendation::RecommendationSubmission;
use crate::persistence::{PersistenceLayer, StoreError};

#[derive(Debug, Clone)]
struct ToolRecord {
    tool: CatalogTool,
    vendor_slug: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Insertion order is the listing order.
    tools: Vec<ToolRecord>,
    vendors: Vec<Vendor>,
    categories: Vec<Category>,
    leads: Vec<Lead>,
    submissions: HashMap<String, RecommendationSubmission>,
}

/// Catalog file format accepted by [`MemoryProvider::from_seed_file`].
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub vendors: Vec<NewVendor>,
    #[serde(default)]
    pub tools: Vec<NewTool>,
}

#[derive(Debug, Default)]
pub struct MemoryProvider {
    state: RwLock<MemoryState>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Result<Self> {
        let provider = Self::new();
        {
            let mut state = provider.write()?;
            for category in seed.categories {
                state.insert_category(&category)?;
            }
            for vendor in &seed.vendors {
                state.insert_vendor(vendor, Utc::now())?;
            }
            for tool in seed.tools {
                let slug = tool.slug.clone();
                let tool = tool
                    .validated()
                    .with_context(|| format!("invalid seed tool '{slug}'"))?;
                state.insert_tool(&tool)?;
            }
        }
        Ok(provider)
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog seed {}", path.display()))?;
        let seed: CatalogSeed = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing catalog seed {}", path.display()))?;
        let provider = Self::from_seed(seed)?;
        tracing::info!(
            name: "persistence.seed.loaded",
            path = %path.display(),
            tools = provider.read()?.tools.len(),
            "Catalog seed loaded"
        );
        Ok(provider)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| anyhow!("memory store lock poisoned: {e}"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|e| anyhow!("memory store lock poisoned: {e}"))
    }
}

impl MemoryState {
    fn vendor_name(&self, slug: Option<&str>) -> Option<String> {
        let slug = slug?;
        self.vendors
            .iter()
            .find(|v| v.slug == slug)
            .map(|v| v.name.clone())
    }

    fn insert_category(&mut self, category: &Category) -> Result<Category> {
        if self.categories.iter().any(|c| c.slug == category.slug) {
            return Err(StoreError::Duplicate {
                kind: "Category",
                slug: category.slug.clone(),
            }
            .into());
        }
        self.categories.push(category.clone());
        Ok(category.clone())
    }

    fn insert_vendor(&mut self, vendor: &NewVendor, created_at: DateTime<Utc>) -> Result<Vendor> {
        if self.vendors.iter().any(|v| v.slug == vendor.slug) {
            return Err(StoreError::Duplicate {
                kind: "Vendor",
                slug: vendor.slug.clone(),
            }
            .into());
        }
        let record = Vendor {
            id: uuid::Uuid::new_v4().to_string(),
            slug: vendor.slug.clone(),
            name: vendor.name.clone(),
            website: vendor.website.clone(),
            created_at,
        };
        self.vendors.push(record.clone());
        Ok(record)
    }

    fn insert_tool(&mut self, tool: &NewTool) -> Result<CatalogTool> {
        if self.tools.iter().any(|r| r.tool.slug == tool.slug) {
            return Err(StoreError::Duplicate {
                kind: "Tool",
                slug: tool.slug.clone(),
            }
            .into());
        }
        let vendor_name = match tool.vendor_slug.as_deref() {
            Some(slug) => Some(self.vendor_name(Some(slug)).ok_or_else(|| {
                StoreError::MissingReference {
                    kind: "Vendor",
                    slug: slug.to_string(),
                }
            })?),
            None => None,
        };
        let record = CatalogTool {
            id: uuid::Uuid::new_v4().to_string(),
            slug: tool.slug.clone(),
            name: tool.name.clone(),
            tagline: tool.tagline.clone(),
            vendor_name,
            status: tool.status,
            best_for_size_bands: tool.best_for_size_bands.clone(),
            categories: tool.categories.clone(),
            integrations: tool.integrations.clone(),
            last_verified_at: tool.last_verified_at,
        };
        self.tools.push(ToolRecord {
            tool: record.clone(),
            vendor_slug: tool.vendor_slug.clone(),
        });
        Ok(record)
    }
}

fn matches_filter(record: &ToolRecord, filter: &ToolFilter) -> bool {
    filter.status.is_none_or(|s| record.tool.status == s)
        && filter
            .category
            .as_deref()
            .is_none_or(|c| record.tool.in_category(c))
        && filter
            .vendor
            .as_deref()
            .is_none_or(|v| record.vendor_slug.as_deref() == Some(v))
}

#[async_trait]
impl PersistenceLayer for MemoryProvider {
    async fn find_published_tools(&self, limit: usize) -> Result<Vec<CatalogTool>> {
        self.find_tools(&ToolFilter {
            limit: Some(limit),
            ..ToolFilter::published()
        })
        .await
    }

    async fn find_tools(&self, filter: &ToolFilter) -> Result<Vec<CatalogTool>> {
        let state = self.read()?;
        Ok(state
            .tools
            .iter()
            .filter(|r| matches_filter(r, filter))
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|r| r.tool.clone())
            .collect())
    }

    async fn get_tool_by_slug(&self, slug: &str) -> Result<Option<CatalogTool>> {
        let state = self.read()?;
        Ok(state
            .tools
            .iter()
            .find(|r| r.tool.slug == slug)
            .map(|r| r.tool.clone()))
    }

    async fn create_tool(&self, tool: &NewTool) -> Result<CatalogTool> {
        self.write()?.insert_tool(tool)
    }

    async fn set_tool_status(
        &self,
        slug: &str,
        status: ToolStatus,
    ) -> Result<Option<CatalogTool>> {
        let mut state = self.write()?;
        Ok(state
            .tools
            .iter_mut()
            .find(|r| r.tool.slug == slug)
            .map(|r| {
                r.tool.status = status;
                r.tool.clone()
            }))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.read()?.categories.clone())
    }

    async fn create_category(&self, category: &Category) -> Result<Category> {
        self.write()?.insert_category(category)
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>> {
        Ok(self.read()?.vendors.clone())
    }

    async fn create_vendor(&self, vendor: &NewVendor) -> Result<Vendor> {
        self.write()?.insert_vendor(vendor, Utc::now())
    }

    async fn save_lead(&self, lead: &Lead) -> Result<()> {
        let mut state = self.write()?;
        match state.leads.iter_mut().find(|l| l.id == lead.id) {
            Some(existing) => *existing = lead.clone(),
            None => state.leads.push(lead.clone()),
        }
        Ok(())
    }

    async fn list_leads(&self, status: Option<LeadStatus>, limit: usize) -> Result<Vec<Lead>> {
        let state = self.read()?;
        let mut leads: Vec<Lead> = state
            .leads
            .iter()
            .filter(|l| status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        leads.truncate(limit);
        Ok(leads)
    }

    async fn update_lead_status(&self, id: &str, status: LeadStatus) -> Result<Option<Lead>> {
        let mut state = self.write()?;
        Ok(state.leads.iter_mut().find(|l| l.id == id).map(|l| {
            l.status = status;
            l.clone()
        }))
    }

    async fn save_submission(&self, submission: &RecommendationSubmission) -> Result<()> {
        self.write()?
            .submissions
            .insert(submission.id.clone(), submission.clone());
        Ok(())
    }

    async fn get_submission(&self, id: &str) -> Result<Option<RecommendationSubmission>> {
        Ok(self.read()?.submissions.get(id).cloned())
    }
}
