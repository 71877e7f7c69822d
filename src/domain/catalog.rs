//! Catalog records: tools, vendors and categories.
//!
//! The catalog is owned by the store. The scorer only ever reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criteria::normalize_ids;
use super::validation::{ValidationError, optional_text, required_text};

/// Publication state of a catalog tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolStatus {
    Published,
    #[default]
    Draft,
}

impl ToolStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Published => "PUBLISHED",
            Self::Draft => "DRAFT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PUBLISHED" => Some(Self::Published),
            "DRAFT" => Some(Self::Draft),
            _ => None,
        }
    }
}

/// A tool listing with its category, integration and vendor associations
/// already joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTool {
    pub id: String,
    /// Unique, URL-safe identifier.
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub status: ToolStatus,
    /// Raw size-band identifiers. Empty means the tool fits every band.
    #[serde(default)]
    pub best_for_size_bands: Vec<String>,
    /// Category identifiers in the tool's own order.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl CatalogTool {
    pub fn is_published(&self) -> bool {
        self.status == ToolStatus::Published
    }

    pub fn supports_integration(&self, integration: &str) -> bool {
        self.integrations.iter().any(|i| i == integration)
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// Payload for creating a tool from the admin API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTool {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    /// Slug of an existing vendor.
    #[serde(default)]
    pub vendor_slug: Option<String>,
    #[serde(default)]
    pub status: ToolStatus,
    #[serde(default)]
    pub best_for_size_bands: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl NewTool {
    /// Trim text fields, check the slug and dedupe every identifier list.
    ///
    /// Every write path (admin API and catalog seeds) goes through this, so
    /// stored tools never carry a category, integration or size band twice.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let slug = required_text("slug", &self.slug, 80)?;
        if !is_valid_slug(&slug) {
            return Err(ValidationError::invalid(
                "slug",
                "use lowercase letters, digits and single dashes",
            ));
        }
        Ok(Self {
            slug,
            name: required_text("name", &self.name, 120)?,
            tagline: optional_text("tagline", self.tagline.as_deref(), 240)?,
            vendor_slug: optional_text("vendorSlug", self.vendor_slug.as_deref(), 80)?,
            status: self.status,
            best_for_size_bands: normalize_ids(self.best_for_size_bands),
            categories: normalize_ids(self.categories),
            integrations: normalize_ids(self.integrations),
            last_verified_at: self.last_verified_at,
        })
    }
}

/// Query options for listing tools.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolFilter {
    #[serde(default)]
    pub status: Option<ToolStatus>,
    #[serde(default)]
    pub category: Option<String>,
    /// Vendor slug.
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ToolFilter {
    pub fn published() -> Self {
        Self {
            status: Some(ToolStatus::Published),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVendor {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
}

/// Functional classification of HR software (payroll, attendance, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Lowercase ASCII letters, digits and single dashes, no leading/trailing dash.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
