//! Buyer criteria for a recommendation request.

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Coarse employee-headcount bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizeBand {
    Small,
    Mid,
    Large,
}

impl SizeBand {
    pub const ALL: [SizeBand; 3] = [Self::Small, Self::Mid, Self::Large];

    /// Identifier as stored in the catalog's `bestForSizeBands`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "SMALL",
            Self::Mid => "MID",
            Self::Large => "LARGE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|band| band.as_str() == upper)
    }
}

impl std::fmt::Display for SizeBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the buyer is looking for. Immutable for the duration of a scoring call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerCriteria {
    pub size_band: SizeBand,
    pub categories_needed: Vec<String>,
    #[serde(default)]
    pub must_have_integrations: Vec<String>,
}

impl BuyerCriteria {
    /// Build validated criteria.
    ///
    /// Entries are trimmed, blanks dropped and duplicates removed keeping the
    /// first occurrence. At least one category is required.
    pub fn new<C, I>(
        size_band: SizeBand,
        categories_needed: C,
        must_have_integrations: I,
    ) -> Result<Self, ValidationError>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let categories_needed = normalize_ids(categories_needed);
        if categories_needed.is_empty() {
            return Err(ValidationError::EmptyList("categoriesNeeded"));
        }
        Ok(Self {
            size_band,
            categories_needed,
            must_have_integrations: normalize_ids(must_have_integrations),
        })
    }

    /// Re-run normalization on criteria that arrived through deserialization.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Self::new(
            self.size_band,
            self.categories_needed,
            self.must_have_integrations,
        )
    }

    pub fn needs_category(&self, category: &str) -> bool {
        self.categories_needed.iter().any(|c| c == category)
    }
}

/// Trim, drop blanks, dedupe in first-seen order.
pub fn normalize_ids<T>(ids: T) -> Vec<String>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for id in ids {
        let id = id.as_ref().trim();
        if !id.is_empty() && !out.iter().any(|existing| existing == id) {
            out.push(id.to_string());
        }
    }
    out
}

/// Split a comma-separated form field into identifiers.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
