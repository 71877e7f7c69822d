//! Leads captured from the marketing site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criteria::SizeBand;
use super::validation::{ValidationError, optional_text, required_text};

const MAX_NAME: usize = 120;
const MAX_EMAIL: usize = 254;
const MAX_PHONE: usize = 32;
const MAX_COMPANY: usize = 160;
const MAX_MESSAGE: usize = 2000;
const MAX_UTM: usize = 200;

/// Sales pipeline state of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Closed,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Contacted => "CONTACTED",
            Self::Qualified => "QUALIFIED",
            Self::Closed => "CLOSED",
        }
    }
}

/// Campaign attribution carried from landing-page query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl UtmParams {
    /// Trim every field and drop blanks.
    pub fn sanitized(self) -> Result<Self, ValidationError> {
        Ok(Self {
            source: optional_text("utm.source", self.source.as_deref(), MAX_UTM)?,
            medium: optional_text("utm.medium", self.medium.as_deref(), MAX_UTM)?,
            campaign: optional_text("utm.campaign", self.campaign.as_deref(), MAX_UTM)?,
            term: optional_text("utm.term", self.term.as_deref(), MAX_UTM)?,
            content: optional_text("utm.content", self.content.as_deref(), MAX_UTM)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub company_size: Option<SizeBand>,
    #[serde(default)]
    pub message: Option<String>,
    /// Tool page the lead was captured on, if any.
    #[serde(default)]
    pub tool_slug: Option<String>,
    /// Questionnaire submission this lead came from, if any.
    #[serde(default)]
    pub submission_id: Option<String>,
    #[serde(default)]
    pub utm: UtmParams,
    #[serde(default)]
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
}

/// Unvalidated lead as posted by the site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub company_size: Option<SizeBand>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tool_slug: Option<String>,
    #[serde(default)]
    pub utm: UtmParams,
    /// Honeypot. Real browsers leave it empty.
    #[serde(default)]
    pub website: Option<String>,
}

impl NewLead {
    pub fn is_spam(&self) -> bool {
        self.website.as_deref().is_some_and(|w| !w.trim().is_empty())
    }

    pub fn into_lead(self) -> Result<Lead, ValidationError> {
        let email = required_text("email", &self.email, MAX_EMAIL)?.to_ascii_lowercase();
        validate_email(&email)?;
        let phone = optional_text("phone", self.phone.as_deref(), MAX_PHONE)?;
        if let Some(phone) = &phone {
            validate_phone(phone)?;
        }

        Ok(Lead {
            id: uuid::Uuid::new_v4().to_string(),
            name: required_text("name", &self.name, MAX_NAME)?,
            email,
            phone,
            company: optional_text("company", self.company.as_deref(), MAX_COMPANY)?,
            company_size: self.company_size,
            message: optional_text("message", self.message.as_deref(), MAX_MESSAGE)?,
            tool_slug: optional_text("toolSlug", self.tool_slug.as_deref(), MAX_COMPANY)?,
            submission_id: None,
            utm: self.utm.sanitized()?,
            status: LeadStatus::New,
            created_at: Utc::now(),
        })
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::invalid("email", "must contain '@'"));
    };
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(ValidationError::invalid("email", "malformed address"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::invalid("email", "domain must contain a dot"));
    }
    Ok(())
}

/// Digits with optional `+`, spaces and dashes; 10 to 15 digits.
fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'))
    {
        return Err(ValidationError::invalid("phone", "unexpected characters"));
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(10..=15).contains(&digits) {
        return Err(ValidationError::invalid("phone", "expected 10 to 15 digits"));
    }
    Ok(())
}
