use std::fmt::Write as _;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;

use crate::AppState;
use crate::domain::catalog::ToolFilter;

use super::{ApiError, store_error};

/// Site pages that exist regardless of catalog contents.
const STATIC_PATHS: &[&str] = &["/", "/tools", "/categories", "/vendors", "/recommend", "/compare"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub path: String,
    pub last_modified: Option<NaiveDate>,
}

impl SitemapEntry {
    fn page(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            last_modified: None,
        }
    }
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a sitemaps.org `urlset` with absolute URLs under `base_url`.
pub fn render_sitemap(base_url: &str, entries: &[SitemapEntry]) -> String {
    let base = base_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", xml_escape(&format!("{base}{}", entry.path)));
        if let Some(date) = entry.last_modified {
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", date.format("%Y-%m-%d"));
        }
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<AppState>) -> Result<Response, ApiError> {
    let tools = state
        .persistence
        .find_tools(&ToolFilter::published())
        .await
        .map_err(|e| store_error(&e))?;
    let categories = state
        .persistence
        .list_categories()
        .await
        .map_err(|e| store_error(&e))?;
    let vendors = state
        .persistence
        .list_vendors()
        .await
        .map_err(|e| store_error(&e))?;

    let mut entries: Vec<SitemapEntry> = STATIC_PATHS.iter().map(|p| SitemapEntry::page(*p)).collect();
    entries.extend(tools.iter().map(|t| SitemapEntry {
        path: format!("/tools/{}", t.slug),
        last_modified: t.last_verified_at.map(|ts| ts.date_naive()),
    }));
    entries.extend(
        categories
            .iter()
            .map(|c| SitemapEntry::page(format!("/categories/{}", c.slug))),
    );
    entries.extend(
        vendors
            .iter()
            .map(|v| SitemapEntry::page(format!("/vendors/{}", v.slug))),
    );

    let body = render_sitemap(&state.config.site.base_url, &entries);
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body).into_response())
}
