use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum_test::TestServer;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

use hr_shortlist::AppState;
use hr_shortlist::config::{
    AppConfig, PersistenceConfig, ResilienceConfig, SecurityConfig, ServerConfig, SiteConfig,
    TelemetryConfig,
};
use hr_shortlist::domain::catalog::{
    CatalogTool, Category, NewTool, NewVendor, ToolFilter, ToolStatus, Vendor,
};
use hr_shortlist::domain::lead::{Lead, LeadStatus};
use hr_shortlist::domain::recommendation::RecommendationSubmission;
use hr_shortlist::persistence::PersistenceLayer;
use hr_shortlist::persistence::providers::memory::{CatalogSeed, MemoryProvider};
use hr_shortlist::security::claims::AdminClaims;
use hr_shortlist::security::rate_limit::{KeyedRateLimiter, RateLimiter, Unlimited};
use hr_shortlist::server::build_router;

const SECRET: &str = "test-signing-secret";

fn test_config(jwt_required: bool) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            request_timeout_secs: 5,
            body_limit_bytes: 64 * 1024,
        },
        site: SiteConfig {
            base_url: "https://shortlist.example.in".to_string(),
            static_dir: "static".to_string(),
        },
        security: SecurityConfig {
            jwt_required,
            jwt_secret: SECRET.to_string(),
            admin_role: "admin".to_string(),
        },
        resilience: ResilienceConfig {
            rate_limit_enabled: false,
            timeout_disabled: false,
            lead_requests_per_minute: 5,
            lead_burst_size: 3,
        },
        persistence: PersistenceConfig {
            provider: "memory".to_string(),
            database_url: String::new(),
            seed_file: None,
            max_connections: 1,
        },
        telemetry: TelemetryConfig {
            log_format: "compact".to_string(),
            metrics_enabled: false,
        },
    }
}

fn tool(slug: &str, categories: &[&str]) -> NewTool {
    NewTool {
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        tagline: None,
        vendor_slug: None,
        status: ToolStatus::Published,
        best_for_size_bands: Vec::new(),
        categories: categories.iter().map(ToString::to_string).collect(),
        integrations: Vec::new(),
        last_verified_at: None,
    }
}

fn seed() -> CatalogSeed {
    let mut keka = tool("keka", &["payroll", "attendance"]);
    keka.vendor_slug = Some("keka-technologies".to_string());
    keka.integrations = vec!["tally".to_string()];

    let mut zoho = tool("zoho-people", &["attendance", "hrms"]);
    zoho.best_for_size_bands = vec!["LARGE".to_string()];

    let mut draft = tool("draft-payroll", &["payroll"]);
    draft.status = ToolStatus::Draft;

    CatalogSeed {
        categories: vec![Category {
            slug: "payroll".to_string(),
            name: "Payroll & Compliance".to_string(),
            description: None,
        }],
        vendors: vec![NewVendor {
            slug: "keka-technologies".to_string(),
            name: "Keka Technologies".to_string(),
            website: None,
        }],
        tools: vec![keka, zoho, draft, tool("greythr", &["payroll"])],
    }
}

struct Harness {
    server: TestServer,
    store: Arc<dyn PersistenceLayer>,
}

/// Memory store whose lead writes always fail.
#[derive(Debug)]
struct LeadsUnavailable(MemoryProvider);

#[async_trait]
impl PersistenceLayer for LeadsUnavailable {
    async fn find_published_tools(&self, limit: usize) -> anyhow::Result<Vec<CatalogTool>> {
        self.0.find_published_tools(limit).await
    }
    async fn find_tools(&self, filter: &ToolFilter) -> anyhow::Result<Vec<CatalogTool>> {
        self.0.find_tools(filter).await
    }
    async fn get_tool_by_slug(&self, slug: &str) -> anyhow::Result<Option<CatalogTool>> {
        self.0.get_tool_by_slug(slug).await
    }
    async fn create_tool(&self, tool: &NewTool) -> anyhow::Result<CatalogTool> {
        self.0.create_tool(tool).await
    }
    async fn set_tool_status(
        &self,
        slug: &str,
        status: ToolStatus,
    ) -> anyhow::Result<Option<CatalogTool>> {
        self.0.set_tool_status(slug, status).await
    }
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        self.0.list_categories().await
    }
    async fn create_category(&self, category: &Category) -> anyhow::Result<Category> {
        self.0.create_category(category).await
    }
    async fn list_vendors(&self) -> anyhow::Result<Vec<Vendor>> {
        self.0.list_vendors().await
    }
    async fn create_vendor(&self, vendor: &NewVendor) -> anyhow::Result<Vendor> {
        self.0.create_vendor(vendor).await
    }
    async fn save_lead(&self, _lead: &Lead) -> anyhow::Result<()> {
        anyhow::bail!("leads table unavailable")
    }
    async fn list_leads(
        &self,
        status: Option<LeadStatus>,
        limit: usize,
    ) -> anyhow::Result<Vec<Lead>> {
        self.0.list_leads(status, limit).await
    }
    async fn update_lead_status(
        &self,
        id: &str,
        status: LeadStatus,
    ) -> anyhow::Result<Option<Lead>> {
        self.0.update_lead_status(id, status).await
    }
    async fn save_submission(&self, submission: &RecommendationSubmission) -> anyhow::Result<()> {
        self.0.save_submission(submission).await
    }
    async fn get_submission(&self, id: &str) -> anyhow::Result<Option<RecommendationSubmission>> {
        self.0.get_submission(id).await
    }
}

fn harness_with(jwt_required: bool, limiter: Arc<dyn RateLimiter>) -> Harness {
    let store: Arc<dyn PersistenceLayer> = Arc::new(MemoryProvider::from_seed(seed()).unwrap());
    harness_on(store, jwt_required, limiter)
}

fn harness_on(
    store: Arc<dyn PersistenceLayer>,
    jwt_required: bool,
    limiter: Arc<dyn RateLimiter>,
) -> Harness {
    let state = AppState::with_rate_limiter(
        Arc::new(test_config(jwt_required)),
        Arc::clone(&store),
        limiter,
        None,
    );
    Harness {
        server: TestServer::new(build_router(state)).unwrap(),
        store,
    }
}

fn harness() -> Harness {
    harness_with(true, Arc::new(Unlimited))
}

fn bearer(roles: &[&str]) -> HeaderValue {
    let claims = AdminClaims {
        sub: "staff-1".to_string(),
        name: Some("Asha".to_string()),
        roles: Some(roles.iter().map(ToString::to_string).collect()),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

// =============================================================================
// Operational
// =============================================================================

#[tokio::test]
async fn test_healthz() {
    let h = harness();
    let response = h.server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn test_metrics_disabled_is_not_found() {
    let h = harness();
    h.server
        .get("/metrics")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sitemap_lists_published_catalog() {
    let h = harness();
    let response = h.server.get("/sitemap.xml").await;
    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("<loc>https://shortlist.example.in/tools/keka</loc>"));
    assert!(body.contains("<loc>https://shortlist.example.in/categories/payroll</loc>"));
    assert!(body.contains("<loc>https://shortlist.example.in/vendors/keka-technologies</loc>"));
    assert!(!body.contains("draft-payroll"));
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_hides_drafts() {
    let h = harness();
    let tools: Value = h.server.get("/api/tools").await.json();
    let slugs: Vec<&str> = tools
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["keka", "zoho-people", "greythr"]);

    h.server
        .get("/api/tools/draft-payroll")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let keka: Value = h.server.get("/api/tools/keka").await.json();
    assert_eq!(keka["vendorName"], "Keka Technologies");
}

#[tokio::test]
async fn test_catalog_filters_by_category() {
    let h = harness();
    let tools: Value = h.server.get("/api/tools?category=hrms").await.json();
    assert_eq!(tools.as_array().unwrap().len(), 1);
    assert_eq!(tools[0]["slug"], "zoho-people");
}

// =============================================================================
// Recommendations
// =============================================================================

#[tokio::test]
async fn test_recommendation_ranks_and_explains() {
    let h = harness();
    let response = h
        .server
        .post("/api/recommendations")
        .json(&json!({
            "sizeBand": "MID",
            "categoriesNeeded": ["payroll", "attendance"],
            "mustHaveIntegrations": []
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["criteria"]["sizeBand"], "MID");
    let tools = body["tools"].as_array().unwrap();
    let ranked: Vec<(&str, u64)> = tools
        .iter()
        .map(|t| (t["tool"]["slug"].as_str().unwrap(), t["score"].as_u64().unwrap()))
        .collect();
    // keka: 2 categories + size fit; greythr: 1 category + size fit;
    // zoho-people: 1 category, LARGE only.
    assert_eq!(ranked, vec![("keka", 13), ("greythr", 9), ("zoho-people", 4)]);
    assert_eq!(
        tools[0]["why"],
        json!([
            "Matches: Payroll & Compliance, Attendance & Leave.",
            "Good fit for 51–200 employee teams."
        ])
    );
    assert_eq!(tools[0]["matchedCategories"], json!(["payroll", "attendance"]));
}

#[tokio::test]
async fn test_recommendation_required_integration_filters() {
    let h = harness();
    let body: Value = h
        .server
        .post("/api/recommendations")
        .json(&json!({
            "sizeBand": "SMALL",
            "categoriesNeeded": ["payroll"],
            "mustHaveIntegrations": ["tally"]
        }))
        .await
        .json();
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["tool"]["slug"], "keka");
    assert_eq!(tools[0]["score"], 11);
}

#[tokio::test]
async fn test_recommendation_unknown_category_is_empty() {
    let h = harness();
    let body: Value = h
        .server
        .post("/api/recommendations")
        .json(&json!({
            "sizeBand": "SMALL",
            "categoriesNeeded": ["nonexistent-category"]
        }))
        .await
        .json();
    assert_eq!(body["tools"], json!([]));
}

#[tokio::test]
async fn test_recommendation_rejects_empty_categories() {
    let h = harness();
    h.server
        .post("/api/recommendations")
        .json(&json!({ "sizeBand": "SMALL", "categoriesNeeded": [" "] }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_questionnaire_form_redirects_to_stored_result() {
    let h = harness();
    let response = h
        .server
        .post("/recommend")
        .form(&[
            ("categories", "payroll"),
            ("integrations", "tally"),
            ("name", "Ravi Kumar"),
            ("email", "Ravi@Example.in"),
            ("utm_source", "linkedin"),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    let id = location.strip_prefix("/results/").unwrap();

    let result: Value = h.server.get(&format!("/api/results/{id}")).await.json();
    assert_eq!(result["id"], id);
    assert_eq!(result["criteria"]["sizeBand"], "SMALL");
    assert_eq!(result["tools"][0]["tool"]["slug"], "keka");
    assert!(result.get("contact").is_none());

    let leads = h.store.list_leads(None, 10).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].email, "ravi@example.in");
    assert_eq!(leads[0].submission_id.as_deref(), Some(id));
    assert_eq!(leads[0].utm.source.as_deref(), Some("linkedin"));
}

#[tokio::test]
async fn test_questionnaire_redirects_when_lead_store_fails() {
    let store: Arc<dyn PersistenceLayer> =
        Arc::new(LeadsUnavailable(MemoryProvider::from_seed(seed()).unwrap()));
    let h = harness_on(store, true, Arc::new(Unlimited));

    let response = h
        .server
        .post("/recommend")
        .form(&[
            ("size_band", "MID"),
            ("categories", "payroll"),
            ("name", "Kiran Rao"),
            ("email", "kiran@example.in"),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    let id = location.strip_prefix("/results/").unwrap();

    let stored = h.store.get_submission(id).await.unwrap().unwrap();
    let contact = stored.contact.expect("contact kept on the submission");
    assert_eq!(contact.email, "kiran@example.in");
    assert!(h.store.list_leads(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_result_is_not_found() {
    let h = harness();
    h.server
        .get("/api/results/does-not-exist")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// Leads
// =============================================================================

#[tokio::test]
async fn test_lead_capture_and_honeypot() {
    let h = harness();
    let response = h
        .server
        .post("/api/leads")
        .json(&json!({
            "name": "Priya Sharma",
            "email": "priya@example.in",
            "toolSlug": "keka",
            "utm": { "source": "google", "campaign": "payroll-q3" }
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["status"], "received");

    let bot = h
        .server
        .post("/api/leads")
        .json(&json!({
            "name": "Bot",
            "email": "bot@spam.example",
            "website": "http://spam.example"
        }))
        .await;
    bot.assert_status(StatusCode::CREATED);

    let leads = h.store.list_leads(None, 10).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].tool_slug.as_deref(), Some("keka"));
    assert_eq!(leads[0].utm.campaign.as_deref(), Some("payroll-q3"));
}

#[tokio::test]
async fn test_lead_validation() {
    let h = harness();
    h.server
        .post("/api/leads")
        .json(&json!({ "name": "No Email", "email": "not-an-address" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_lead_rate_limit_is_per_client() {
    let h = harness_with(true, Arc::new(KeyedRateLimiter::new(1, 2)));
    let lead = json!({ "name": "Asha", "email": "asha@example.in" });

    for _ in 0..2 {
        let (name, value) = forwarded_for("203.0.113.7");
        h.server
            .post("/api/leads")
            .add_header(name, value)
            .json(&lead)
            .await
            .assert_status(StatusCode::CREATED);
    }
    let (name, value) = forwarded_for("203.0.113.7");
    h.server
        .post("/api/leads")
        .add_header(name, value)
        .json(&lead)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    let (name, value) = forwarded_for("198.51.100.4");
    h.server
        .post("/api/leads")
        .add_header(name, value)
        .json(&lead)
        .await
        .assert_status(StatusCode::CREATED);

    // Catalog reads are not limited.
    let (name, value) = forwarded_for("203.0.113.7");
    h.server
        .get("/api/tools")
        .add_header(name, value)
        .await
        .assert_status_ok();
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_admin_requires_token() {
    let h = harness();
    h.server
        .get("/api/admin/leads")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    h.server
        .get("/api/admin/leads")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-jwt"),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    h.server
        .get("/api/admin/leads")
        .add_header(header::AUTHORIZATION, bearer(&["editor"]))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    h.server
        .get("/api/admin/leads")
        .add_header(header::AUTHORIZATION, bearer(&["admin"]))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_admin_open_when_tokens_not_required() {
    let h = harness_with(false, Arc::new(Unlimited));
    h.server.get("/api/admin/tools").await.assert_status_ok();
}

#[tokio::test]
async fn test_admin_tool_lifecycle() {
    let h = harness();
    let auth = bearer(&["admin"]);

    let created = h
        .server
        .post("/api/admin/tools")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({
            "slug": "razorpay-payroll",
            "name": "RazorpayX Payroll",
            "categories": ["payroll", "payroll"],
            "integrations": ["tally"]
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["status"], "DRAFT");
    assert_eq!(body["categories"], json!(["payroll"]));

    h.server
        .post("/api/admin/tools")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "slug": "razorpay-payroll", "name": "Again" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    h.server
        .post("/api/admin/tools")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "slug": "orphan", "name": "Orphan", "vendorSlug": "nobody" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    // Drafts never reach the shortlist.
    let criteria = json!({
        "sizeBand": "SMALL",
        "categoriesNeeded": ["payroll"],
        "mustHaveIntegrations": ["tally"]
    });
    let before: Value = h
        .server
        .post("/api/recommendations")
        .json(&criteria)
        .await
        .json();
    assert_eq!(before["tools"].as_array().unwrap().len(), 1);

    h.server
        .patch("/api/admin/tools/razorpay-payroll/status")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "status": "PUBLISHED" }))
        .await
        .assert_status_ok();

    let after: Value = h
        .server
        .post("/api/recommendations")
        .json(&criteria)
        .await
        .json();
    let slugs: Vec<&str> = after["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tool"]["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["keka", "razorpay-payroll"]);

    h.server
        .patch("/api/admin/tools/missing/status")
        .add_header(header::AUTHORIZATION, auth)
        .json(&json!({ "status": "PUBLISHED" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_lead_pipeline() {
    let h = harness();
    let auth = bearer(&["admin"]);

    let id = h
        .server
        .post("/api/leads")
        .json(&json!({ "name": "Meera", "email": "meera@example.in" }))
        .await
        .json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let updated: Value = h
        .server
        .patch(&format!("/api/admin/leads/{id}"))
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "status": "CONTACTED" }))
        .await
        .json();
    assert_eq!(updated["status"], "CONTACTED");

    let contacted: Value = h
        .server
        .get("/api/admin/leads?status=CONTACTED")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(contacted.as_array().unwrap().len(), 1);

    let fresh: Value = h
        .server
        .get("/api/admin/leads?status=NEW")
        .add_header(header::AUTHORIZATION, auth)
        .await
        .json();
    assert!(fresh.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_vendor_and_category_creation() {
    let h = harness();
    let auth = bearer(&["admin"]);

    h.server
        .post("/api/admin/vendors")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "slug": "greytip", "name": "Greytip Software" }))
        .await
        .assert_status(StatusCode::CREATED);

    h.server
        .post("/api/admin/categories")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "slug": "payroll", "name": "Payroll" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    h.server
        .post("/api/admin/categories")
        .add_header(header::AUTHORIZATION, auth)
        .json(&json!({ "slug": "Not A Slug", "name": "Bad" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let vendors: Value = h.server.get("/api/vendors").await.json();
    assert_eq!(vendors.as_array().unwrap().len(), 2);
}
