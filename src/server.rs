use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::{Method, StatusCode, header},
    middleware::{Next, from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::api;
use crate::config::AppConfig;
use crate::persistence::providers;
use crate::security::{middleware::admin_auth_middleware, rate_limit::rate_limit_middleware};

/// How often idle rate-limiter buckets are dropped.
const RATE_LIMIT_HOUSEKEEPING: Duration = Duration::from_secs(60);

/// Start the Axum server with the provided configuration.
pub async fn start_server(
    config: Arc<AppConfig>,
    metrics: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    config.validate()?;

    let persistence = providers::connect(&config.persistence).await?;
    info!(
        name: "persistence.ready",
        provider = %config.persistence.provider,
        "Persistence initialized"
    );

    let state = AppState::new(Arc::clone(&config), persistence, metrics);

    let limiter = Arc::clone(&state.rate_limiter);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_HOUSEKEEPING);
        loop {
            interval.tick().await;
            limiter.housekeep();
        }
    });

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

/// Assemble every route and layer around `state`.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let rate_limit = from_fn_with_state(state.clone(), rate_limit_middleware);

    let api_routes = api::catalog::build_router()
        .merge(api::recommendations::build_router())
        .merge(api::leads::build_router().route_layer(rate_limit.clone()));

    let admin_routes = api::admin::build_router()
        .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(render_metrics))
        .route("/sitemap.xml", get(api::sitemap::sitemap))
        .merge(api::recommendations::build_form_router().route_layer(rate_limit))
        .nest("/api/admin", admin_routes)
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&config.site.static_dir));

    // The timeout layer is always installed; "disabled" means a duration
    // long enough never to fire, which keeps the router type the same.
    let timeout_duration = if config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60) // 1 year
    } else {
        Duration::from_secs(config.server.request_timeout_secs)
    };

    app.layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(from_fn(move |req: Request, next: Next| {
            let duration = timeout_duration;
            async move {
                match tokio::time::timeout(duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            }
        }))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(name: "server.shutdown", "Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// Operational Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /healthz - Liveness check.
async fn healthz() -> &'static str {
    "ok"
}

/// GET /metrics - Prometheus scrape endpoint.
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics disabled").into_response(),
    }
}
