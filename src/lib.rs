//! HR tool shortlist service
//!
//! Backend for an HR-software discovery site aimed at Indian SMEs: catalog
//! reads, a recommendation questionnaire that ranks tools against buyer
//! criteria, lead capture with campaign attribution, and a staff admin API.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server with trace, timeout and body-limit layers
//! - **Engine**: pure filter / score / rank over a catalog snapshot
//! - **Persistence**: trait-based store with memory and Postgres providers
//! - **Security**: JWT-guarded admin routes, injected per-client rate limiter
//!
//! # Modules
//!
//! - [`recommendations`]: shortlist engine and the service around it
//! - [`domain`]: catalog, criteria, lead and result types
//! - [`persistence`]: storage trait and providers
//! - [`api`]: HTTP handlers
//! - [`config`]: layered configuration

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod recommendations;
pub mod security;
pub mod server;
pub mod telemetry;

use crate::config::AppConfig;
use crate::security::rate_limit::RateLimiter;

use metrics_exporter_prometheus::PrometheusHandle;
use persistence::PersistenceLayer;
use recommendations::RecommendationService;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Catalog, lead and submission store.
    pub persistence: Arc<dyn PersistenceLayer>,
    /// Shortlist engine bound to the store.
    pub recommendations: Arc<RecommendationService>,
    /// Lead-capture rate limiter
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
    /// Prometheus scrape handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the default services around a store.
    pub fn new(
        config: Arc<AppConfig>,
        persistence: Arc<dyn PersistenceLayer>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let rate_limiter = security::rate_limit::from_config(&config.resilience);
        Self::with_rate_limiter(config, persistence, rate_limiter, metrics)
    }

    /// Like [`AppState::new`] with a caller-supplied rate limiter.
    pub fn with_rate_limiter(
        config: Arc<AppConfig>,
        persistence: Arc<dyn PersistenceLayer>,
        rate_limiter: Arc<dyn RateLimiter>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            recommendations: Arc::new(RecommendationService::new(Arc::clone(&persistence))),
            persistence,
            rate_limiter,
            config,
            metrics,
        }
    }
}
