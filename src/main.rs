//! HR tool shortlist server
//!
//! Loads layered configuration, installs telemetry and serves the API.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use hr_shortlist::{config::AppConfig, server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before config so env overrides apply
    let _ = dotenv();

    let config = AppConfig::load()?;
    let metrics = telemetry::init(&config.telemetry)?;

    tracing::info!(
        name: "config.loaded",
        provider = %config.persistence.provider,
        port = config.server.port,
        jwt_required = config.security.jwt_required,
        "Configuration loaded"
    );

    server::start_server(Arc::new(config), metrics).await
}
