use crate::AppState;
use crate::config::ResilienceConfig;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota};
use nonzero_ext::nonzero;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Per-client admission control, injected through [`AppState`] so each
/// deployment (or test) can pick its own implementation.
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
    /// `true` if the request identified by `key` may proceed.
    fn check(&self, key: &str) -> bool;

    /// Drop state for keys that have fully recovered.
    fn housekeep(&self) {}
}

/// Token bucket per client key, backed by `governor`.
pub struct KeyedRateLimiter {
    inner: DefaultKeyedRateLimiter<String>,
    per_minute: NonZeroU32,
    burst: NonZeroU32,
}

impl KeyedRateLimiter {
    pub fn new(requests_per_minute: u32, burst_size: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(nonzero!(1u32));
        let burst = NonZeroU32::new(burst_size).unwrap_or(nonzero!(1u32));
        let quota = Quota::per_minute(per_minute).allow_burst(burst);
        Self {
            inner: governor::RateLimiter::keyed(quota),
            per_minute,
            burst,
        }
    }
}

impl std::fmt::Debug for KeyedRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedRateLimiter")
            .field("per_minute", &self.per_minute)
            .field("burst", &self.burst)
            .field("tracked_keys", &self.inner.len())
            .finish()
    }
}

impl RateLimiter for KeyedRateLimiter {
    fn check(&self, key: &str) -> bool {
        self.inner.check_key(&key.to_string()).is_ok()
    }

    fn housekeep(&self) {
        self.inner.retain_recent();
        self.inner.shrink_to_fit();
    }
}

/// Admits everything. Used when `resilience.rate_limit_enabled` is false.
#[derive(Debug, Default)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn check(&self, _key: &str) -> bool {
        true
    }
}

/// Limiter matching the resilience configuration.
pub fn from_config(config: &ResilienceConfig) -> Arc<dyn RateLimiter> {
    if config.rate_limit_enabled {
        Arc::new(KeyedRateLimiter::new(
            config.lead_requests_per_minute,
            config.lead_burst_size,
        ))
    } else {
        Arc::new(Unlimited)
    }
}

/// Client identity for rate limiting: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(String::from)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware to enforce rate limits on lead capture routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer);

    if !state.rate_limiter.check(&key) {
        metrics::counter!("shortlist_rate_limited_total").increment(1);
        tracing::warn!(name: "rate_limit.rejected", client = %key, path = %req.uri().path(), "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(req).await)
}
