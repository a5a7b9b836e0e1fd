//! Per-client-IP rate limiting.
//!
//! Each limiter is a `governor` keyed token bucket. The client IP is resolved
//! with `tower_governor`'s [`SmartIpKeyExtractor`], which reads
//! `X-Forwarded-For`, `X-Real-IP` and `Forwarded` before falling back to the
//! peer address. Requests whose IP cannot be resolved share one bucket.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, RateLimiter};
use tower_governor::key_extractor::{KeyExtractor, SmartIpKeyExtractor};
use tracing::warn;

use classhero_config::RateLimitConfig;
use classhero_core::AppError;

use crate::state::AppState;

type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// The limiters shared by all requests.
#[derive(Clone)]
pub struct RateLimiters {
    pub general: Arc<IpRateLimiter>,
    pub auth: Arc<IpRateLimiter>,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: Arc::new(RateLimiter::keyed(config.general_quota())),
            auth: Arc::new(RateLimiter::keyed(config.auth_quota())),
        }
    }

    /// Drops buckets that have refilled completely.
    pub fn retain_recent(&self) {
        self.general.retain_recent();
        self.auth.retain_recent();
    }
}

fn client_ip(req: &Request) -> IpAddr {
    SmartIpKeyExtractor
        .extract(req)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn check(limiter: &IpRateLimiter, req: &Request, scope: &'static str) -> Result<(), AppError> {
    let ip = client_ip(req);

    limiter.check_key(&ip).map_err(|_| {
        warn!(client_ip = %ip, scope, path = %req.uri().path(), "Rate limit exceeded");
        crate::metrics::track_rate_limited(scope);
        AppError::too_many_requests()
    })
}

pub async fn general_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match check(&state.rate_limiters.general, &req, "general") {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

pub async fn auth_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match check(&state.rate_limiters.auth, &req, "auth") {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}
