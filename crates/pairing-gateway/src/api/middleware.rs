//! Rate limiting and request logging middleware.

use crate::error::GatewayError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc};
use tracing::{debug, warn};

/// Global rate limiter. Pairing is a user-initiated, one-at-a-time action;
/// a single unkeyed quota is enough to keep bridge sessions bounded.
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct RateLimitState {
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    pub fn new(requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::new(10).unwrap()),
        );

        Self {
            global: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Permissive limiter for tests.
    pub fn permissive() -> Self {
        Self::new(1000)
    }
}

/// Reject requests past the global quota with 429.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if rate_limit.global.check().is_err() {
        warn!("Global rate limit exceeded");
        return Err(GatewayError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Log every request with its status and duration.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}
