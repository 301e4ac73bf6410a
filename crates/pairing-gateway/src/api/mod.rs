//! HTTP API for the pairing gateway.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::pairing::PairingSettings;
use crate::session::SessionStore;
use axum::{middleware as axum_middleware, routing::get, Router};
use mdproto_client::Connector;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Per-number session storage
    pub store: Arc<SessionStore>,
    /// Protocol bridge connector
    pub connector: Arc<dyn Connector>,
    /// Orchestrator knobs
    pub pairing: PairingSettings,
}

impl AppState {
    pub fn new(
        store: SessionStore,
        connector: Arc<dyn Connector>,
        pairing: PairingSettings,
    ) -> Self {
        Self {
            store: Arc::new(store),
            connector,
            pairing,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(10))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/", get(handlers::pair))
        .route("/health", get(handlers::health))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit.clone(),
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
