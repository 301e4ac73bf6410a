//! Pairing Gateway - Entry point.

use mdproto_client::HttpConnector;
use pairing_gateway::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::Config,
    faults::install_fault_hook,
    session::SessionStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pairing Gateway");

    // Suppress known-benign transport faults process-wide
    install_fault_hook();

    // Session storage
    let store = SessionStore::new(config.storage.root.clone());

    // Protocol bridge connector
    let connector =
        match HttpConnector::new(&config.bridge.api_url, config.bridge.request_timeout) {
            Ok(c) => c.with_events_poll_interval(config.bridge.events_poll_interval),
            Err(e) => {
                error!("Failed to create bridge connector: {}", e);
                std::process::exit(1);
            }
        };

    // Create application state
    let state = AppState::new(store, Arc::new(connector), config.pairing.settings());

    // Create rate limiter from config
    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);

    // Create router with rate limiting
    let app = create_router_with_rate_limit(state, rate_limit);

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
