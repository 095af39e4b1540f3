//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{catalog, health, users, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for the query endpoints. The game client
/// polls catalog and collection state, so these see the bulk of traffic.
const QUERY_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public queries
/// - `GET /catalog` - Full product list
/// - `GET /catalog/:id` - Single product
/// - `GET /catalog/:id/status` - Effective sale status
/// - `GET /users/:id/collection` - A user's purchase collection
/// - `GET /version` - Build metadata
/// - `GET /health` - Health check
///
/// ## Webhooks (signature verification)
/// - `POST /webhook/catalog` - Catalog sync events
/// - `POST /webhook/checkout-completed` - Purchase fulfillment events
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Concurrency-limited query routes
    let query_routes = Router::new()
        .route("/catalog", get(catalog::list_products))
        .route("/catalog/:id", get(catalog::get_product))
        .route("/catalog/:id/status", get(catalog::get_product_status))
        .route("/users/:id/collection", get(users::get_collection))
        .layer(ConcurrencyLimitLayer::new(QUERY_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .merge(query_routes)
        // Health and version (public, no limit)
        .route("/version", get(health::version))
        .route("/health", get(health::health))
        // Webhooks (no rate limit - delivery cadence is controlled by the sender)
        .route("/webhook/catalog", post(webhooks::catalog_webhook))
        .route(
            "/webhook/checkout-completed",
            post(webhooks::checkout_webhook),
        )
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
