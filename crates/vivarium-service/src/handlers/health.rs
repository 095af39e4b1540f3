//! Health and version handlers.

use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "vivarium".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Version/build metadata response.
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Routable endpoints.
    pub endpoints: Vec<&'static str>,
}

/// Version endpoint: build metadata and the routable surface.
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "vivarium".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec![
            "POST /webhook/catalog",
            "POST /webhook/checkout-completed",
            "GET /catalog",
            "GET /catalog/{id}",
            "GET /catalog/{id}/status",
            "GET /users/{id}/collection",
            "GET /version",
            "GET /health",
        ],
    })
}
