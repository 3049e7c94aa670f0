//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

/// Names the service alongside the liveness flag so fleet dashboards can
/// tell marketplace-core instances apart from their neighbors.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET /health — liveness check.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
