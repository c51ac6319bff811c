//! Liveness probe.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Health status
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    /// Always "UP" while the process serves requests
    pub status: String,
}

/// Health check. Never touches the cluster.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthStatus),
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "UP".to_string(),
    })
}
