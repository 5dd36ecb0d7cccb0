// handlers/public/mod.rs - Public handlers (no authentication required)

use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

/// GET / - Service banner
pub async fn root() -> ApiResult<ServiceInfo> {
    Ok(ApiResponse::success(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        message: "API is running",
    }))
}

/// GET /health - Storage ping; 503 while the database is unreachable
pub async fn health(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    match state.store.health_check().await {
        Ok(()) => Ok(ApiResponse::success(HealthStatus {
            status: "ok",
            database: "connected",
        })),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("Database unavailable"))
        }
    }
}
