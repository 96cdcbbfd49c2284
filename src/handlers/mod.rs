//! # API Handlers
//!
//! HTTP endpoints of the DataFlow control plane, one module per page of the
//! operator UI.

use axum::{
    extract::{State, rejection::QueryRejection},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db;
use crate::error::{ApiError, validation_error};
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod catalog;
pub mod dashboard;
pub mod jobs;
pub mod profiles;
pub mod quality;
pub mod transformations;

/// Health probe response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub database: String,
}

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness plus a round trip to the metadata store
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    db::health_check(&state.db).await.map_err(|err| {
        tracing::warn!(error = %err, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database service unavailable",
        )
    })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        database: "ok".to_string(),
    }))
}

/// Map a malformed query string onto the standard validation body.
pub(crate) fn query_error(rejection: QueryRejection) -> ApiError {
    validation_error(
        "Invalid query parameters",
        serde_json::json!({ "query": rejection.body_text() }),
    )
}

/// Accept `limit` in `1..=max`, falling back to `default` when absent.
pub(crate) fn bounded_limit(limit: Option<u64>, default: u64, max: u64) -> Result<u64, ApiError> {
    match limit {
        None => Ok(default),
        Some(0) => Err(validation_error(
            "Invalid limit",
            serde_json::json!({ "limit": "Minimum allowed limit is 1" }),
        )),
        Some(value) if value > max => Err(validation_error(
            "Invalid limit",
            serde_json::json!({ "limit": format!("Maximum allowed limit is {}", max) }),
        )),
        Some(value) => Ok(value),
    }
}
