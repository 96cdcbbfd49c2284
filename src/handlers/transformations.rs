//! # Ad-hoc Transformation Handler

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::transformation_job::{TransformationConfig, TransformationType};
use crate::procedures::StatusMessage;
use crate::server::AppState;
use crate::transformations;

/// Request payload for a one-shot transformation
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyTransformationRequest {
    #[schema(example = "DB.SCH.CUSTOMERS")]
    pub source_table: String,
    #[schema(example = "DB.SCH.CUSTOMERS_UPPER")]
    pub target_table: String,
    pub transformation_type: TransformationType,
    #[schema(value_type = Object, example = json!({"column_name": "EMAIL", "operation": "LOWERCASE"}))]
    pub transformation_config: JsonValue,
}

/// Apply a transformation once without registering a job
#[utoipa::path(
    post,
    path = "/transformations",
    request_body = ApplyTransformationRequest,
    responses(
        (status = 200, description = "Platform status message", body = StatusMessage),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 502, description = "Platform procedure failed", body = ApiError)
    ),
    tag = "transformations"
)]
pub async fn apply_transformation(
    State(state): State<AppState>,
    payload: Result<Json<ApplyTransformationRequest>, JsonRejection>,
) -> Result<Json<StatusMessage>, ApiError> {
    let Json(request) = payload?;
    let config =
        TransformationConfig::parse(&request.transformation_type, &request.transformation_config)?;

    let status = transformations::apply(
        state.procedures.as_ref(),
        request.source_table.trim(),
        request.target_table.trim(),
        &config,
    )
    .await?;
    Ok(Json(status))
}
