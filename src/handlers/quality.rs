//! # Quality API Handlers
//!
//! Check definitions, on-demand runs and the result history.

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dashboard::{QualitySummary, quality_summary};
use crate::error::ApiError;
use crate::handlers::{bounded_limit, query_error};
use crate::handlers::jobs::SetActiveRequest;
use crate::models::quality_check_config::{CheckType, QualityCheckResponse, Severity};
use crate::models::quality_check_result::{CheckStatus, QualityCheckResultResponse};
use crate::procedures::StatusMessage;
use crate::quality_runner::{QualityRunner, RunAllReport, TableRunReport};
use crate::repositories::quality_check::NewQualityCheck;
use crate::repositories::quality_check_result::ResultFilter;
use crate::repositories::{QualityCheckRepository, QualityCheckResultRepository};
use crate::server::AppState;

const MAX_RESULTS_LIMIT: u64 = 1000;

fn default_active() -> bool {
    true
}

/// Request payload for defining a quality check
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCheckRequest {
    #[schema(example = "Age in range")]
    pub check_name: String,
    #[schema(example = "DB.SCH.CUSTOMERS")]
    pub table_name: String,
    /// Column under test; empty means table-level
    #[serde(default)]
    #[schema(example = "AGE")]
    pub column_name: Option<String>,
    pub check_type: CheckType,
    /// `{min_value, max_value}` for RANGE_CHECK, `{pattern}` for PATTERN_CHECK
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"min_value": 0, "max_value": 100}))]
    pub check_parameters: JsonValue,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RunQualityRequest {
    #[schema(example = "DB.SCH.CUSTOMERS")]
    pub table_name: String,
    /// Hand the whole table to the platform's bulk procedure instead of
    /// evaluating checks one by one
    #[serde(default)]
    pub delegate: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RunQualityResponse {
    Evaluated(TableRunReport),
    Delegated(StatusMessage),
}

#[derive(Debug, Default, Deserialize)]
pub struct ListResultsQuery {
    pub status: Option<CheckStatus>,
    pub table_name: Option<String>,
    pub severity: Option<Severity>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    /// Results, newest first
    pub results: Vec<QualityCheckResultResponse>,
    /// Rollup over the returned results
    pub summary: QualitySummary,
}

#[utoipa::path(
    post,
    path = "/quality/checks",
    request_body = CreateCheckRequest,
    responses(
        (status = 201, description = "Check defined", body = QualityCheckResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "quality"
)]
pub async fn create_check(
    State(state): State<AppState>,
    payload: Result<Json<CreateCheckRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QualityCheckResponse>), ApiError> {
    let Json(request) = payload?;

    let check = QualityCheckRepository::new(&state.db)
        .create(NewQualityCheck {
            check_name: request.check_name,
            table_name: request.table_name,
            column_name: request.column_name,
            check_type: request.check_type,
            check_parameters: request.check_parameters,
            severity: request.severity,
            is_active: request.is_active,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(check.into())))
}

#[utoipa::path(
    get,
    path = "/quality/checks",
    responses(
        (status = 200, description = "Check definitions, newest first", body = [QualityCheckResponse]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "quality"
)]
pub async fn list_checks(
    State(state): State<AppState>,
) -> Result<Json<Vec<QualityCheckResponse>>, ApiError> {
    let checks = QualityCheckRepository::new(&state.db).list().await?;
    Ok(Json(checks.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/quality/checks/{id}/active",
    params(("id" = Uuid, Path, description = "Check UUID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Check after the update", body = QualityCheckResponse),
        (status = 404, description = "Check not found", body = ApiError)
    ),
    tag = "quality"
)]
pub async fn set_check_active(
    State(state): State<AppState>,
    Path(check_id): Path<Uuid>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<QualityCheckResponse>, ApiError> {
    let Json(request) = payload?;
    let check = QualityCheckRepository::new(&state.db)
        .set_active(check_id, request.is_active)
        .await?;
    Ok(Json(check.into()))
}

#[utoipa::path(
    delete,
    path = "/quality/checks/{id}",
    params(("id" = Uuid, Path, description = "Check UUID")),
    responses(
        (status = 204, description = "Check deleted"),
        (status = 404, description = "Check not found", body = ApiError)
    ),
    tag = "quality"
)]
pub async fn delete_check(
    State(state): State<AppState>,
    Path(check_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    QualityCheckRepository::new(&state.db)
        .delete(check_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run the active checks of one table
#[utoipa::path(
    post,
    path = "/quality/run",
    request_body = RunQualityRequest,
    responses(
        (status = 200, description = "Per-check results and failures, or the platform's status message when delegated", body = RunQualityResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 502, description = "Delegated run failed", body = ApiError)
    ),
    tag = "quality"
)]
pub async fn run_checks(
    State(state): State<AppState>,
    payload: Result<Json<RunQualityRequest>, JsonRejection>,
) -> Result<Json<RunQualityResponse>, ApiError> {
    let Json(request) = payload?;
    let runner = QualityRunner::new(&state.db, state.procedures.as_ref());
    let table_name = request.table_name.trim();

    let response = if request.delegate {
        RunQualityResponse::Delegated(runner.delegate_table(table_name).await?)
    } else {
        RunQualityResponse::Evaluated(runner.run_for_table(table_name).await?)
    };
    Ok(Json(response))
}

/// Run every table that has active checks
#[utoipa::path(
    post,
    path = "/quality/run-all",
    responses(
        (status = 200, description = "Per-table reports", body = RunAllReport),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "quality"
)]
pub async fn run_all_checks(State(state): State<AppState>) -> Result<Json<RunAllReport>, ApiError> {
    let report = QualityRunner::new(&state.db, state.procedures.as_ref())
        .run_all_active()
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/quality/results",
    params(
        ("status" = Option<CheckStatus>, Query, description = "Filter by result status"),
        ("table_name" = Option<String>, Query, description = "Filter by table"),
        ("severity" = Option<Severity>, Query, description = "Filter by check severity"),
        ("limit" = Option<u64>, Query, description = "Maximum rows (default 100, max 1000)")
    ),
    responses(
        (status = 200, description = "Result history", body = ResultsResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "quality"
)]
pub async fn list_results(
    State(state): State<AppState>,
    query: Result<Query<ListResultsQuery>, QueryRejection>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let Query(query) = query.map_err(query_error)?;
    let limit = bounded_limit(
        query.limit,
        state.config.dashboard.history_limit,
        MAX_RESULTS_LIMIT,
    )?;

    let rows = QualityCheckResultRepository::new(&state.db)
        .list_recent(ResultFilter {
            status: query.status,
            table_name: query
                .table_name
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            severity: query.severity,
            limit,
        })
        .await?;

    let models: Vec<_> = rows.iter().map(|(result, _)| result.clone()).collect();
    let summary = quality_summary(&models);

    Ok(Json(ResultsResponse {
        results: rows
            .into_iter()
            .map(|(result, check)| QualityCheckResultResponse::new(result, check))
            .collect(),
        summary,
    }))
}
