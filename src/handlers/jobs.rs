//! # Jobs API Handlers
//!
//! Transformation job registry, manual runs and execution history.

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dashboard::{ExecutionSummary, execution_summary};
use crate::error::{ApiError, validation_error};
use crate::handlers::{bounded_limit, query_error};
use crate::job_runner::{JobRunReport, JobRunner};
use crate::models::job_execution::JobExecutionResponse;
use crate::models::transformation_job::{TransformationJobResponse, TransformationType};
use crate::repositories::transformation_job::{JobCounts, NewTransformationJob};
use crate::repositories::{JobExecutionRepository, TransformationJobRepository};
use crate::schedule::SchedulePreset;
use crate::server::AppState;

const MAX_HISTORY_LIMIT: u64 = 1000;

fn default_active() -> bool {
    true
}

/// Request payload for registering a transformation job
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateJobRequest {
    #[schema(example = "Dedup Customers")]
    pub job_name: String,
    #[schema(example = "DB.SCH.CUSTOMERS")]
    pub source_table: String,
    #[schema(example = "DB.SCH.CUSTOMERS_CLEAN")]
    pub target_table: String,
    pub transformation_type: TransformationType,
    /// Shape depends on `transformation_type`
    #[schema(value_type = Object, example = json!({"key_columns": ["EMAIL"]}))]
    pub transformation_config: JsonValue,
    /// Raw cron string; mutually exclusive with `schedule_preset`
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub schedule_preset: Option<SchedulePreset>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Response payload for the jobs listing
#[derive(Debug, Serialize, ToSchema)]
pub struct JobsResponse {
    /// Jobs, most recently created first
    pub jobs: Vec<TransformationJobResponse>,
    pub counts: JobCounts,
}

#[derive(Debug, Deserialize)]
pub struct ListExecutionsQuery {
    /// Only executions of this job
    pub job_id: Option<Uuid>,
    /// Maximum rows (default from configuration, max 1000)
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExecutionsResponse {
    /// Executions, newest first
    pub executions: Vec<JobExecutionResponse>,
    /// Rollup over the returned executions
    pub summary: ExecutionSummary,
}

/// Register a transformation job
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job registered", body = TransformationJobResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransformationJobResponse>), ApiError> {
    let Json(request) = payload?;

    let schedule = match (request.schedule, request.schedule_preset) {
        (Some(_), Some(_)) => {
            return Err(validation_error(
                "Conflicting schedule",
                serde_json::json!({
                    "schedule": "Provide either schedule or schedule_preset, not both"
                }),
            ));
        }
        (Some(cron), None) => Some(cron),
        (None, Some(preset)) => Some(preset.to_cron()?),
        (None, None) => None,
    };

    let job = TransformationJobRepository::new(&state.db)
        .create(NewTransformationJob {
            job_name: request.job_name,
            source_table: request.source_table,
            target_table: request.target_table,
            transformation_type: request.transformation_type,
            transformation_config: request.transformation_config,
            schedule,
            is_active: request.is_active,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(job.into())))
}

/// List registered jobs with registry counts
#[utoipa::path(
    get,
    path = "/jobs",
    responses(
        (status = 200, description = "Registered jobs", body = JobsResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<JobsResponse>, ApiError> {
    let repo = TransformationJobRepository::new(&state.db);
    let jobs = repo.list().await?;
    let counts = repo.counts().await?;

    Ok(Json(JobsResponse {
        jobs: jobs.into_iter().map(Into::into).collect(),
        counts,
    }))
}

#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job UUID")),
    responses(
        (status = 200, description = "Job definition", body = TransformationJobResponse),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<TransformationJobResponse>, ApiError> {
    let job = TransformationJobRepository::new(&state.db).get(job_id).await?;
    Ok(Json(job.into()))
}

/// Activate or deactivate a job; repeating the current state is a no-op
#[utoipa::path(
    post,
    path = "/jobs/{id}/active",
    params(("id" = Uuid, Path, description = "Job UUID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Job after the update", body = TransformationJobResponse),
        (status = 400, description = "Invalid body", body = ApiError),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn set_job_active(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<TransformationJobResponse>, ApiError> {
    let Json(request) = payload?;
    let job = TransformationJobRepository::new(&state.db)
        .set_active(job_id, request.is_active)
        .await?;
    Ok(Json(job.into()))
}

/// Delete a job; its execution history is kept
#[utoipa::path(
    delete,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job UUID")),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    TransformationJobRepository::new(&state.db)
        .delete(job_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run a job once now
///
/// A failing run is still a 200: the execution comes back with status FAILED and
/// the platform's error message.
#[utoipa::path(
    post,
    path = "/jobs/{id}/run",
    params(("id" = Uuid, Path, description = "Job UUID")),
    responses(
        (status = 200, description = "Resolved execution", body = JobRunReport),
        (status = 404, description = "Job not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn run_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRunReport>, ApiError> {
    let report = JobRunner::new(&state.db, state.procedures.as_ref())
        .run(job_id)
        .await?;
    Ok(Json(report))
}

/// Execution history with a summary
#[utoipa::path(
    get,
    path = "/executions",
    params(
        ("job_id" = Option<Uuid>, Query, description = "Only executions of this job"),
        ("limit" = Option<u64>, Query, description = "Maximum rows (default 100, max 1000)")
    ),
    responses(
        (status = 200, description = "Execution history", body = ExecutionsResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn list_executions(
    State(state): State<AppState>,
    query: Result<Query<ListExecutionsQuery>, QueryRejection>,
) -> Result<Json<ExecutionsResponse>, ApiError> {
    let Query(query) = query.map_err(query_error)?;
    let limit = bounded_limit(
        query.limit,
        state.config.dashboard.history_limit,
        MAX_HISTORY_LIMIT,
    )?;
    let executions_repo = JobExecutionRepository::new(&state.db);

    let rows = match query.job_id {
        Some(job_id) => {
            let job_name = TransformationJobRepository::new(&state.db)
                .find(job_id)
                .await?
                .map(|job| job.job_name);
            executions_repo
                .list_for_job(job_id, limit)
                .await?
                .into_iter()
                .map(|execution| (execution, job_name.clone()))
                .collect()
        }
        None => executions_repo
            .list_recent(limit)
            .await?
            .into_iter()
            .map(|(execution, job)| (execution, job.map(|job| job.job_name)))
            .collect::<Vec<_>>(),
    };

    let models: Vec<_> = rows.iter().map(|(execution, _)| execution.clone()).collect();
    let summary = execution_summary(&models);

    Ok(Json(ExecutionsResponse {
        executions: rows
            .into_iter()
            .map(|(execution, job_name)| JobExecutionResponse::new(execution, job_name))
            .collect(),
        summary,
    }))
}
