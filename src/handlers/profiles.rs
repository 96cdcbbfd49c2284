//! # Profiling API Handlers

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, DomainError};
use crate::models::column_profile::{ColumnProfileResponse, ProfileSummary};
use crate::profiler::{self, DEFAULT_SAMPLE_SIZE, ProfileReport};
use crate::repositories::ColumnProfileRepository;
use crate::repositories::column_profile::ProfileStats;
use crate::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileRequest {
    #[schema(example = "DB.SCH.CUSTOMERS")]
    pub table_name: String,
    /// Rows sampled by the platform (10-500, default 100)
    #[serde(default)]
    #[schema(example = 100)]
    pub sample_size: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilesOverview {
    /// Tables with a stored profile, alphabetical
    pub tables: Vec<String>,
    pub stats: ProfileStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableProfileResponse {
    pub summary: ProfileSummary,
    /// Ordered by column name
    pub columns: Vec<ColumnProfileResponse>,
}

/// Profile a table, replacing its stored profile
#[utoipa::path(
    post,
    path = "/profiles",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Stored profile and summary", body = ProfileReport),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 502, description = "Profiling procedure failed", body = ApiError)
    ),
    tag = "profiles"
)]
pub async fn profile_table(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileReport>, ApiError> {
    let Json(request) = payload?;
    let report = profiler::profile_table(
        &state.db,
        state.procedures.as_ref(),
        request.table_name.trim(),
        request.sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE),
    )
    .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/profiles",
    responses(
        (status = 200, description = "Profiled tables and global stats", body = ProfilesOverview),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "profiles"
)]
pub async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<ProfilesOverview>, ApiError> {
    let repo = ColumnProfileRepository::new(&state.db);
    Ok(Json(ProfilesOverview {
        tables: repo.profiled_tables().await?,
        stats: repo.stats().await?,
    }))
}

#[utoipa::path(
    get,
    path = "/profiles/{table}",
    params(("table" = String, Path, description = "Profiled table name")),
    responses(
        (status = 200, description = "Stored profile of the table", body = TableProfileResponse),
        (status = 404, description = "Table has never been profiled", body = ApiError)
    ),
    tag = "profiles"
)]
pub async fn get_table_profile(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<TableProfileResponse>, ApiError> {
    let profiles = ColumnProfileRepository::new(&state.db)
        .list_for_table(&table)
        .await?;
    if profiles.is_empty() {
        return Err(DomainError::not_found("profile", &table).into());
    }

    let summary = ProfileSummary::from_profiles(&table, &profiles);
    Ok(Json(TableProfileResponse {
        summary,
        columns: profiles.into_iter().map(Into::into).collect(),
    }))
}
