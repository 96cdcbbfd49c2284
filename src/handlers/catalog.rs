//! # Catalog API Handlers
//!
//! Browse the platform's databases, schemas, tables and columns. These feed the
//! table pickers on the profiling, job and quality pages.

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    response::Json,
};
use serde::Deserialize;

use crate::catalog::{ColumnInfo, TableRef};
use crate::error::ApiError;
use crate::handlers::query_error;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ColumnsQuery {
    /// Only return VARCHAR/TEXT/STRING columns
    #[serde(default)]
    pub text_only: bool,
}

#[utoipa::path(
    get,
    path = "/catalog/databases",
    responses(
        (status = 200, description = "Database names", body = [String]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn list_databases(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.catalog.list_databases().await?))
}

#[utoipa::path(
    get,
    path = "/catalog/databases/{database}/schemas",
    params(("database" = String, Path, description = "Database name")),
    responses(
        (status = 200, description = "Schema names", body = [String]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn list_schemas(
    State(state): State<AppState>,
    Path(database): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.catalog.list_schemas(&database).await?))
}

#[utoipa::path(
    get,
    path = "/catalog/databases/{database}/schemas/{schema}/tables",
    params(
        ("database" = String, Path, description = "Database name"),
        ("schema" = String, Path, description = "Schema name")
    ),
    responses(
        (status = 200, description = "Table names", body = [String]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Path((database, schema)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.catalog.list_tables(&database, &schema).await?))
}

#[utoipa::path(
    get,
    path = "/catalog/tables/{table}/columns",
    params(
        ("table" = String, Path, description = "Fully-qualified DB.SCHEMA.TABLE reference"),
        ("text_only" = Option<bool>, Query, description = "Only text columns (for STANDARDIZE)")
    ),
    responses(
        (status = 200, description = "Columns in ordinal order", body = [ColumnInfo]),
        (status = 400, description = "Malformed table reference", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn list_columns(
    State(state): State<AppState>,
    Path(table): Path<String>,
    query: Result<Query<ColumnsQuery>, QueryRejection>,
) -> Result<Json<Vec<ColumnInfo>>, ApiError> {
    let Query(query) = query.map_err(query_error)?;
    let table: TableRef = table.parse()?;

    let columns = if query.text_only {
        state.catalog.text_columns(&table).await?
    } else {
        state.catalog.list_columns(&table).await?
    };
    Ok(Json(columns))
}
