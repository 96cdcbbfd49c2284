//! # Server Configuration
//!
//! Router, shared state and OpenAPI document for the DataFlow API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::catalog::CatalogBrowser;
use crate::config::AppConfig;
use crate::handlers;
use crate::procedures::RemoteProcedures;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub procedures: Arc<dyn RemoteProcedures>,
    pub catalog: Arc<dyn CatalogBrowser>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/catalog/databases", get(handlers::catalog::list_databases))
        .route(
            "/catalog/databases/{database}/schemas",
            get(handlers::catalog::list_schemas),
        )
        .route(
            "/catalog/databases/{database}/schemas/{schema}/tables",
            get(handlers::catalog::list_tables),
        )
        .route(
            "/catalog/tables/{table}/columns",
            get(handlers::catalog::list_columns),
        )
        .route(
            "/jobs",
            post(handlers::jobs::create_job).get(handlers::jobs::list_jobs),
        )
        .route(
            "/jobs/{id}",
            get(handlers::jobs::get_job).delete(handlers::jobs::delete_job),
        )
        .route("/jobs/{id}/active", post(handlers::jobs::set_job_active))
        .route("/jobs/{id}/run", post(handlers::jobs::run_job))
        .route("/executions", get(handlers::jobs::list_executions))
        .route(
            "/transformations",
            post(handlers::transformations::apply_transformation),
        )
        .route(
            "/quality/checks",
            post(handlers::quality::create_check).get(handlers::quality::list_checks),
        )
        .route(
            "/quality/checks/{id}",
            delete(handlers::quality::delete_check),
        )
        .route(
            "/quality/checks/{id}/active",
            post(handlers::quality::set_check_active),
        )
        .route("/quality/run", post(handlers::quality::run_checks))
        .route("/quality/run-all", post(handlers::quality::run_all_checks))
        .route("/quality/results", get(handlers::quality::list_results))
        .route(
            "/profiles",
            post(handlers::profiles::profile_table).get(handlers::profiles::list_profiles),
        )
        .route(
            "/profiles/{table}",
            get(handlers::profiles::get_table_profile),
        )
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let addr = state
        .config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;
    let profile = state.config.profile.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "DataFlow API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::catalog::list_databases,
        crate::handlers::catalog::list_schemas,
        crate::handlers::catalog::list_tables,
        crate::handlers::catalog::list_columns,
        crate::handlers::jobs::create_job,
        crate::handlers::jobs::list_jobs,
        crate::handlers::jobs::get_job,
        crate::handlers::jobs::set_job_active,
        crate::handlers::jobs::delete_job,
        crate::handlers::jobs::run_job,
        crate::handlers::jobs::list_executions,
        crate::handlers::transformations::apply_transformation,
        crate::handlers::quality::create_check,
        crate::handlers::quality::list_checks,
        crate::handlers::quality::set_check_active,
        crate::handlers::quality::delete_check,
        crate::handlers::quality::run_checks,
        crate::handlers::quality::run_all_checks,
        crate::handlers::quality::list_results,
        crate::handlers::profiles::profile_table,
        crate::handlers::profiles::list_profiles,
        crate::handlers::profiles::get_table_profile,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::dashboard::DashboardOverview,
            crate::catalog::ColumnInfo,
            crate::handlers::jobs::CreateJobRequest,
            crate::handlers::jobs::SetActiveRequest,
            crate::handlers::jobs::JobsResponse,
            crate::handlers::jobs::ExecutionsResponse,
            crate::schedule::SchedulePreset,
            crate::models::transformation_job::TransformationJobResponse,
            crate::models::transformation_job::TransformationType,
            crate::models::transformation_job::NullStrategy,
            crate::models::transformation_job::StandardizeOperation,
            crate::job_runner::JobRunReport,
            crate::handlers::transformations::ApplyTransformationRequest,
            crate::procedures::StatusMessage,
            crate::handlers::quality::CreateCheckRequest,
            crate::handlers::quality::RunQualityRequest,
            crate::handlers::quality::RunQualityResponse,
            crate::handlers::quality::ResultsResponse,
            crate::models::quality_check_config::QualityCheckResponse,
            crate::quality_runner::RunAllReport,
            crate::handlers::profiles::ProfileRequest,
            crate::handlers::profiles::ProfilesOverview,
            crate::handlers::profiles::TableProfileResponse,
            crate::profiler::ProfileReport,
        )
    ),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "dashboard", description = "Landing page rollups"),
        (name = "catalog", description = "Platform metadata browsing"),
        (name = "jobs", description = "Transformation job registry and runs"),
        (name = "transformations", description = "One-shot transformations"),
        (name = "quality", description = "Quality checks and results"),
        (name = "profiles", description = "Table profiling"),
    ),
    info(
        title = "DataFlow API",
        description = "Control plane for profiling, transformation jobs and data quality checks",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
