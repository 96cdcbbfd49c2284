//! # Dashboard API Handler

use axum::{extract::State, response::Json};
use chrono::Utc;

use crate::dashboard::{Dashboard, DashboardOverview};
use crate::server::AppState;

/// Landing page metrics, trends and recent activity
///
/// Never fails: a section whose read fails is returned empty.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard overview", body = DashboardOverview)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardOverview> {
    let dashboard = Dashboard::new(&state.db, &state.config.dashboard);
    Json(dashboard.overview(Utc::now().fixed_offset()).await)
}
