//! Dashboard Aggregator
//!
//! Read-side rollups for the landing page and the history tabs. Every section is
//! read independently; a failing read is logged and replaced by its empty default
//! so one broken query never blanks the whole dashboard.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::config::DashboardConfig;
use crate::error::DomainResult;
use crate::models::job_execution::{self, ExecutionStatus, JobExecutionResponse};
use crate::models::quality_check_result::{self, CheckStatus};
use crate::repositories::quality_check_result::ResultFilter;
use crate::repositories::{
    ColumnProfileRepository, JobExecutionRepository, QualityCheckResultRepository,
    TransformationJobRepository,
};

pub const RECENT_CHECKS_WINDOW_HOURS: i64 = 24;
pub const TREND_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct LandingMetrics {
    pub tables_profiled: u64,
    pub checks_last_24h: u64,
    pub active_jobs: u64,
    /// Percentage of executions started in the last 7 days that succeeded
    pub success_rate_7d: f64,
}

/// Number of rows with `status` on `date` (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyStatusCount {
    #[schema(value_type = String, example = "2026-10-01")]
    pub date: NaiveDate,
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProfiledTable {
    pub table_name: String,
    pub columns_profiled: u64,
    #[schema(value_type = String, example = "2026-10-01T09:00:00Z")]
    pub last_profiled: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ExecutionSummary {
    pub total_executions: u64,
    pub success_rate: f64,
    pub avg_duration_seconds: f64,
    pub total_rows_processed: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct QualitySummary {
    pub total_checks: u64,
    pub passed: u64,
    pub failed: u64,
    pub warnings: u64,
    pub avg_failure_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DashboardOverview {
    pub metrics: LandingMetrics,
    pub quality_trend: Vec<DailyStatusCount>,
    pub job_trend: Vec<DailyStatusCount>,
    pub latest_profiles: Vec<ProfiledTable>,
    pub recent_jobs: Vec<JobExecutionResponse>,
}

/// Successes as a percentage of all executions, one decimal; 0 when there are none.
pub fn success_rate<'a>(statuses: impl IntoIterator<Item = &'a ExecutionStatus>) -> f64 {
    let (total, succeeded) = statuses.into_iter().fold((0u64, 0u64), |(t, s), status| {
        (t + 1, s + u64::from(*status == ExecutionStatus::Success))
    });
    if total == 0 {
        return 0.0;
    }
    round_to(succeeded as f64 * 100.0 / total as f64, 1)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Count rows per (UTC day, status), ordered by day then status.
pub fn daily_status_counts<'a>(
    rows: impl IntoIterator<Item = (&'a DateTimeWithTimeZone, &'static str)>,
) -> Vec<DailyStatusCount> {
    let mut counts: BTreeMap<(NaiveDate, &'static str), u64> = BTreeMap::new();
    for (at, status) in rows {
        *counts
            .entry((at.with_timezone(&Utc).date_naive(), status))
            .or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((date, status), count)| DailyStatusCount {
            date,
            status: status.to_string(),
            count,
        })
        .collect()
}

/// Collapse `(table, profiled_at)` rows (newest first) into one entry per table.
pub fn group_profiled_tables(
    rows: Vec<(String, DateTimeWithTimeZone)>,
    limit: usize,
) -> Vec<ProfiledTable> {
    let mut tables: Vec<ProfiledTable> = Vec::new();
    for (table_name, profiled_at) in rows {
        match tables.iter_mut().find(|t| t.table_name == table_name) {
            Some(entry) => {
                entry.columns_profiled += 1;
                if profiled_at > entry.last_profiled {
                    entry.last_profiled = profiled_at;
                }
            }
            None => tables.push(ProfiledTable {
                table_name,
                columns_profiled: 1,
                last_profiled: profiled_at,
            }),
        }
    }
    tables.sort_by(|a, b| b.last_profiled.cmp(&a.last_profiled));
    tables.truncate(limit);
    tables
}

pub fn execution_summary(executions: &[job_execution::Model]) -> ExecutionSummary {
    let durations: Vec<f64> = executions
        .iter()
        .filter_map(|e| e.execution_time_seconds)
        .collect();
    let avg_duration_seconds = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    ExecutionSummary {
        total_executions: executions.len() as u64,
        success_rate: success_rate(executions.iter().map(|e| &e.status)),
        avg_duration_seconds: round_to(avg_duration_seconds, 1),
        total_rows_processed: executions.iter().map(|e| e.rows_processed).sum(),
    }
}

pub fn quality_summary(results: &[quality_check_result::Model]) -> QualitySummary {
    let count = |status: CheckStatus| results.iter().filter(|r| r.status == status).count() as u64;
    let avg_failure_rate = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.failure_rate).sum::<f64>() / results.len() as f64
    };

    QualitySummary {
        total_checks: results.len() as u64,
        passed: count(CheckStatus::Passed),
        failed: count(CheckStatus::Failed),
        warnings: count(CheckStatus::Warning),
        avg_failure_rate: round_to(avg_failure_rate, 4),
    }
}

fn or_default<T: Default>(section: &'static str, result: DomainResult<T>) -> T {
    result.unwrap_or_else(|err| {
        warn!(section, error = %err, "Dashboard read failed; showing defaults");
        T::default()
    })
}

pub struct Dashboard<'a> {
    db: &'a DatabaseConnection,
    config: &'a DashboardConfig,
}

impl<'a> Dashboard<'a> {
    pub fn new(db: &'a DatabaseConnection, config: &'a DashboardConfig) -> Self {
        Self { db, config }
    }

    /// Landing page rollup as of `now`
    pub async fn overview(&self, now: DateTimeWithTimeZone) -> DashboardOverview {
        let executions_repo = JobExecutionRepository::new(self.db);
        let results_repo = QualityCheckResultRepository::new(self.db);
        let trend_start = now - Duration::days(TREND_WINDOW_DAYS);
        let checks_start = now - Duration::hours(RECENT_CHECKS_WINDOW_HOURS);

        let week_executions = or_default(
            "job_trend",
            executions_repo.list_since(trend_start).await,
        );
        let week_results = or_default("quality_trend", results_repo.list_since(trend_start).await);

        let metrics = LandingMetrics {
            tables_profiled: or_default(
                "tables_profiled",
                ColumnProfileRepository::new(self.db).count_tables().await,
            ),
            checks_last_24h: or_default(
                "checks_last_24h",
                results_repo.count_since(checks_start).await,
            ),
            active_jobs: or_default(
                "active_jobs",
                TransformationJobRepository::new(self.db).count_active().await,
            ),
            success_rate_7d: success_rate(week_executions.iter().map(|e| &e.status)),
        };

        let latest_profiles = group_profiled_tables(
            or_default(
                "latest_profiles",
                ColumnProfileRepository::new(self.db)
                    .profile_timestamps()
                    .await,
            ),
            self.config.activity_limit as usize,
        );

        let recent_jobs = or_default(
            "recent_jobs",
            executions_repo.list_recent(self.config.activity_limit).await,
        )
        .into_iter()
        .map(|(execution, job)| JobExecutionResponse::new(execution, job.map(|j| j.job_name)))
        .collect();

        DashboardOverview {
            metrics,
            quality_trend: daily_status_counts(
                week_results
                    .iter()
                    .map(|r| (&r.execution_time, r.status.as_str())),
            ),
            job_trend: daily_status_counts(
                week_executions
                    .iter()
                    .map(|e| (&e.started_at, e.status.as_str())),
            ),
            latest_profiles,
            recent_jobs,
        }
    }

    /// Summary over the latest `history_limit` executions
    pub async fn execution_summary(&self) -> ExecutionSummary {
        let rows = or_default(
            "execution_summary",
            JobExecutionRepository::new(self.db)
                .list_recent(self.config.history_limit)
                .await,
        );
        let executions: Vec<_> = rows.into_iter().map(|(execution, _)| execution).collect();
        execution_summary(&executions)
    }

    /// Summary over the latest `history_limit` check results
    pub async fn quality_summary(&self) -> QualitySummary {
        let rows = or_default(
            "quality_summary",
            QualityCheckResultRepository::new(self.db)
                .list_recent(ResultFilter {
                    limit: self.config.history_limit,
                    ..Default::default()
                })
                .await,
        );
        let results: Vec<_> = rows.into_iter().map(|(result, _)| result).collect();
        quality_summary(&results)
    }
}
