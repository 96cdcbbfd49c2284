//! Quality check runner
//!
//! Evaluates active checks through the platform and appends one result per check.
//! Failures are collected per check (and per table for `run_all_active`) so one
//! bad check never hides the others.

use metrics::counter;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::quality_check_result::QualityCheckResultResponse;
use crate::procedures::{RemoteProcedures, StatusMessage};
use crate::repositories::{QualityCheckRepository, QualityCheckResultRepository};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckFailure {
    pub check_id: Uuid,
    pub check_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableRunReport {
    pub table_name: String,
    pub results: Vec<QualityCheckResultResponse>,
    pub errors: Vec<CheckFailure>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableFailure {
    pub table_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunAllReport {
    pub tables: Vec<TableRunReport>,
    pub failed_tables: Vec<TableFailure>,
}

pub struct QualityRunner<'a> {
    db: &'a DatabaseConnection,
    procedures: &'a dyn RemoteProcedures,
}

impl<'a> QualityRunner<'a> {
    pub fn new(db: &'a DatabaseConnection, procedures: &'a dyn RemoteProcedures) -> Self {
        Self { db, procedures }
    }

    /// Evaluate every active check on `table_name`.
    #[instrument(skip(self))]
    pub async fn run_for_table(&self, table_name: &str) -> DomainResult<TableRunReport> {
        if table_name.trim().is_empty() {
            return Err(DomainError::invalid_field(
                "table_name",
                "table_name is required",
            ));
        }

        let checks = QualityCheckRepository::new(self.db)
            .active_for_table(table_name)
            .await?;
        let results_repo = QualityCheckResultRepository::new(self.db);

        let mut report = TableRunReport {
            table_name: table_name.to_string(),
            results: Vec::with_capacity(checks.len()),
            errors: Vec::new(),
        };

        for check in checks {
            let recorded = match self.procedures.evaluate_quality_check(&check).await {
                Ok(evaluation) => results_repo
                    .record(&check, evaluation.records_checked, evaluation.records_failed)
                    .await,
                Err(err) => Err(DomainError::from(err)),
            };

            match recorded {
                Ok(result) => {
                    counter!(
                        "dataflow_quality_checks_evaluated_total",
                        "check_type" => check.check_type.as_str(),
                        "status" => result.status.as_str()
                    )
                    .increment(1);
                    report
                        .results
                        .push(QualityCheckResultResponse::new(result, Some(check)));
                }
                Err(err) => {
                    counter!(
                        "dataflow_quality_checks_evaluated_total",
                        "check_type" => check.check_type.as_str(),
                        "status" => "ERROR"
                    )
                    .increment(1);
                    warn!(
                        check_id = %check.check_id,
                        check_name = %check.check_name,
                        error = %err,
                        "Quality check evaluation failed"
                    );
                    report.errors.push(CheckFailure {
                        check_id: check.check_id,
                        check_name: check.check_name,
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            table_name = %table_name,
            recorded = report.results.len(),
            failed = report.errors.len(),
            "Quality checks run for table"
        );

        Ok(report)
    }

    /// Run every table that has at least one active check.
    #[instrument(skip(self))]
    pub async fn run_all_active(&self) -> DomainResult<RunAllReport> {
        let tables = QualityCheckRepository::new(self.db)
            .tables_with_active_checks()
            .await?;

        let mut report = RunAllReport {
            tables: Vec::with_capacity(tables.len()),
            failed_tables: Vec::new(),
        };

        for table_name in tables {
            match self.run_for_table(&table_name).await {
                Ok(table_report) => report.tables.push(table_report),
                Err(err) => {
                    warn!(table_name = %table_name, error = %err, "Quality run failed for table");
                    report.failed_tables.push(TableFailure {
                        table_name,
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Hand a whole table to the platform's bulk `run_quality_checks` procedure,
    /// which records its own results.
    #[instrument(skip(self))]
    pub async fn delegate_table(&self, table_name: &str) -> DomainResult<StatusMessage> {
        if table_name.trim().is_empty() {
            return Err(DomainError::invalid_field(
                "table_name",
                "table_name is required",
            ));
        }
        Ok(self.procedures.run_quality_checks(table_name).await?)
    }
}
