//! Job Runner
//!
//! Runs a registered transformation job once: opens a RUNNING execution, hands the
//! job to the platform's `execute_transformation_job` procedure, then resolves the
//! execution and stamps the job's last run whatever the outcome.

use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::job_execution::{ExecutionOutcome, JobExecutionResponse};
use crate::procedures::RemoteProcedures;
use crate::repositories::{JobExecutionRepository, TransformationJobRepository};

/// Outcome of one run: the resolved execution plus the procedure's status text.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobRunReport {
    pub execution: JobExecutionResponse,
    /// Status message on success, `None` when the run failed
    pub message: Option<String>,
}

pub struct JobRunner<'a> {
    db: &'a DatabaseConnection,
    procedures: &'a dyn RemoteProcedures,
}

impl<'a> JobRunner<'a> {
    pub fn new(db: &'a DatabaseConnection, procedures: &'a dyn RemoteProcedures) -> Self {
        Self { db, procedures }
    }

    /// Run `job_id` once. A procedure failure is recorded on the execution and
    /// returned in the report rather than as an error; only an unknown job or a
    /// store failure is an `Err`.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run(&self, job_id: Uuid) -> DomainResult<JobRunReport> {
        let jobs = TransformationJobRepository::new(self.db);
        let executions = JobExecutionRepository::new(self.db);

        let job = jobs.get(job_id).await?;
        let execution = executions.start(job.job_id).await?;

        let started = Instant::now();
        let result = self.procedures.execute_transformation_job(job.job_id).await;
        let elapsed = started.elapsed().as_secs_f64();

        let (outcome, message) = match result {
            Ok(run) => {
                info!(
                    job_name = %job.job_name,
                    rows_processed = run.rows_processed,
                    rows_affected = run.rows_affected,
                    "Transformation job succeeded"
                );
                (
                    ExecutionOutcome::Success {
                        rows_processed: run.rows_processed,
                        rows_affected: run.rows_affected,
                    },
                    Some(run.message),
                )
            }
            Err(err) => {
                warn!(job_name = %job.job_name, error = %err, "Transformation job failed");
                (
                    ExecutionOutcome::Failed {
                        error_message: err.to_string(),
                    },
                    None,
                )
            }
        };

        let status = outcome.status();
        counter!(
            "dataflow_job_runs_total",
            "transformation_type" => job.transformation_type.as_str(),
            "status" => status.as_str()
        )
        .increment(1);
        histogram!("dataflow_job_run_duration_seconds").record(elapsed);

        let completed = match executions
            .complete(execution.execution_id, outcome.clone())
            .await
        {
            Ok(completed) => Ok(completed),
            Err(err) => {
                warn!(
                    execution_id = %execution.execution_id,
                    error = %err,
                    "Completing execution failed; retrying once"
                );
                executions.complete(execution.execution_id, outcome).await
            }
        };
        if let Err(err) = &completed {
            error!(
                execution_id = %execution.execution_id,
                status = status.as_str(),
                error = %err,
                "Execution left RUNNING; resolve it manually"
            );
        }
        // Last run is stamped even if resolving the execution failed.
        jobs.record_last_run(job.job_id, Utc::now().fixed_offset())
            .await?;
        let completed = completed?;

        Ok(JobRunReport {
            execution: JobExecutionResponse::new(completed, Some(job.job_name)),
            message,
        })
    }
}
