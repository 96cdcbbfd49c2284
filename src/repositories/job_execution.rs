//! # Job Execution Repository
//!
//! Append-only ledger of transformation job runs.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::job_execution::{
    ActiveModel, Column, Entity, ExecutionOutcome, ExecutionStatus, Model,
};
use crate::models::transformation_job;

const ENTITY: &str = "job execution";

pub struct JobExecutionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> JobExecutionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open a RUNNING execution for `job_id`
    pub async fn start(&self, job_id: Uuid) -> DomainResult<Model> {
        let execution = ActiveModel {
            execution_id: Set(Uuid::new_v4()),
            job_id: Set(job_id),
            started_at: Set(Utc::now().fixed_offset()),
            completed_at: Set(None),
            status: Set(ExecutionStatus::Running),
            rows_processed: Set(0),
            rows_affected: Set(0),
            execution_time_seconds: Set(None),
            error_message: Set(None),
        };

        let created = execution.insert(self.db).await?;
        tracing::debug!(execution_id = %created.execution_id, job_id = %job_id, "Execution started");
        Ok(created)
    }

    /// Resolve a RUNNING execution to its terminal state. Completed executions
    /// are never rewritten.
    pub async fn complete(
        &self,
        execution_id: Uuid,
        outcome: ExecutionOutcome,
    ) -> DomainResult<Model> {
        let execution = Entity::find_by_id(execution_id)
            .one(self.db)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY, execution_id))?;

        if execution.status.is_terminal() {
            return Err(DomainError::validation(format!(
                "execution {} already completed with status {}",
                execution_id,
                execution.status.as_str()
            )));
        }

        let completed_at = Utc::now().fixed_offset();
        let elapsed = (completed_at - execution.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        let status = outcome.status();

        let mut active = execution.into_active_model();
        active.status = Set(status);
        active.completed_at = Set(Some(completed_at));
        active.execution_time_seconds = Set(Some(elapsed));

        match outcome {
            ExecutionOutcome::Success {
                rows_processed,
                rows_affected,
            } => {
                active.rows_processed = Set(rows_processed);
                active.rows_affected = Set(rows_affected);
                active.error_message = Set(None);
            }
            ExecutionOutcome::Failed { error_message } => {
                active.error_message = Set(Some(error_message));
            }
        }

        let updated = active.update(self.db).await?;

        tracing::info!(
            execution_id = %execution_id,
            job_id = %updated.job_id,
            status = status.as_str(),
            execution_time_seconds = elapsed,
            "Execution completed"
        );

        Ok(updated)
    }

    /// Latest executions with the owning job, newest first. Executions whose job
    /// was deleted are kept with `None`.
    pub async fn list_recent(
        &self,
        limit: u64,
    ) -> DomainResult<Vec<(Model, Option<transformation_job::Model>)>> {
        let rows = Entity::find()
            .find_also_related(transformation_job::Entity)
            .order_by_desc(Column::StartedAt)
            .limit(limit)
            .all(self.db)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_job(&self, job_id: Uuid, limit: u64) -> DomainResult<Vec<Model>> {
        let rows = Entity::find()
            .filter(Column::JobId.eq(job_id))
            .order_by_desc(Column::StartedAt)
            .limit(limit)
            .all(self.db)
            .await?;
        Ok(rows)
    }

    /// Executions started at or after `since`, oldest first
    pub async fn list_since(&self, since: DateTimeWithTimeZone) -> DomainResult<Vec<Model>> {
        let rows = Entity::find()
            .filter(Column::StartedAt.gte(since))
            .order_by_asc(Column::StartedAt)
            .all(self.db)
            .await?;
        Ok(rows)
    }
}
