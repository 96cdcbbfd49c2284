//! JobExecution entity model
//!
//! One row per transformation job run in `job_execution_history`.
//! Rows start RUNNING and move exactly once to SUCCESS or FAILED.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "job_execution_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub execution_id: Uuid,

    pub job_id: Uuid,

    pub started_at: DateTimeWithTimeZone,

    /// Null while RUNNING
    pub completed_at: Option<DateTimeWithTimeZone>,

    pub status: ExecutionStatus,

    pub rows_processed: i64,

    pub rows_affected: i64,

    pub execution_time_seconds: Option<f64>,

    /// Present iff status is FAILED
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transformation_job::Entity",
        from = "Column::JobId",
        to = "super::transformation_job::Column::JobId"
    )]
    TransformationJob,
}

impl Related<super::transformation_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransformationJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ExecutionStatus {
    #[sea_orm(string_value = "RUNNING")]
    #[serde(rename = "RUNNING")]
    Running,

    #[sea_orm(string_value = "SUCCESS")]
    #[serde(rename = "SUCCESS")]
    Success,

    #[sea_orm(string_value = "FAILED")]
    #[serde(rename = "FAILED")]
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Terminal outcome handed to the ledger when a run finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success {
        rows_processed: i64,
        rows_affected: i64,
    },
    Failed {
        error_message: String,
    },
}

impl ExecutionOutcome {
    pub fn status(&self) -> ExecutionStatus {
        match self {
            Self::Success { .. } => ExecutionStatus::Success,
            Self::Failed { .. } => ExecutionStatus::Failed,
        }
    }
}

/// Execution history row with the owning job's name, when it still exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobExecutionResponse {
    pub execution_id: Uuid,
    pub job_id: Uuid,
    pub job_name: Option<String>,
    #[schema(value_type = String, example = "2026-10-01T09:00:00Z")]
    pub started_at: DateTimeWithTimeZone,
    #[schema(value_type = Option<String>, example = "2026-10-01T09:00:42Z")]
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub status: ExecutionStatus,
    pub rows_processed: i64,
    pub rows_affected: i64,
    pub execution_time_seconds: Option<f64>,
    pub error_message: Option<String>,
}

impl JobExecutionResponse {
    pub fn new(model: Model, job_name: Option<String>) -> Self {
        Self {
            execution_id: model.execution_id,
            job_id: model.job_id,
            job_name,
            started_at: model.started_at,
            completed_at: model.completed_at,
            status: model.status,
            rows_processed: model.rows_processed,
            rows_affected: model.rows_affected,
            execution_time_seconds: model.execution_time_seconds,
            error_message: model.error_message,
        }
    }
}
