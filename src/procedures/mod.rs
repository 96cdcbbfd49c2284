//! Platform stored procedures
//!
//! The data-processing work (profiling, dedup, null cleaning, standardization,
//! check evaluation, job execution) runs inside the data platform. This module
//! defines the typed interface the rest of the crate calls it through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::column_profile::ColumnStatistics;
use crate::models::quality_check_config;
use crate::models::transformation_job::{NullStrategy, StandardizeOperation};

pub mod sql;

pub use sql::SqlProcedures;

/// Failure reported by (or while reaching) a platform procedure.
#[derive(Debug, Clone, Error)]
pub enum ProcedureError {
    /// The procedure ran and raised an error; the message is the platform's own text
    #[error("{message}")]
    Failed { procedure: String, message: String },

    #[error("{procedure} did not finish within {timeout_seconds}s")]
    Timeout {
        procedure: String,
        timeout_seconds: u64,
    },

    #[error("{procedure} returned an unexpected result: {details}")]
    MalformedResponse { procedure: String, details: String },
}

impl ProcedureError {
    pub fn failed(procedure: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            procedure: procedure.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed(procedure: &str, details: impl Into<String>) -> Self {
        Self::MalformedResponse {
            procedure: procedure.to_string(),
            details: details.into(),
        }
    }

    pub fn procedure(&self) -> &str {
        match self {
            Self::Failed { procedure, .. }
            | Self::Timeout { procedure, .. }
            | Self::MalformedResponse { procedure, .. } => procedure,
        }
    }
}

impl From<ProcedureError> for DomainError {
    fn from(error: ProcedureError) -> Self {
        DomainError::remote(error.procedure().to_string(), error.to_string())
    }
}

/// Status text returned by a procedure, shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOutcome {
    pub message: String,
    pub columns: Vec<ColumnStatistics>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRunOutcome {
    pub message: String,
    pub rows_processed: i64,
    pub rows_affected: i64,
}

/// Record counts produced by evaluating one quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckEvaluation {
    pub records_checked: i64,
    pub records_failed: i64,
}

/// Typed interface to the platform procedures. Implementations must not retry
/// on their own; failures surface to the caller once.
#[async_trait]
pub trait RemoteProcedures: Send + Sync {
    async fn profile_table(
        &self,
        table: &str,
        sample_size: u32,
    ) -> Result<ProfileOutcome, ProcedureError>;

    async fn execute_transformation_job(&self, job_id: Uuid)
    -> Result<JobRunOutcome, ProcedureError>;

    async fn deduplicate_table(
        &self,
        source: &str,
        target: &str,
        key_columns: &[String],
    ) -> Result<StatusMessage, ProcedureError>;

    /// `columns == None` cleans every column
    async fn clean_null_values(
        &self,
        source: &str,
        target: &str,
        strategy: NullStrategy,
        columns: Option<&[String]>,
    ) -> Result<StatusMessage, ProcedureError>;

    async fn standardize_text_column(
        &self,
        source: &str,
        target: &str,
        column: &str,
        operation: StandardizeOperation,
    ) -> Result<StatusMessage, ProcedureError>;

    /// Bulk evaluation of every check on `table`, recorded by the platform itself.
    async fn run_quality_checks(&self, table: &str) -> Result<StatusMessage, ProcedureError>;

    async fn evaluate_quality_check(
        &self,
        check: &quality_check_config::Model,
    ) -> Result<CheckEvaluation, ProcedureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_message_is_verbatim() {
        let err = ProcedureError::failed("deduplicate_table", "Table DB.SCH.X does not exist");
        let domain: DomainError = err.into();

        match domain {
            DomainError::RemoteProcedure { procedure, message } => {
                assert_eq!(procedure, "deduplicate_table");
                assert_eq!(message, "Table DB.SCH.X does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_mentions_limit() {
        let err = ProcedureError::Timeout {
            procedure: "profile_table".to_string(),
            timeout_seconds: 30,
        };
        assert_eq!(err.to_string(), "profile_table did not finish within 30s");
    }
}
