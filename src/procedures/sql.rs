//! SQL-backed [`RemoteProcedures`] implementation.
//!
//! Each call is `SELECT * FROM <schema>.<procedure>(<bound params>)` against the
//! platform connection, bounded by the configured statement timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, QueryResult, RuntimeErr,
    Statement, Value,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    CheckEvaluation, JobRunOutcome, ProcedureError, ProfileOutcome, RemoteProcedures,
    StatusMessage,
};
use crate::config::{ConfigError, ProcedureConfig};
use crate::models::column_profile::ColumnStatistics;
use crate::models::quality_check_config;
use crate::models::transformation_job::{NullStrategy, StandardizeOperation};

pub struct SqlProcedures {
    db: DatabaseConnection,
    schema: String,
    timeout: Duration,
}

impl SqlProcedures {
    pub fn new(db: DatabaseConnection, config: &ProcedureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            db,
            schema: config.schema.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    async fn call(
        &self,
        procedure: &'static str,
        args: Vec<Value>,
    ) -> Result<Vec<QueryResult>, ProcedureError> {
        let backend = self.db.get_database_backend();
        let sql = call_sql(backend, &self.schema, procedure, args.len());
        let stmt = Statement::from_sql_and_values(backend, sql, args);

        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.db.query_all(stmt)).await;
        histogram!("dataflow_procedure_duration_seconds", "procedure" => procedure)
            .record(started.elapsed().as_secs_f64());

        let (outcome, result) = match result {
            Err(_) => (
                "timeout",
                Err(ProcedureError::Timeout {
                    procedure: procedure.to_string(),
                    timeout_seconds: self.timeout.as_secs(),
                }),
            ),
            Ok(Err(db_err)) => (
                "failed",
                Err(ProcedureError::failed(procedure, platform_message(&db_err))),
            ),
            Ok(Ok(rows)) => ("ok", Ok(rows)),
        };

        counter!("dataflow_procedure_calls_total", "procedure" => procedure, "outcome" => outcome)
            .increment(1);

        if let Err(err) = &result {
            tracing::warn!(procedure, error = %err, "Procedure call failed");
        }

        result
    }

    /// Call a procedure whose single result cell is a status message.
    async fn call_for_message(
        &self,
        procedure: &'static str,
        args: Vec<Value>,
    ) -> Result<StatusMessage, ProcedureError> {
        let rows = self.call(procedure, args).await?;
        let row = rows
            .first()
            .ok_or_else(|| ProcedureError::malformed(procedure, "no rows returned"))?;
        let message: String = row
            .try_get_by_index(0)
            .map_err(|e| ProcedureError::malformed(procedure, e.to_string()))?;
        Ok(StatusMessage::new(message))
    }
}

/// Build the call statement. Only bound placeholders follow the identifier.
fn call_sql(backend: DatabaseBackend, schema: &str, procedure: &str, arg_count: usize) -> String {
    let placeholders = (1..=arg_count)
        .map(|i| match backend {
            DatabaseBackend::Postgres => format!("${}", i),
            _ => "?".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT * FROM {}.{}({})", schema, procedure, placeholders)
}

/// The platform's own error text, without driver prefixes.
fn platform_message(error: &DbErr) -> String {
    match error {
        DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err
            .as_database_error()
            .map(|db_err| db_err.message().to_string())
            .unwrap_or_else(|| sqlx_err.to_string()),
        other => other.to_string(),
    }
}

fn column_list(columns: &[String]) -> Value {
    Value::from(serde_json::json!(columns))
}

fn profile_row(procedure: &str, row: &QueryResult) -> Result<ColumnStatistics, ProcedureError> {
    let read = |e: DbErr| ProcedureError::malformed(procedure, e.to_string());
    Ok(ColumnStatistics {
        column_name: row.try_get("", "column_name").map_err(read)?,
        data_type: row.try_get("", "data_type").map_err(read)?,
        row_count: row.try_get("", "row_count").map_err(read)?,
        null_count: row.try_get("", "null_count").map_err(read)?,
        null_percentage: row.try_get("", "null_percentage").map_err(read)?,
        distinct_count: row.try_get("", "distinct_count").map_err(read)?,
        distinct_percentage: row.try_get("", "distinct_percentage").map_err(read)?,
        min_value: row.try_get("", "min_value").map_err(read)?,
        max_value: row.try_get("", "max_value").map_err(read)?,
        avg_value: row.try_get("", "avg_value").map_err(read)?,
    })
}

#[async_trait]
impl RemoteProcedures for SqlProcedures {
    #[instrument(skip(self))]
    async fn profile_table(
        &self,
        table: &str,
        sample_size: u32,
    ) -> Result<ProfileOutcome, ProcedureError> {
        const PROCEDURE: &str = "profile_table";
        let rows = self
            .call(
                PROCEDURE,
                vec![Value::from(table.to_string()), Value::from(sample_size as i64)],
            )
            .await?;

        let columns = rows
            .iter()
            .map(|row| profile_row(PROCEDURE, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProfileOutcome {
            message: format!("Profiled {} columns of {}", columns.len(), table),
            columns,
        })
    }

    #[instrument(skip(self))]
    async fn execute_transformation_job(
        &self,
        job_id: Uuid,
    ) -> Result<JobRunOutcome, ProcedureError> {
        const PROCEDURE: &str = "execute_transformation_job";
        let rows = self.call(PROCEDURE, vec![Value::from(job_id)]).await?;
        let row = rows
            .first()
            .ok_or_else(|| ProcedureError::malformed(PROCEDURE, "no rows returned"))?;
        let read = |e: DbErr| ProcedureError::malformed(PROCEDURE, e.to_string());

        Ok(JobRunOutcome {
            message: row.try_get("", "message").map_err(read)?,
            rows_processed: row.try_get("", "rows_processed").map_err(read)?,
            rows_affected: row.try_get("", "rows_affected").map_err(read)?,
        })
    }

    #[instrument(skip(self))]
    async fn deduplicate_table(
        &self,
        source: &str,
        target: &str,
        key_columns: &[String],
    ) -> Result<StatusMessage, ProcedureError> {
        self.call_for_message(
            "deduplicate_table",
            vec![
                Value::from(source.to_string()),
                Value::from(target.to_string()),
                column_list(key_columns),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn clean_null_values(
        &self,
        source: &str,
        target: &str,
        strategy: NullStrategy,
        columns: Option<&[String]>,
    ) -> Result<StatusMessage, ProcedureError> {
        let columns = match columns {
            Some(columns) => column_list(columns),
            None => Value::Json(None),
        };
        self.call_for_message(
            "clean_null_values",
            vec![
                Value::from(source.to_string()),
                Value::from(target.to_string()),
                Value::from(strategy.as_str()),
                columns,
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn standardize_text_column(
        &self,
        source: &str,
        target: &str,
        column: &str,
        operation: StandardizeOperation,
    ) -> Result<StatusMessage, ProcedureError> {
        self.call_for_message(
            "standardize_text_column",
            vec![
                Value::from(source.to_string()),
                Value::from(target.to_string()),
                Value::from(column.to_string()),
                Value::from(operation.as_str()),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn run_quality_checks(&self, table: &str) -> Result<StatusMessage, ProcedureError> {
        self.call_for_message("run_quality_checks", vec![Value::from(table.to_string())])
            .await
    }

    #[instrument(skip(self, check), fields(check_id = %check.check_id))]
    async fn evaluate_quality_check(
        &self,
        check: &quality_check_config::Model,
    ) -> Result<CheckEvaluation, ProcedureError> {
        const PROCEDURE: &str = "evaluate_quality_check";
        let rows = self
            .call(
                PROCEDURE,
                vec![
                    Value::from(check.check_id),
                    Value::from(check.table_name.clone()),
                    Value::from(check.column_name.clone()),
                    Value::from(check.check_type.as_str()),
                    Value::from(check.check_parameters.clone()),
                ],
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| ProcedureError::malformed(PROCEDURE, "no rows returned"))?;
        let read = |e: DbErr| ProcedureError::malformed(PROCEDURE, e.to_string());

        Ok(CheckEvaluation {
            records_checked: row.try_get("", "records_checked").map_err(read)?,
            records_failed: row.try_get("", "records_failed").map_err(read)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_sql_uses_backend_placeholders() {
        assert_eq!(
            call_sql(DatabaseBackend::Postgres, "app_schema", "deduplicate_table", 3),
            "SELECT * FROM app_schema.deduplicate_table($1, $2, $3)"
        );
        assert_eq!(
            call_sql(DatabaseBackend::Sqlite, "ops", "run_quality_checks", 1),
            "SELECT * FROM ops.run_quality_checks(?)"
        );
        assert_eq!(
            call_sql(DatabaseBackend::Postgres, "app_schema", "noop", 0),
            "SELECT * FROM app_schema.noop()"
        );
    }

    #[test]
    fn test_platform_message_passthrough() {
        let err = DbErr::Custom("procedure raised: bad column".to_string());
        assert!(platform_message(&err).contains("bad column"));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_schema() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let config = ProcedureConfig {
            schema: "app_schema.x; --".to_string(),
            ..Default::default()
        };
        assert!(SqlProcedures::new(db, &config).is_err());
    }

    #[tokio::test]
    async fn test_missing_procedure_surfaces_as_failure() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let procedures = SqlProcedures::new(db, &ProcedureConfig::default()).unwrap();

        let err = procedures.run_quality_checks("DB.SCH.T").await.unwrap_err();
        assert!(matches!(err, ProcedureError::Failed { .. }));
        assert_eq!(err.procedure(), "run_quality_checks");
    }
}
