//! Test utilities: in-memory SQLite with migrations applied, and scripted fakes
//! of the platform procedures and catalog.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use dataflow::catalog::{CatalogBrowser, ColumnInfo, TableRef};
use dataflow::config::AppConfig;
use dataflow::error::{DomainError, DomainResult};
use dataflow::models::column_profile::ColumnStatistics;
use dataflow::models::quality_check_config;
use dataflow::models::transformation_job::{NullStrategy, StandardizeOperation};
use dataflow::procedures::{
    CheckEvaluation, JobRunOutcome, ProcedureError, ProfileOutcome, RemoteProcedures,
    StatusMessage,
};
use dataflow::server::AppState;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Column statistics fixture with the given null and distinct percentages.
pub fn column(name: &str, null_percentage: f64, distinct_percentage: f64) -> ColumnStatistics {
    ColumnStatistics {
        column_name: name.to_string(),
        data_type: "VARCHAR".to_string(),
        row_count: 1000,
        null_count: (null_percentage * 10.0) as i64,
        null_percentage,
        distinct_count: (distinct_percentage * 10.0) as i64,
        distinct_percentage,
        min_value: None,
        max_value: None,
        avg_value: None,
    }
}

/// Scripted [`RemoteProcedures`].
///
/// Queued responses are consumed in order; an empty queue answers with a
/// successful default. Check evaluations are keyed by check name.
#[derive(Default)]
pub struct MockProcedures {
    profiles: Mutex<VecDeque<Result<ProfileOutcome, ProcedureError>>>,
    job_runs: Mutex<VecDeque<Result<JobRunOutcome, ProcedureError>>>,
    statuses: Mutex<VecDeque<Result<StatusMessage, ProcedureError>>>,
    evaluations: Mutex<HashMap<String, Result<CheckEvaluation, ProcedureError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockProcedures {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_profile(&self, response: Result<ProfileOutcome, ProcedureError>) {
        self.profiles.lock().unwrap().push_back(response);
    }

    pub fn push_job_run(&self, response: Result<JobRunOutcome, ProcedureError>) {
        self.job_runs.lock().unwrap().push_back(response);
    }

    pub fn push_status(&self, response: Result<StatusMessage, ProcedureError>) {
        self.statuses.lock().unwrap().push_back(response);
    }

    pub fn set_evaluation(
        &self,
        check_name: &str,
        response: Result<CheckEvaluation, ProcedureError>,
    ) {
        self.evaluations
            .lock()
            .unwrap()
            .insert(check_name.to_string(), response);
    }

    /// Calls received so far, as `procedure(args)` strings
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_status(&self) -> Result<StatusMessage, ProcedureError> {
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusMessage::new("ok")))
    }
}

#[async_trait]
impl RemoteProcedures for MockProcedures {
    async fn profile_table(
        &self,
        table: &str,
        sample_size: u32,
    ) -> Result<ProfileOutcome, ProcedureError> {
        self.record(format!("profile_table({table}, {sample_size})"));
        self.profiles.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(ProfileOutcome {
                message: format!("Profiled {table}"),
                columns: vec![column("ID", 0.0, 100.0)],
            })
        })
    }

    async fn execute_transformation_job(
        &self,
        job_id: Uuid,
    ) -> Result<JobRunOutcome, ProcedureError> {
        self.record(format!("execute_transformation_job({job_id})"));
        self.job_runs.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(JobRunOutcome {
                message: "Job completed".to_string(),
                rows_processed: 100,
                rows_affected: 10,
            })
        })
    }

    async fn deduplicate_table(
        &self,
        source: &str,
        target: &str,
        key_columns: &[String],
    ) -> Result<StatusMessage, ProcedureError> {
        self.record(format!(
            "deduplicate_table({source}, {target}, {})",
            key_columns.join("|")
        ));
        self.next_status()
    }

    async fn clean_null_values(
        &self,
        source: &str,
        target: &str,
        strategy: NullStrategy,
        columns: Option<&[String]>,
    ) -> Result<StatusMessage, ProcedureError> {
        self.record(format!(
            "clean_null_values({source}, {target}, {}, {})",
            strategy.as_str(),
            columns.map(|c| c.join("|")).unwrap_or_else(|| "*".to_string())
        ));
        self.next_status()
    }

    async fn standardize_text_column(
        &self,
        source: &str,
        target: &str,
        column: &str,
        operation: StandardizeOperation,
    ) -> Result<StatusMessage, ProcedureError> {
        self.record(format!(
            "standardize_text_column({source}, {target}, {column}, {})",
            operation.as_str()
        ));
        self.next_status()
    }

    async fn run_quality_checks(&self, table: &str) -> Result<StatusMessage, ProcedureError> {
        self.record(format!("run_quality_checks({table})"));
        self.next_status()
    }

    async fn evaluate_quality_check(
        &self,
        check: &quality_check_config::Model,
    ) -> Result<CheckEvaluation, ProcedureError> {
        self.record(format!("evaluate_quality_check({})", check.check_name));
        self.evaluations
            .lock()
            .unwrap()
            .get(&check.check_name)
            .cloned()
            .unwrap_or(Ok(CheckEvaluation {
                records_checked: 100,
                records_failed: 0,
            }))
    }
}

/// Fixed in-memory catalog.
#[derive(Default)]
pub struct MockCatalog {
    pub columns: HashMap<String, Vec<ColumnInfo>>,
}

impl MockCatalog {
    pub fn with_table(mut self, table: &str, columns: &[(&str, &str)]) -> Self {
        self.columns.insert(
            table.to_string(),
            columns
                .iter()
                .map(|(name, data_type)| ColumnInfo {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                })
                .collect(),
        );
        self
    }

    fn refs(&self) -> Vec<TableRef> {
        let mut refs: Vec<TableRef> = self
            .columns
            .keys()
            .filter_map(|key| key.parse().ok())
            .collect();
        refs.sort_by_key(|r| r.to_string());
        refs
    }
}

#[async_trait]
impl CatalogBrowser for MockCatalog {
    async fn list_databases(&self) -> DomainResult<Vec<String>> {
        let mut dbs: Vec<String> = self.refs().into_iter().map(|r| r.database).collect();
        dbs.dedup();
        Ok(dbs)
    }

    async fn list_schemas(&self, database: &str) -> DomainResult<Vec<String>> {
        let mut schemas: Vec<String> = self
            .refs()
            .into_iter()
            .filter(|r| r.database == database)
            .map(|r| r.schema)
            .collect();
        schemas.dedup();
        Ok(schemas)
    }

    async fn list_tables(&self, database: &str, schema: &str) -> DomainResult<Vec<String>> {
        Ok(self
            .refs()
            .into_iter()
            .filter(|r| r.database == database && r.schema == schema)
            .map(|r| r.table)
            .collect())
    }

    async fn list_columns(&self, table: &TableRef) -> DomainResult<Vec<ColumnInfo>> {
        self.columns
            .get(&table.to_string())
            .cloned()
            .ok_or_else(|| DomainError::not_found("table", table))
    }
}

/// App state over `db` with the given fakes.
pub fn test_state(
    db: DatabaseConnection,
    procedures: Arc<MockProcedures>,
    catalog: MockCatalog,
) -> AppState {
    AppState {
        config: Arc::new(AppConfig {
            profile: "test".to_string(),
            database_url: "sqlite::memory:".to_string(),
            ..Default::default()
        }),
        db,
        procedures,
        catalog: Arc::new(catalog),
    }
}
