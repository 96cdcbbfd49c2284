//! Integration tests for the transformation job registry and the job runner.

use anyhow::Result;
use dataflow::job_runner::JobRunner;
use dataflow::models::job_execution::ExecutionStatus;
use dataflow::models::transformation_job::{TransformationConfig, TransformationType};
use dataflow::procedures::{JobRunOutcome, ProcedureError, StatusMessage};
use dataflow::repositories::transformation_job::NewTransformationJob;
use dataflow::repositories::{JobExecutionRepository, TransformationJobRepository};
use dataflow::transformations;
use sea_orm::ConnectionTrait;
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{MockProcedures, setup_test_db};

fn dedup_customers() -> NewTransformationJob {
    NewTransformationJob {
        job_name: "Dedup Customers".to_string(),
        source_table: "DB.SCH.CUSTOMERS".to_string(),
        target_table: "DB.SCH.CUSTOMERS_DEDUP".to_string(),
        transformation_type: TransformationType::Deduplicate,
        transformation_config: json!({"key_columns": ["EMAIL"]}),
        schedule: None,
        is_active: true,
    }
}

#[tokio::test]
async fn dedup_customers_job_runs_to_a_terminal_execution() -> Result<()> {
    let db = setup_test_db().await?;
    let procedures = MockProcedures::new();
    let jobs = TransformationJobRepository::new(&db);

    let job = jobs.create(dedup_customers()).await?;
    assert!(job.is_active);
    assert_eq!(job.transformation_config, json!({"key_columns": ["EMAIL"]}));
    assert_eq!(jobs.counts().await?.active, 1);

    let report = JobRunner::new(&db, procedures.as_ref()).run(job.job_id).await?;

    assert_eq!(report.execution.status, ExecutionStatus::Success);
    assert!(report.execution.completed_at.is_some());
    assert_eq!(report.execution.rows_processed, 100);
    assert_eq!(report.execution.job_name.as_deref(), Some("Dedup Customers"));
    assert_eq!(report.message.as_deref(), Some("Job completed"));

    let history = JobExecutionRepository::new(&db)
        .list_for_job(job.job_id, 10)
        .await?;
    assert_eq!(history.len(), 1);
    assert!(history[0].status.is_terminal());

    assert!(jobs.get(job.job_id).await?.last_run.is_some());
    Ok(())
}

#[tokio::test]
async fn failed_run_records_platform_message_and_last_run() -> Result<()> {
    let db = setup_test_db().await?;
    let procedures = MockProcedures::new();
    procedures.push_job_run(Err(ProcedureError::failed(
        "execute_transformation_job",
        "Table DB.SCH.CUSTOMERS does not exist",
    )));

    let job = TransformationJobRepository::new(&db)
        .create(dedup_customers())
        .await?;
    let report = JobRunner::new(&db, procedures.as_ref()).run(job.job_id).await?;

    assert_eq!(report.execution.status, ExecutionStatus::Failed);
    assert_eq!(
        report.execution.error_message.as_deref(),
        Some("Table DB.SCH.CUSTOMERS does not exist")
    );
    assert!(report.execution.completed_at.is_some());
    assert!(report.message.is_none());

    let job = TransformationJobRepository::new(&db).get(job.job_id).await?;
    assert!(job.last_run.is_some());
    Ok(())
}

#[tokio::test]
async fn each_run_appends_an_execution() -> Result<()> {
    let db = setup_test_db().await?;
    let procedures = MockProcedures::new();
    procedures.push_job_run(Ok(JobRunOutcome {
        message: "first".to_string(),
        rows_processed: 5,
        rows_affected: 1,
    }));

    let job = TransformationJobRepository::new(&db)
        .create(dedup_customers())
        .await?;
    let runner = JobRunner::new(&db, procedures.as_ref());
    runner.run(job.job_id).await?;
    runner.run(job.job_id).await?;

    let history = JobExecutionRepository::new(&db)
        .list_for_job(job.job_id, 10)
        .await?;
    assert_eq!(history.len(), 2);
    assert_eq!(
        procedures.calls(),
        vec![
            format!("execute_transformation_job({})", job.job_id),
            format!("execute_transformation_job({})", job.job_id),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn completion_is_retried_once() -> Result<()> {
    let db = setup_test_db().await?;
    let procedures = MockProcedures::new();
    let job = TransformationJobRepository::new(&db)
        .create(dedup_customers())
        .await?;

    // The first update of an execution is silently skipped, the second goes through.
    db.execute_unprepared(
        "CREATE TABLE skip_once (marker INTEGER);
         INSERT INTO skip_once VALUES (1);
         CREATE TRIGGER skip_first_completion BEFORE UPDATE ON job_execution_history
         WHEN EXISTS (SELECT 1 FROM skip_once)
         BEGIN
             DELETE FROM skip_once;
             SELECT RAISE(IGNORE);
         END;",
    )
    .await?;

    let report = JobRunner::new(&db, procedures.as_ref()).run(job.job_id).await?;

    assert_eq!(report.execution.status, ExecutionStatus::Success);
    assert!(report.execution.completed_at.is_some());
    Ok(())
}

#[tokio::test]
async fn failed_completion_surfaces_and_still_stamps_last_run() -> Result<()> {
    let db = setup_test_db().await?;
    let procedures = MockProcedures::new();
    let jobs = TransformationJobRepository::new(&db);
    let job = jobs.create(dedup_customers()).await?;

    db.execute_unprepared(
        "CREATE TRIGGER reject_completion BEFORE UPDATE ON job_execution_history
         BEGIN
             SELECT RAISE(ABORT, 'history is read-only');
         END;",
    )
    .await?;

    let result = JobRunner::new(&db, procedures.as_ref()).run(job.job_id).await;
    assert!(result.is_err());

    let history = JobExecutionRepository::new(&db)
        .list_for_job(job.job_id, 10)
        .await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ExecutionStatus::Running);
    assert!(jobs.get(job.job_id).await?.last_run.is_some());
    Ok(())
}

#[tokio::test]
async fn unknown_job_is_not_found_and_calls_nothing() -> Result<()> {
    let db = setup_test_db().await?;
    let procedures = MockProcedures::new();

    let err = JobRunner::new(&db, procedures.as_ref())
        .run(uuid::Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, dataflow::error::DomainError::NotFound { .. }));
    assert!(procedures.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn set_active_twice_is_idempotent() -> Result<()> {
    let db = setup_test_db().await?;
    let jobs = TransformationJobRepository::new(&db);
    let job = jobs
        .create(NewTransformationJob {
            is_active: false,
            ..dedup_customers()
        })
        .await?;

    let first = jobs.set_active(job.job_id, true).await?;
    let second = jobs.set_active(job.job_id, true).await?;

    assert!(first.is_active);
    assert_eq!(first, second);
    assert_eq!(jobs.count_active().await?, 1);
    Ok(())
}

#[tokio::test]
async fn delete_keeps_execution_history() -> Result<()> {
    let db = setup_test_db().await?;
    let procedures = MockProcedures::new();
    let jobs = TransformationJobRepository::new(&db);
    let job = jobs.create(dedup_customers()).await?;
    JobRunner::new(&db, procedures.as_ref()).run(job.job_id).await?;

    jobs.delete(job.job_id).await?;
    assert!(jobs.find(job.job_id).await?.is_none());
    assert!(jobs.delete(job.job_id).await.is_err());

    let recent = JobExecutionRepository::new(&db).list_recent(10).await?;
    assert_eq!(recent.len(), 1);
    assert!(recent[0].1.is_none());
    Ok(())
}

#[tokio::test]
async fn list_returns_newest_job_first() -> Result<()> {
    let db = setup_test_db().await?;
    let jobs = TransformationJobRepository::new(&db);

    // Name order would put the older job first.
    jobs.create(NewTransformationJob {
        job_name: "Alpha".to_string(),
        ..dedup_customers()
    })
    .await?;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    jobs.create(NewTransformationJob {
        job_name: "Zeta".to_string(),
        ..dedup_customers()
    })
    .await?;

    let names: Vec<_> = jobs.list().await?.into_iter().map(|j| j.job_name).collect();
    assert_eq!(names, vec!["Zeta".to_string(), "Alpha".to_string()]);
    Ok(())
}

#[tokio::test]
async fn invalid_definitions_are_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let jobs = TransformationJobRepository::new(&db);

    let empty_name = jobs
        .create(NewTransformationJob {
            job_name: "  ".to_string(),
            ..dedup_customers()
        })
        .await;
    assert!(empty_name.unwrap_err().is_validation());

    let wrong_shape = jobs
        .create(NewTransformationJob {
            transformation_type: TransformationType::Standardize,
            ..dedup_customers()
        })
        .await;
    assert!(wrong_shape.unwrap_err().is_validation());

    assert_eq!(jobs.counts().await?.total, 0);
    Ok(())
}

#[tokio::test]
async fn adhoc_transformation_dispatches_by_type() -> Result<()> {
    let procedures = MockProcedures::new();
    procedures.push_status(Ok(StatusMessage::new("Standardized 42 rows")));

    let config = TransformationConfig::parse(
        &TransformationType::Standardize,
        &json!({"column_name": "EMAIL", "operation": "LOWERCASE"}),
    )?;
    let status =
        transformations::apply(procedures.as_ref(), "DB.SCH.A", "DB.SCH.B", &config).await?;

    assert_eq!(status.message, "Standardized 42 rows");
    assert_eq!(
        procedures.calls(),
        vec!["standardize_text_column(DB.SCH.A, DB.SCH.B, EMAIL, LOWERCASE)".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn adhoc_transformation_surfaces_platform_error() -> Result<()> {
    let procedures = MockProcedures::new();
    procedures.push_status(Err(ProcedureError::failed(
        "clean_null_values",
        "permission denied",
    )));

    let config = TransformationConfig::parse(
        &TransformationType::CleanNulls,
        &json!({"strategy": "FILL_ZERO", "columns": ["AGE"]}),
    )?;
    let err = transformations::apply(procedures.as_ref(), "DB.SCH.A", "DB.SCH.B", &config)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "permission denied");
    Ok(())
}
