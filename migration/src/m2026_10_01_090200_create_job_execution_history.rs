//! Migration to create the job_execution_history table.
//!
//! Append-only ledger of transformation job runs. There is no foreign
//! key to transformation_jobs: deleting a job leaves its history in place.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobExecutionHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobExecutionHistory::ExecutionId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobExecutionHistory::JobId).uuid().not_null())
                    .col(
                        ColumnDef::new(JobExecutionHistory::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(JobExecutionHistory::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(JobExecutionHistory::Status)
                            .text()
                            .not_null()
                            .default("RUNNING"),
                    )
                    .col(
                        ColumnDef::new(JobExecutionHistory::RowsProcessed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JobExecutionHistory::RowsAffected)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JobExecutionHistory::ExecutionTimeSeconds)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(JobExecutionHistory::ErrorMessage)
                            .text()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_execution_history_job_started")
                    .table(JobExecutionHistory::Table)
                    .col(JobExecutionHistory::JobId)
                    .col(JobExecutionHistory::StartedAt)
                    .to_owned(),
            )
            .await?;

        // Dashboard windows filter on started_at alone
        manager
            .create_index(
                Index::create()
                    .name("idx_job_execution_history_started_at")
                    .table(JobExecutionHistory::Table)
                    .col(JobExecutionHistory::StartedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_job_execution_history_job_started")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_job_execution_history_started_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(JobExecutionHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JobExecutionHistory {
    Table,
    ExecutionId,
    JobId,
    StartedAt,
    CompletedAt,
    Status,
    RowsProcessed,
    RowsAffected,
    ExecutionTimeSeconds,
    ErrorMessage,
}
