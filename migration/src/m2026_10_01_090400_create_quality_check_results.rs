//! Migration to create the quality_check_results table.
//!
//! Append-only ledger of check evaluations, one row per check per run.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QualityCheckResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QualityCheckResults::ResultId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QualityCheckResults::CheckId).uuid().not_null())
                    .col(ColumnDef::new(QualityCheckResults::Status).text().not_null())
                    .col(
                        ColumnDef::new(QualityCheckResults::RecordsChecked)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(QualityCheckResults::RecordsFailed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(QualityCheckResults::FailureRate)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(QualityCheckResults::ExecutionTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quality_check_results_execution_time")
                    .table(QualityCheckResults::Table)
                    .col(QualityCheckResults::ExecutionTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quality_check_results_check_id")
                    .table(QualityCheckResults::Table)
                    .col(QualityCheckResults::CheckId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_quality_check_results_execution_time")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_quality_check_results_check_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(QualityCheckResults::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QualityCheckResults {
    Table,
    ResultId,
    CheckId,
    Status,
    RecordsChecked,
    RecordsFailed,
    FailureRate,
    ExecutionTime,
}
