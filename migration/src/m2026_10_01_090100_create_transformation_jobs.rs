//! Migration to create the transformation_jobs table.
//!
//! Registry of transformation job definitions. The configuration column holds the
//! JSON payload the platform procedures consume for the job's transformation type.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransformationJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransformationJobs::JobId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TransformationJobs::JobName).text().not_null())
                    .col(
                        ColumnDef::new(TransformationJobs::SourceTable)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransformationJobs::TargetTable)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransformationJobs::TransformationType)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransformationJobs::TransformationConfig)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransformationJobs::Schedule).text().null())
                    .col(
                        ColumnDef::new(TransformationJobs::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TransformationJobs::LastRun)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TransformationJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Registry listing is newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_transformation_jobs_created_at")
                    .table(TransformationJobs::Table)
                    .col(TransformationJobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_transformation_jobs_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(TransformationJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TransformationJobs {
    Table,
    JobId,
    JobName,
    SourceTable,
    TargetTable,
    TransformationType,
    TransformationConfig,
    Schedule,
    IsActive,
    LastRun,
    CreatedAt,
}
