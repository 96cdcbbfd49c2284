//! Migration to create the quality_check_configs table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QualityCheckConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QualityCheckConfigs::CheckId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QualityCheckConfigs::CheckName)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QualityCheckConfigs::TableName)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QualityCheckConfigs::ColumnName).text().null())
                    .col(
                        ColumnDef::new(QualityCheckConfigs::CheckType)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QualityCheckConfigs::CheckParameters)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QualityCheckConfigs::Severity)
                            .text()
                            .not_null()
                            .default("WARNING"),
                    )
                    .col(
                        ColumnDef::new(QualityCheckConfigs::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(QualityCheckConfigs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Runner selects active checks per table
        manager
            .create_index(
                Index::create()
                    .name("idx_quality_check_configs_table_active")
                    .table(QualityCheckConfigs::Table)
                    .col(QualityCheckConfigs::TableName)
                    .col(QualityCheckConfigs::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_quality_check_configs_table_active")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(QualityCheckConfigs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QualityCheckConfigs {
    Table,
    CheckId,
    CheckName,
    TableName,
    ColumnName,
    CheckType,
    CheckParameters,
    Severity,
    IsActive,
    CreatedAt,
}
