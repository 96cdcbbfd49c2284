//! Migration to create the data_profile_results table.
//!
//! One row per profiled (table, column). Re-profiling a table replaces its rows,
//! so the pair is unique.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DataProfileResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataProfileResults::ProfileId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DataProfileResults::TableName).text().not_null())
                    .col(ColumnDef::new(DataProfileResults::ColumnName).text().not_null())
                    .col(ColumnDef::new(DataProfileResults::DataType).text().not_null())
                    .col(
                        ColumnDef::new(DataProfileResults::RowCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DataProfileResults::NullCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DataProfileResults::NullPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(DataProfileResults::DistinctCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DataProfileResults::DistinctPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(DataProfileResults::MinValue).text().null())
                    .col(ColumnDef::new(DataProfileResults::MaxValue).text().null())
                    .col(ColumnDef::new(DataProfileResults::AvgValue).double().null())
                    .col(
                        ColumnDef::new(DataProfileResults::ProfiledAt)
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
                    .name("uq_data_profile_results_table_column")
                    .table(DataProfileResults::Table)
                    .col(DataProfileResults::TableName)
                    .col(DataProfileResults::ColumnName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_data_profile_results_table_column")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DataProfileResults::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DataProfileResults {
    Table,
    ProfileId,
    TableName,
    ColumnName,
    DataType,
    RowCount,
    NullCount,
    NullPercentage,
    DistinctCount,
    DistinctPercentage,
    MinValue,
    MaxValue,
    AvgValue,
    ProfiledAt,
}
