//! # Column Profile Repository
//!
//! Stores the latest profile of each table. Re-profiling replaces the table's
//! rows inside one transaction.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::column_profile::{ActiveModel, Column, ColumnStatistics, Entity, Model};

/// Store-wide profiling totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ProfileStats {
    pub tables_profiled: u64,
    pub columns_analyzed: u64,
    pub avg_null_percentage: f64,
}

pub struct ColumnProfileRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ColumnProfileRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Replace every stored column profile of `table_name` with `columns`.
    pub async fn replace_for_table(
        &self,
        table_name: &str,
        columns: Vec<ColumnStatistics>,
    ) -> DomainResult<Vec<Model>> {
        let profiled_at = Utc::now().fixed_offset();
        let txn = self.db.begin().await?;

        let removed = Entity::delete_many()
            .filter(Column::TableName.eq(table_name))
            .exec(&txn)
            .await?;

        let mut stored = Vec::with_capacity(columns.len());
        for stats in columns {
            let row = ActiveModel {
                profile_id: Set(Uuid::new_v4()),
                table_name: Set(table_name.to_string()),
                column_name: Set(stats.column_name),
                data_type: Set(stats.data_type),
                row_count: Set(stats.row_count),
                null_count: Set(stats.null_count),
                null_percentage: Set(stats.null_percentage),
                distinct_count: Set(stats.distinct_count),
                distinct_percentage: Set(stats.distinct_percentage),
                min_value: Set(stats.min_value),
                max_value: Set(stats.max_value),
                avg_value: Set(stats.avg_value),
                profiled_at: Set(profiled_at),
            };
            stored.push(row.insert(&txn).await?);
        }

        txn.commit().await?;

        tracing::info!(
            table_name = %table_name,
            replaced = removed.rows_affected,
            stored = stored.len(),
            "Table profile replaced"
        );

        stored.sort_by(|a, b| a.column_name.cmp(&b.column_name));
        Ok(stored)
    }

    /// Column profiles of one table ordered by column name
    pub async fn list_for_table(&self, table_name: &str) -> DomainResult<Vec<Model>> {
        Ok(Entity::find()
            .filter(Column::TableName.eq(table_name))
            .order_by_asc(Column::ColumnName)
            .all(self.db)
            .await?)
    }

    pub async fn profiled_tables(&self) -> DomainResult<Vec<String>> {
        let tables: Vec<String> = Entity::find()
            .select_only()
            .column(Column::TableName)
            .distinct()
            .order_by_asc(Column::TableName)
            .into_tuple()
            .all(self.db)
            .await?;
        Ok(tables)
    }

    /// `(table_name, profiled_at)` for every stored column, newest first
    pub async fn profile_timestamps(&self) -> DomainResult<Vec<(String, DateTimeWithTimeZone)>> {
        let rows: Vec<(String, DateTimeWithTimeZone)> = Entity::find()
            .select_only()
            .column(Column::TableName)
            .column(Column::ProfiledAt)
            .order_by_desc(Column::ProfiledAt)
            .order_by_asc(Column::TableName)
            .into_tuple()
            .all(self.db)
            .await?;
        Ok(rows)
    }

    pub async fn count_tables(&self) -> DomainResult<u64> {
        Ok(self.profiled_tables().await?.len() as u64)
    }

    pub async fn stats(&self) -> DomainResult<ProfileStats> {
        let columns_analyzed = Entity::find().count(self.db).await?;
        let tables_profiled = self.count_tables().await?;

        let avg: Option<Option<f64>> = Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(Column::NullPercentage))),
                "avg_null_percentage",
            )
            .into_tuple()
            .one(self.db)
            .await?;

        Ok(ProfileStats {
            tables_profiled,
            columns_analyzed,
            avg_null_percentage: round2(avg.flatten().unwrap_or(0.0)),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn stats(column: &str, null_percentage: f64) -> ColumnStatistics {
        ColumnStatistics {
            column_name: column.to_string(),
            data_type: "NUMBER".to_string(),
            row_count: 100,
            null_count: null_percentage as i64,
            null_percentage,
            distinct_count: 10,
            distinct_percentage: 10.0,
            min_value: Some("1".to_string()),
            max_value: Some("99".to_string()),
            avg_value: Some(50.0),
        }
    }

    #[tokio::test]
    async fn test_replace_is_scoped_to_table() {
        let db = setup_db().await;
        let repo = ColumnProfileRepository::new(&db);

        repo.replace_for_table("DB.SCH.A", vec![stats("X", 0.0)])
            .await
            .unwrap();
        repo.replace_for_table("DB.SCH.B", vec![stats("Y", 0.0), stats("Z", 0.0)])
            .await
            .unwrap();
        repo.replace_for_table("DB.SCH.A", vec![stats("W", 0.0)])
            .await
            .unwrap();

        let a = repo.list_for_table("DB.SCH.A").await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].column_name, "W");
        assert_eq!(repo.list_for_table("DB.SCH.B").await.unwrap().len(), 2);
        assert_eq!(repo.profiled_tables().await.unwrap(), vec!["DB.SCH.A", "DB.SCH.B"]);
    }

    #[tokio::test]
    async fn test_stats() {
        let db = setup_db().await;
        let repo = ColumnProfileRepository::new(&db);

        assert_eq!(repo.stats().await.unwrap(), ProfileStats::default());

        repo.replace_for_table("DB.SCH.A", vec![stats("X", 10.0), stats("Y", 30.0)])
            .await
            .unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.tables_profiled, 1);
        assert_eq!(stats.columns_analyzed, 2);
        assert!((stats.avg_null_percentage - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_profile_timestamps_cover_every_column() {
        let db = setup_db().await;
        let repo = ColumnProfileRepository::new(&db);

        let columns = (0..15).map(|i| stats(&format!("C{:02}", i), 0.0)).collect();
        repo.replace_for_table("DB.SCH.WIDE", columns).await.unwrap();

        let rows = repo.profile_timestamps().await.unwrap();
        assert_eq!(rows.len(), 15);
        assert!(rows.iter().all(|(table, _)| table == "DB.SCH.WIDE"));
    }
}
