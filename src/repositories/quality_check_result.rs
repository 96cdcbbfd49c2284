//! # Quality Check Result Repository
//!
//! Append-only ledger of check evaluations.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::quality_check_config::{self, Severity};
use crate::models::quality_check_result::{
    ActiveModel, CheckStatus, Column, Entity, Model, failure_rate,
};

/// Filters for the result history view.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    pub status: Option<CheckStatus>,
    pub table_name: Option<String>,
    pub severity: Option<Severity>,
    pub limit: u64,
}

pub struct QualityCheckResultRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> QualityCheckResultRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append the outcome of evaluating `check`. Status and failure rate are
    /// derived from the counts and the check's severity.
    pub async fn record(
        &self,
        check: &quality_check_config::Model,
        records_checked: i64,
        records_failed: i64,
    ) -> DomainResult<Model> {
        if records_checked < 0 || records_failed < 0 {
            return Err(DomainError::validation(format!(
                "record counts cannot be negative (checked={}, failed={})",
                records_checked, records_failed
            )));
        }
        if records_failed > records_checked {
            return Err(DomainError::validation(format!(
                "records_failed ({}) exceeds records_checked ({})",
                records_failed, records_checked
            )));
        }

        let status = CheckStatus::derive(records_failed, check.severity);
        let result = ActiveModel {
            result_id: Set(Uuid::new_v4()),
            check_id: Set(check.check_id),
            status: Set(status),
            records_checked: Set(records_checked),
            records_failed: Set(records_failed),
            failure_rate: Set(failure_rate(records_checked, records_failed)),
            execution_time: Set(Utc::now().fixed_offset()),
        };

        let created = result.insert(self.db).await?;

        tracing::info!(
            check_id = %check.check_id,
            table_name = %check.table_name,
            status = status.as_str(),
            records_checked,
            records_failed,
            "Quality check result recorded"
        );

        Ok(created)
    }

    /// Latest results with their check definitions, newest first
    pub async fn list_recent(
        &self,
        filter: ResultFilter,
    ) -> DomainResult<Vec<(Model, Option<quality_check_config::Model>)>> {
        let mut query = Entity::find().find_also_related(quality_check_config::Entity);

        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status));
        }
        if let Some(table_name) = filter.table_name {
            query = query.filter(quality_check_config::Column::TableName.eq(table_name));
        }
        if let Some(severity) = filter.severity {
            query = query.filter(quality_check_config::Column::Severity.eq(severity));
        }

        let rows = query
            .order_by_desc(Column::ExecutionTime)
            .limit(filter.limit)
            .all(self.db)
            .await?;
        Ok(rows)
    }

    /// Results recorded at or after `since`, oldest first
    pub async fn list_since(&self, since: DateTimeWithTimeZone) -> DomainResult<Vec<Model>> {
        Ok(Entity::find()
            .filter(Column::ExecutionTime.gte(since))
            .order_by_asc(Column::ExecutionTime)
            .all(self.db)
            .await?)
    }

    pub async fn count_since(&self, since: DateTimeWithTimeZone) -> DomainResult<u64> {
        Ok(Entity::find()
            .filter(Column::ExecutionTime.gte(since))
            .count(self.db)
            .await?)
    }
}
