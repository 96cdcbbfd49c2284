//! QualityCheckResult entity model
//!
//! Append-only ledger of check evaluations.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::quality_check_config::Severity;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "quality_check_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub result_id: Uuid,

    pub check_id: Uuid,

    pub status: CheckStatus,

    pub records_checked: i64,

    pub records_failed: i64,

    /// failed / checked, 0 when nothing was checked
    pub failure_rate: f64,

    pub execution_time: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quality_check_config::Entity",
        from = "Column::CheckId",
        to = "super::quality_check_config::Column::CheckId"
    )]
    QualityCheck,
}

impl Related<super::quality_check_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QualityCheck.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum CheckStatus {
    #[sea_orm(string_value = "PASSED")]
    #[serde(rename = "PASSED")]
    Passed,

    #[sea_orm(string_value = "FAILED")]
    #[serde(rename = "FAILED")]
    Failed,

    #[sea_orm(string_value = "WARNING")]
    #[serde(rename = "WARNING")]
    Warning,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Warning => "WARNING",
        }
    }

    /// Any failing record fails the check; severity decides how loudly.
    pub fn derive(records_failed: i64, severity: Severity) -> Self {
        if records_failed <= 0 {
            return Self::Passed;
        }
        match severity {
            Severity::Info | Severity::Warning => Self::Warning,
            Severity::Error | Severity::Critical => Self::Failed,
        }
    }
}

pub fn failure_rate(records_checked: i64, records_failed: i64) -> f64 {
    if records_checked <= 0 {
        0.0
    } else {
        records_failed as f64 / records_checked as f64
    }
}

/// Result row joined with the check that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QualityCheckResultResponse {
    pub result_id: Uuid,
    pub check_id: Uuid,
    pub check_name: Option<String>,
    pub table_name: Option<String>,
    pub severity: Option<Severity>,
    pub status: CheckStatus,
    pub records_checked: i64,
    pub records_failed: i64,
    pub failure_rate: f64,
    #[schema(value_type = String, example = "2026-10-01T09:00:00Z")]
    pub execution_time: DateTimeWithTimeZone,
}

impl QualityCheckResultResponse {
    pub fn new(model: Model, check: Option<super::quality_check_config::Model>) -> Self {
        let (check_name, table_name, severity) = match check {
            Some(check) => (
                Some(check.check_name),
                Some(check.table_name),
                Some(check.severity),
            ),
            None => (None, None, None),
        };
        Self {
            result_id: model.result_id,
            check_id: model.check_id,
            check_name,
            table_name,
            severity,
            status: model.status,
            records_checked: model.records_checked,
            records_failed: model.records_failed,
            failure_rate: model.failure_rate,
            execution_time: model.execution_time,
        }
    }
}
