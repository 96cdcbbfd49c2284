//! ColumnProfile entity model
//!
//! Per-column statistics in `data_profile_results`, one row per (table, column).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_profile_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub profile_id: Uuid,
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub row_count: i64,
    pub null_count: i64,
    pub null_percentage: f64,
    pub distinct_count: i64,
    pub distinct_percentage: f64,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub avg_value: Option<f64>,
    pub profiled_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Column statistics as returned by the profiling procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ColumnStatistics {
    pub column_name: String,
    pub data_type: String,
    pub row_count: i64,
    pub null_count: i64,
    pub null_percentage: f64,
    pub distinct_count: i64,
    pub distinct_percentage: f64,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub avg_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ColumnProfileResponse {
    pub table_name: String,
    #[serde(flatten)]
    pub statistics: ColumnStatistics,
    #[schema(value_type = String, example = "2026-10-01T09:00:00Z")]
    pub profiled_at: DateTimeWithTimeZone,
}

impl From<Model> for ColumnProfileResponse {
    fn from(model: Model) -> Self {
        Self {
            table_name: model.table_name,
            statistics: ColumnStatistics {
                column_name: model.column_name,
                data_type: model.data_type,
                row_count: model.row_count,
                null_count: model.null_count,
                null_percentage: model.null_percentage,
                distinct_count: model.distinct_count,
                distinct_percentage: model.distinct_percentage,
                min_value: model.min_value,
                max_value: model.max_value,
                avg_value: model.avg_value,
            },
            profiled_at: model.profiled_at,
        }
    }
}

/// Table-level rollup of a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileSummary {
    pub table_name: String,
    pub row_count: i64,
    pub total_columns: usize,
    /// null% > 50
    pub high_null_columns: usize,
    /// null% > 20
    pub moderate_null_columns: usize,
    /// distinct% < 1
    pub constant_like_columns: usize,
    /// distinct% < 5
    pub low_cardinality_columns: usize,
    /// distinct% > 95
    pub key_candidates: Vec<String>,
}

impl ProfileSummary {
    pub fn from_profiles(table_name: &str, profiles: &[Model]) -> Self {
        Self {
            table_name: table_name.to_string(),
            row_count: profiles.iter().map(|p| p.row_count).max().unwrap_or(0),
            total_columns: profiles.len(),
            high_null_columns: profiles.iter().filter(|p| p.null_percentage > 50.0).count(),
            moderate_null_columns: profiles.iter().filter(|p| p.null_percentage > 20.0).count(),
            constant_like_columns: profiles
                .iter()
                .filter(|p| p.distinct_percentage < 1.0)
                .count(),
            low_cardinality_columns: profiles
                .iter()
                .filter(|p| p.distinct_percentage < 5.0)
                .count(),
            key_candidates: profiles
                .iter()
                .filter(|p| p.distinct_percentage > 95.0)
                .map(|p| p.column_name.clone())
                .collect(),
        }
    }
}
