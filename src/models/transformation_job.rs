//! TransformationJob entity model
//!
//! Registry of named transformation job definitions. The stored configuration is
//! the JSON document the platform procedures consume, and its shape always
//! matches the job's transformation type.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transformation_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub job_id: Uuid,

    pub job_name: String,

    /// Fully-qualified source table (`DB.SCHEMA.TABLE`)
    pub source_table: String,

    /// Fully-qualified target table (`DB.SCHEMA.TABLE`)
    pub target_table: String,

    pub transformation_type: TransformationType,

    #[sea_orm(column_type = "JsonBinary")]
    pub transformation_config: JsonValue,

    /// Opaque cron expression; nothing in this service triggers on it
    pub schedule: Option<String>,

    pub is_active: bool,

    /// Set by every run regardless of outcome
    pub last_run: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::job_execution::Entity")]
    Executions,
}

impl Related<super::job_execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Executions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the stored configuration according to the job's type.
    pub fn config(&self) -> DomainResult<TransformationConfig> {
        TransformationConfig::parse(&self.transformation_type, &self.transformation_config)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TransformationType {
    #[sea_orm(string_value = "DEDUPLICATE")]
    #[serde(rename = "DEDUPLICATE")]
    Deduplicate,

    #[sea_orm(string_value = "CLEAN_NULLS")]
    #[serde(rename = "CLEAN_NULLS")]
    CleanNulls,

    #[sea_orm(string_value = "STANDARDIZE")]
    #[serde(rename = "STANDARDIZE")]
    Standardize,
}

impl TransformationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deduplicate => "DEDUPLICATE",
            Self::CleanNulls => "CLEAN_NULLS",
            Self::Standardize => "STANDARDIZE",
        }
    }
}

/// How CLEAN_NULLS treats missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NullStrategy {
    Drop,
    FillZero,
    FillMean,
    FillMode,
}

impl NullStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "DROP",
            Self::FillZero => "FILL_ZERO",
            Self::FillMean => "FILL_MEAN",
            Self::FillMode => "FILL_MODE",
        }
    }
}

/// Text operation applied by STANDARDIZE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StandardizeOperation {
    Uppercase,
    Lowercase,
    Trim,
    RemoveSpecialChars,
}

impl StandardizeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uppercase => "UPPERCASE",
            Self::Lowercase => "LOWERCASE",
            Self::Trim => "TRIM",
            Self::RemoveSpecialChars => "REMOVE_SPECIAL_CHARS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeduplicateConfig {
    pub key_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CleanNullsConfig {
    pub strategy: NullStrategy,
    /// `None` applies the strategy to every column
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StandardizeConfig {
    pub column_name: String,
    pub operation: StandardizeOperation,
}

/// Transformation configuration, one variant per [`TransformationType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TransformationConfig {
    Deduplicate(DeduplicateConfig),
    CleanNulls(CleanNullsConfig),
    Standardize(StandardizeConfig),
}

impl TransformationConfig {
    pub fn transformation_type(&self) -> TransformationType {
        match self {
            Self::Deduplicate(_) => TransformationType::Deduplicate,
            Self::CleanNulls(_) => TransformationType::CleanNulls,
            Self::Standardize(_) => TransformationType::Standardize,
        }
    }

    /// Decode `raw` as the configuration shape required by `transformation_type`
    /// and validate it.
    pub fn parse(
        transformation_type: &TransformationType,
        raw: &JsonValue,
    ) -> DomainResult<Self> {
        let shape_error = |err: serde_json::Error| {
            DomainError::invalid_field(
                "transformation_config",
                format!(
                    "configuration does not match transformation type {}: {}",
                    transformation_type.as_str(),
                    err
                ),
            )
        };

        let config = match transformation_type {
            TransformationType::Deduplicate => {
                Self::Deduplicate(serde_json::from_value(raw.clone()).map_err(shape_error)?)
            }
            TransformationType::CleanNulls => {
                Self::CleanNulls(serde_json::from_value(raw.clone()).map_err(shape_error)?)
            }
            TransformationType::Standardize => {
                Self::Standardize(serde_json::from_value(raw.clone()).map_err(shape_error)?)
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DomainResult<()> {
        match self {
            Self::Deduplicate(cfg) => {
                if cfg.key_columns.is_empty() {
                    return Err(DomainError::invalid_field(
                        "key_columns",
                        "DEDUPLICATE requires at least one key column",
                    ));
                }
                if cfg.key_columns.iter().any(|c| c.trim().is_empty()) {
                    return Err(DomainError::invalid_field(
                        "key_columns",
                        "key column names cannot be blank",
                    ));
                }
            }
            Self::CleanNulls(cfg) => {
                if let Some(columns) = &cfg.columns {
                    if columns.is_empty() {
                        return Err(DomainError::invalid_field(
                            "columns",
                            "CLEAN_NULLS column subset cannot be empty; omit it to clean all columns",
                        ));
                    }
                    if columns.iter().any(|c| c.trim().is_empty()) {
                        return Err(DomainError::invalid_field(
                            "columns",
                            "column names cannot be blank",
                        ));
                    }
                }
            }
            Self::Standardize(cfg) => {
                if cfg.column_name.trim().is_empty() {
                    return Err(DomainError::invalid_field(
                        "column_name",
                        "STANDARDIZE requires a column",
                    ));
                }
            }
        }
        Ok(())
    }

    /// JSON document persisted in `transformation_config`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Deduplicate(cfg) => serde_json::json!({ "key_columns": cfg.key_columns }),
            Self::CleanNulls(cfg) => serde_json::json!({
                "strategy": cfg.strategy.as_str(),
                "columns": cfg.columns,
            }),
            Self::Standardize(cfg) => serde_json::json!({
                "column_name": cfg.column_name,
                "operation": cfg.operation.as_str(),
            }),
        }
    }
}

/// Public representation of a job.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransformationJobResponse {
    pub job_id: Uuid,
    pub job_name: String,
    pub source_table: String,
    pub target_table: String,
    pub transformation_type: TransformationType,
    pub transformation_config: JsonValue,
    pub schedule: Option<String>,
    pub is_active: bool,
    #[schema(value_type = Option<String>, example = "2026-10-01T09:00:00Z")]
    pub last_run: Option<DateTimeWithTimeZone>,
    #[schema(value_type = String, example = "2026-10-01T08:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<Model> for TransformationJobResponse {
    fn from(model: Model) -> Self {
        Self {
            job_id: model.job_id,
            job_name: model.job_name,
            source_table: model.source_table,
            target_table: model.target_table,
            transformation_type: model.transformation_type,
            transformation_config: model.transformation_config,
            schedule: model.schedule,
            is_active: model.is_active,
            last_run: model.last_run,
            created_at: model.created_at,
        }
    }
}
