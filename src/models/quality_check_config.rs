//! QualityCheckConfig entity model
//!
//! Check definitions evaluated against a table (or one of its columns).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "quality_check_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub check_id: Uuid,

    pub check_name: String,

    pub table_name: String,

    /// Absent for table-level checks
    pub column_name: Option<String>,

    pub check_type: CheckType,

    #[sea_orm(column_type = "JsonBinary")]
    pub check_parameters: JsonValue,

    pub severity: Severity,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::quality_check_result::Entity")]
    Results,
}

impl Related<super::quality_check_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Results.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn parameters(&self) -> DomainResult<CheckParameters> {
        CheckParameters::parse(&self.check_type, &self.check_parameters)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum CheckType {
    #[sea_orm(string_value = "NULL_CHECK")]
    #[serde(rename = "NULL_CHECK")]
    NullCheck,

    #[sea_orm(string_value = "DUPLICATE_CHECK")]
    #[serde(rename = "DUPLICATE_CHECK")]
    DuplicateCheck,

    #[sea_orm(string_value = "RANGE_CHECK")]
    #[serde(rename = "RANGE_CHECK")]
    RangeCheck,

    #[sea_orm(string_value = "PATTERN_CHECK")]
    #[serde(rename = "PATTERN_CHECK")]
    PatternCheck,

    #[sea_orm(string_value = "UNIQUENESS_CHECK")]
    #[serde(rename = "UNIQUENESS_CHECK")]
    UniquenessCheck,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NullCheck => "NULL_CHECK",
            Self::DuplicateCheck => "DUPLICATE_CHECK",
            Self::RangeCheck => "RANGE_CHECK",
            Self::PatternCheck => "PATTERN_CHECK",
            Self::UniquenessCheck => "UNIQUENESS_CHECK",
        }
    }
}

/// Ordered INFO < WARNING < ERROR < CRITICAL.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Severity {
    #[sea_orm(string_value = "INFO")]
    #[serde(rename = "INFO")]
    Info,

    #[sea_orm(string_value = "WARNING")]
    #[serde(rename = "WARNING")]
    #[default]
    Warning,

    #[sea_orm(string_value = "ERROR")]
    #[serde(rename = "ERROR")]
    Error,

    #[sea_orm(string_value = "CRITICAL")]
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Validated check parameters.
///
/// Range bounds keep the caller's JSON numbers so `0` is stored as `0`, not `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckParameters {
    Range { min_value: Number, max_value: Number },
    Pattern { pattern: String },
    Empty,
}

impl CheckParameters {
    pub fn parse(check_type: &CheckType, raw: &JsonValue) -> DomainResult<Self> {
        match check_type {
            CheckType::RangeCheck => {
                let min_value = numeric_param(raw, "min_value")?;
                let max_value = numeric_param(raw, "max_value")?;
                let (min, max) = (number_as_f64(&min_value), number_as_f64(&max_value));
                if min > max {
                    return Err(DomainError::invalid_field(
                        "check_parameters",
                        format!(
                            "RANGE_CHECK min_value ({}) must not exceed max_value ({})",
                            min_value, max_value
                        ),
                    ));
                }
                Ok(Self::Range {
                    min_value,
                    max_value,
                })
            }
            CheckType::PatternCheck => {
                let pattern = raw
                    .get("pattern")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string)
                    .unwrap_or_default();
                if pattern.trim().is_empty() {
                    return Err(DomainError::invalid_field(
                        "check_parameters",
                        "PATTERN_CHECK requires a non-empty pattern",
                    ));
                }
                regex::Regex::new(&pattern).map_err(|err| {
                    DomainError::invalid_field(
                        "check_parameters",
                        format!("PATTERN_CHECK pattern is not a valid regular expression: {}", err),
                    )
                })?;
                Ok(Self::Pattern { pattern })
            }
            CheckType::NullCheck | CheckType::DuplicateCheck | CheckType::UniquenessCheck => {
                Ok(Self::Empty)
            }
        }
    }

    /// JSON document persisted in `check_parameters`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Range {
                min_value,
                max_value,
            } => json!({ "min_value": min_value, "max_value": max_value }),
            Self::Pattern { pattern } => json!({ "pattern": pattern }),
            Self::Empty => json!({}),
        }
    }

    /// Range bounds as floats, if this is a range check.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Range {
                min_value,
                max_value,
            } => Some((number_as_f64(min_value), number_as_f64(max_value))),
            _ => None,
        }
    }
}

fn numeric_param(raw: &JsonValue, key: &'static str) -> DomainResult<Number> {
    match raw.get(key) {
        Some(JsonValue::Number(n)) => Ok(n.clone()),
        Some(_) => Err(DomainError::invalid_field(
            "check_parameters",
            format!("RANGE_CHECK {} must be numeric", key),
        )),
        None => Err(DomainError::invalid_field(
            "check_parameters",
            format!("RANGE_CHECK requires {}", key),
        )),
    }
}

fn number_as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

/// Public representation of a check definition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QualityCheckResponse {
    pub check_id: Uuid,
    pub check_name: String,
    pub table_name: String,
    pub column_name: Option<String>,
    pub check_type: CheckType,
    pub check_parameters: JsonValue,
    pub severity: Severity,
    pub is_active: bool,
    #[schema(value_type = String, example = "2026-10-01T08:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<Model> for QualityCheckResponse {
    fn from(model: Model) -> Self {
        Self {
            check_id: model.check_id,
            check_name: model.check_name,
            table_name: model.table_name,
            column_name: model.column_name,
            check_type: model.check_type,
            check_parameters: model.check_parameters,
            severity: model.severity,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}
