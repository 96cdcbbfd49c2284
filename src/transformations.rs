//! One-shot transformations that do not create a registry entry.

use metrics::counter;
use tracing::instrument;

use crate::error::{DomainError, DomainResult};
use crate::models::transformation_job::{TransformationConfig, TransformationType};
use crate::procedures::{RemoteProcedures, StatusMessage};

/// Validate `config` like a job definition, then dispatch it to the matching procedure.
#[instrument(skip(procedures, config), fields(transformation_type = config.transformation_type().as_str()))]
pub async fn apply(
    procedures: &dyn RemoteProcedures,
    source: &str,
    target: &str,
    config: &TransformationConfig,
) -> DomainResult<StatusMessage> {
    if source.trim().is_empty() {
        return Err(DomainError::invalid_field("source_table", "source_table is required"));
    }
    if target.trim().is_empty() {
        return Err(DomainError::invalid_field("target_table", "target_table is required"));
    }
    config.validate()?;

    let result = match config {
        TransformationConfig::Deduplicate(cfg) => {
            procedures
                .deduplicate_table(source, target, &cfg.key_columns)
                .await
        }
        TransformationConfig::CleanNulls(cfg) => {
            procedures
                .clean_null_values(source, target, cfg.strategy, cfg.columns.as_deref())
                .await
        }
        TransformationConfig::Standardize(cfg) => {
            procedures
                .standardize_text_column(source, target, &cfg.column_name, cfg.operation)
                .await
        }
    };

    let kind: TransformationType = config.transformation_type();
    counter!(
        "dataflow_adhoc_transformations_total",
        "transformation_type" => kind.as_str(),
        "outcome" => if result.is_ok() { "ok" } else { "failed" }
    )
    .increment(1);

    Ok(result?)
}
