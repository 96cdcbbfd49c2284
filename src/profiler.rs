//! Table profiling: asks the platform for column statistics and stores them as the
//! table's current profile.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use metrics::counter;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::error::{DomainError, DomainResult};
use crate::models::column_profile::{ColumnProfileResponse, ProfileSummary};
use crate::procedures::{ProcedureError, RemoteProcedures};
use crate::repositories::ColumnProfileRepository;

pub const SAMPLE_SIZE_RANGE: RangeInclusive<u32> = 10..=500;
pub const DEFAULT_SAMPLE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileReport {
    pub message: String,
    pub summary: ProfileSummary,
    pub columns: Vec<ColumnProfileResponse>,
}

#[instrument(skip(db, procedures))]
pub async fn profile_table(
    db: &DatabaseConnection,
    procedures: &dyn RemoteProcedures,
    table_name: &str,
    sample_size: u32,
) -> DomainResult<ProfileReport> {
    if table_name.trim().is_empty() {
        return Err(DomainError::invalid_field("table_name", "table_name is required"));
    }
    if !SAMPLE_SIZE_RANGE.contains(&sample_size) {
        return Err(DomainError::invalid_field(
            "sample_size",
            format!(
                "sample_size must be between {} and {}, got {}",
                SAMPLE_SIZE_RANGE.start(),
                SAMPLE_SIZE_RANGE.end(),
                sample_size
            ),
        ));
    }

    let outcome = match procedures.profile_table(table_name, sample_size).await {
        Ok(outcome) => outcome,
        Err(err) => {
            counter!("dataflow_profile_runs_total", "outcome" => "failed").increment(1);
            return Err(err.into());
        }
    };

    let mut seen = HashSet::new();
    if let Some(duplicate) = outcome
        .columns
        .iter()
        .find(|c| !seen.insert(c.column_name.as_str()))
    {
        counter!("dataflow_profile_runs_total", "outcome" => "failed").increment(1);
        return Err(ProcedureError::malformed(
            "profile_table",
            format!("column {} reported more than once", duplicate.column_name),
        )
        .into());
    }

    let stored = ColumnProfileRepository::new(db)
        .replace_for_table(table_name, outcome.columns)
        .await?;
    counter!("dataflow_profile_runs_total", "outcome" => "ok").increment(1);

    let summary = ProfileSummary::from_profiles(table_name, &stored);
    Ok(ProfileReport {
        message: outcome.message,
        summary,
        columns: stored.into_iter().map(Into::into).collect(),
    })
}
