//! # Data Models
//!
//! SeaORM entities for the five DataFlow tables plus their API representations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod column_profile;
pub mod job_execution;
pub mod quality_check_config;
pub mod quality_check_result;
pub mod transformation_job;

pub use column_profile::Entity as ColumnProfile;
pub use job_execution::Entity as JobExecution;
pub use quality_check_config::Entity as QualityCheckConfig;
pub use quality_check_result::Entity as QualityCheckResult;
pub use transformation_job::Entity as TransformationJob;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "dataflow".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
