//! # Repository Layer
//!
//! Repositories wrap SeaORM access to the five DataFlow tables. Each borrows the
//! shared connection for the duration of a request.

pub mod column_profile;
pub mod job_execution;
pub mod quality_check;
pub mod quality_check_result;
pub mod transformation_job;

pub use column_profile::ColumnProfileRepository;
pub use job_execution::JobExecutionRepository;
pub use quality_check::QualityCheckRepository;
pub use quality_check_result::QualityCheckResultRepository;
pub use transformation_job::TransformationJobRepository;
