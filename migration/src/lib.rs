//! Database migrations for the DataFlow service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_10_01_090000_create_data_profile_results;
mod m2026_10_01_090100_create_transformation_jobs;
mod m2026_10_01_090200_create_job_execution_history;
mod m2026_10_01_090300_create_quality_check_configs;
mod m2026_10_01_090400_create_quality_check_results;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_10_01_090000_create_data_profile_results::Migration),
            Box::new(m2026_10_01_090100_create_transformation_jobs::Migration),
            Box::new(m2026_10_01_090200_create_job_execution_history::Migration),
            Box::new(m2026_10_01_090300_create_quality_check_configs::Migration),
            Box::new(m2026_10_01_090400_create_quality_check_results::Migration),
        ]
    }
}
