//! # DataFlow
//!
//! Control plane for a data platform: table profiling, registered transformation
//! jobs with execution history, data quality checks and the dashboard rollups over
//! them. The heavy lifting runs inside the platform as stored procedures; this
//! crate records what was asked for and what came back.

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod handlers;
pub mod job_runner;
pub mod models;
pub mod procedures;
pub mod profiler;
pub mod quality_runner;
pub mod repositories;
pub mod schedule;
pub mod server;
pub mod telemetry;
pub mod transformations;
pub use migration;
