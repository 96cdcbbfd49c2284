//! # DataFlow Main Entry Point

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dataflow::{
    catalog::SqlCatalog,
    config::ConfigLoader,
    db::{init_pool, run_migrations},
    procedures::sql::SqlProcedures,
    server::{AppState, run_server},
    telemetry::init_tracing,
};

#[derive(Parser)]
#[command(name = "dataflow")]
#[command(about = "Control plane for profiling, transformation jobs and data quality checks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations and serve the HTTP API (default)
    Serve,

    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!(profile = %config.profile, config = %redacted_json, "Configuration loaded");
    }

    let db = init_pool(&config).await?;
    run_migrations(&db).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => Ok(()),
        Commands::Serve => {
            let procedures = SqlProcedures::new(db.clone(), &config.procedures)?;
            let state = AppState {
                procedures: Arc::new(procedures),
                catalog: Arc::new(SqlCatalog::new(db.clone())),
                config: Arc::new(config),
                db,
            };
            run_server(state).await
        }
    }
}
