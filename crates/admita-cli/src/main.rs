//! Admita CLI
//!
//! Grounded admission advisor for the AI and AI Product master's tracks.

use admita_core::error::exit_codes;
use admita_core::{shared, AdmitaError, Config, Database};
use anyhow::Result;
use clap::Parser;

mod app;
mod commands;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        let code = e
            .downcast_ref::<AdmitaError>()
            .map(AdmitaError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Config from ADMITA_CONFIG if set, otherwise the default location
    let config = match std::env::var("ADMITA_CONFIG") {
        Ok(path) => Config::load_from(std::path::Path::new(&path))?,
        Err(_) => Config::load()?,
    };

    // Open database (use ADMITA_DB env var if set, otherwise use default)
    let db_path = std::env::var("ADMITA_DB")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| Database::default_path());
    let db = Database::open(&db_path)?;
    db.initialize()?;
    let db = shared(db);

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, db, &config, cli.verbose).await,
        Commands::Ask(args) => commands::ask::run(args, db, config).await,
        Commands::Summary(args) => commands::ask::run_summary(args, db, config).await,
        Commands::Compare => commands::ask::run_compare(db, config).await,
        Commands::Chat => commands::chat::run(db, config).await,
        Commands::Status => commands::status::run(db, cli.format).await,
    }
}
