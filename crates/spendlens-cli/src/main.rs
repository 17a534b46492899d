//! Spendlens CLI - Expense tracking with deduplicated ingestion
//!
//! Usage:
//!   spendlens init                 Initialize database
//!   spendlens seed                 Load demo transactions
//!   spendlens insights --refresh   Recompute all insights
//!   spendlens summary              Spending totals by category

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    tracing::debug!(db = %cli.db.display(), "Starting spendlens");

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Seed => commands::cmd_seed(&cli.db),
        Commands::Status => commands::cmd_status(&cli.db),
        Commands::Transactions { limit } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_transactions(&db, limit)
        }
        Commands::Statements => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_statements(&db)
        }
        Commands::Insights { refresh, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_insights(&db, refresh, json)
        }
        Commands::Summary => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_summary(&db)
        }
        Commands::Subscriptions => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_subscriptions(&db)
        }
        Commands::Trends => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_trends(&db)
        }
        Commands::Anomalies => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_anomalies(&db)
        }
        Commands::Enrich { merchant } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_enrich(&db, &merchant)
        }
    }
}
