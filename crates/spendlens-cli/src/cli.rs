//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendlens - Statement ingestion and spending insights
#[derive(Parser)]
#[command(name = "spendlens")]
#[command(about = "Deduplicated expense tracking with cached insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendlens.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Seed the database with a demo statement
    Seed,

    /// Show database status
    Status,

    /// List recent transactions
    Transactions {
        /// Maximum number to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// List ingested statements
    Statements,

    /// Run the full insight pipeline (cached unless --refresh)
    Insights {
        /// Recompute even when a valid cache exists
        #[arg(long)]
        refresh: bool,

        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show spending totals by category
    Summary,

    /// Detect recurring subscription charges
    Subscriptions,

    /// Analyze spending trends over time
    Trends,

    /// Detect unusual transactions
    Anomalies,

    /// Look up a merchant against the enrichment rules
    Enrich {
        /// Merchant name to classify
        merchant: String,
    },
}
