//! Spendlens Core Library
//!
//! Shared functionality for the Spendlens expense tracker:
//! - Deduplicating transaction store with self-healing migrations
//! - Statement ingestion behind pluggable converter/extraction agents
//! - Insight tools: category summary, subscriptions, trends, anomalies
//! - Rule-based merchant enrichment
//! - TTL-cached insight pipeline

pub mod agents;
pub mod db;
pub mod demo;
pub mod error;
pub mod ingest;
pub mod insights;
pub mod models;
pub mod retry;

pub use agents::{DocumentConverter, ExtractionAgent, ExtractionResult, QueryAgent};
pub use db::{Database, InsightRecord, INSIGHT_TTL_DAYS};
pub use error::{Error, Result};
pub use ingest::{IngestOutcome, Ingestor};
pub use insights::{
    analyze_trends, detect_anomalies, detect_subscriptions, enrich_merchant,
    summarize_by_category, InsightPipeline, InsightReport, InsightType,
};
pub use models::{
    Category, NewTransaction, Statement, StatementMetadata, Transaction, TransactionType,
};
pub use retry::{with_retry, BackoffPolicy};
