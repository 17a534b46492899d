//! Agent seams for statement ingestion
//!
//! Ingestion has two pluggable stages: converting a raw statement into
//! markdown, then extracting structured transactions from that markdown.
//! Both stages sit behind traits so the pipeline can be driven by real
//! services in production and by fixtures in tests.

use crate::error::Result;
use crate::models::{NewTransaction, StatementMetadata};

/// What an extraction agent produces from one statement
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub transactions: Vec<NewTransaction>,
    pub metadata: StatementMetadata,
}

/// Converts a raw statement document into markdown text
pub trait DocumentConverter {
    fn to_markdown(&self, document: &[u8], filename: &str) -> Result<String>;
}

/// Extracts transactions and statement metadata from markdown
pub trait ExtractionAgent {
    fn extract(&self, markdown: &str) -> Result<ExtractionResult>;
}

/// Answers free-form questions over already-ingested data
pub trait QueryAgent {
    fn answer(&self, question: &str, context: &str) -> Result<String>;
}
