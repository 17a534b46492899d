//! Statement ingestion pipeline
//!
//! Wires a document converter and an extraction agent to the store:
//! convert to markdown, extract, stamp the source file, save. Dedup is
//! handled by the store, so re-ingesting the same statement is a no-op.

use tracing::info;

use crate::agents::{DocumentConverter, ExtractionAgent};
use crate::db::Database;
use crate::error::Result;

/// Counts from one ingested statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Transactions the agent extracted
    pub extracted: usize,
    /// Rows actually inserted
    pub inserted: usize,
    /// Rows skipped as duplicates
    pub duplicates: usize,
}

/// Drives statements through conversion, extraction, and persistence
pub struct Ingestor<C, E> {
    db: Database,
    converter: C,
    agent: E,
}

impl<C: DocumentConverter, E: ExtractionAgent> Ingestor<C, E> {
    pub fn new(db: Database, converter: C, agent: E) -> Self {
        Self {
            db,
            converter,
            agent,
        }
    }

    /// Ingest one statement document
    pub fn ingest(&self, document: &[u8], filename: &str) -> Result<IngestOutcome> {
        info!(filename, bytes = document.len(), "Converting statement");
        let markdown = self.converter.to_markdown(document, filename)?;

        info!(filename, chars = markdown.len(), "Extracting transactions");
        let mut result = self.agent.extract(&markdown)?;

        // The agent doesn't know the filename; stamp it on every row so the
        // identity key ties rows back to this statement.
        for tx in &mut result.transactions {
            tx.source_file = Some(filename.to_string());
        }

        let extracted = result.transactions.len();
        let inserted = self.db.save_transactions(&result.transactions)?;
        self.db.upsert_statement(filename, &result.metadata)?;

        info!(
            filename,
            extracted,
            inserted,
            duplicates = extracted - inserted,
            "Statement ingested"
        );
        Ok(IngestOutcome {
            extracted,
            inserted,
            duplicates: extracted - inserted,
        })
    }
}
