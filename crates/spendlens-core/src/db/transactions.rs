//! Deduplicating transaction persistence
//!
//! The idempotency key is the natural tuple (date, description, amount,
//! source_file). Re-ingesting a statement never creates duplicate rows, and
//! the first write wins: a duplicate's enrichment fields are discarded.

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction, TransactionType};
use crate::retry::{with_retry, BackoffPolicy};

/// Source file recorded when the extractor didn't provide one
const UNKNOWN_SOURCE: &str = "unknown";

impl Database {
    /// Save a batch of transactions, skipping rows that already exist
    ///
    /// Returns the number of newly inserted rows. The whole batch commits
    /// atomically; any failure rolls the batch back and propagates after the
    /// storage retry policy is exhausted.
    pub fn save_transactions(&self, rows: &[NewTransaction]) -> Result<usize> {
        with_retry(&BackoffPolicy::default(), Error::is_transient, || {
            self.save_transactions_once(rows)
        })
    }

    fn save_transactions_once(&self, rows: &[NewTransaction]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut new_count = 0;

        for row in rows {
            let source_file = row.source_file.as_deref().unwrap_or(UNKNOWN_SOURCE);

            // First writer wins: an existing row under the identity key means
            // the incoming record is discarded entirely.
            let existing: Option<i64> = tx
                .query_row(
                    r#"
                    SELECT id FROM transactions
                    WHERE date = ? AND description = ? AND amount = ? AND source_file = ?
                    "#,
                    params![row.date, row.description, row.amount, source_file],
                    |r| r.get(0),
                )
                .optional()?;

            if existing.is_some() {
                continue;
            }

            tx.execute(
                r#"
                INSERT INTO transactions (
                    date, description, amount, category, location, source_file,
                    merchant, is_subscription, payment_method, tags, currency,
                    raw_description, transaction_type, reference_number,
                    account_last_4, provider_name, is_essential, tax_category, confidence
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    row.date,
                    row.description,
                    row.amount,
                    row.category.as_str(),
                    row.location,
                    source_file,
                    row.merchant,
                    row.is_subscription,
                    row.payment_method,
                    row.tags,
                    row.currency.as_deref().unwrap_or("USD"),
                    row.raw_description,
                    row.transaction_type.as_ref().map(|t| t.as_str().to_string()),
                    row.reference_number,
                    row.account_last_4,
                    row.provider_name,
                    row.is_essential,
                    row.tax_category,
                    row.confidence,
                ],
            )?;
            new_count += 1;
        }

        tx.commit()?;
        Ok(new_count)
    }

    /// Fetch all transactions in chronological order (date, then insertion)
    pub fn all_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, date, description, amount, category, location, source_file,
                   merchant, is_subscription, payment_method, tags, currency,
                   raw_description, transaction_type, reference_number,
                   account_last_4, provider_name, is_essential, tax_category,
                   confidence, created_at
            FROM transactions
            ORDER BY date, id
            "#,
        )?;

        let rows = stmt
            .query_map([], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// List the most recent transactions (by date descending)
    pub fn recent_transactions(&self, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, date, description, amount, category, location, source_file,
                   merchant, is_subscription, payment_method, tags, currency,
                   raw_description, transaction_type, reference_number,
                   account_last_4, provider_name, is_essential, tax_category,
                   confidence, created_at
            FROM transactions
            ORDER BY date DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![limit], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Count total transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Helper to convert a row to Transaction
    /// Column order: id, date, description, amount, category, location,
    ///               source_file, merchant, is_subscription, payment_method,
    ///               tags, currency, raw_description, transaction_type,
    ///               reference_number, account_last_4, provider_name,
    ///               is_essential, tax_category, confidence, created_at
    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let is_subscription: Option<bool> = row.get(8)?;
        let currency: Option<String> = row.get(11)?;
        let transaction_type: Option<String> = row.get(13)?;
        let created_at: String = row.get(20)?;
        Ok(Transaction {
            id: row.get(0)?,
            date: row.get(1)?,
            description: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            location: row.get(5)?,
            source_file: row.get(6)?,
            merchant: row.get(7)?,
            is_subscription: is_subscription.unwrap_or(false),
            payment_method: row.get(9)?,
            tags: row.get(10)?,
            currency: currency.unwrap_or_else(|| "USD".to_string()),
            raw_description: row.get(12)?,
            transaction_type: transaction_type.as_deref().map(TransactionType::from),
            reference_number: row.get(14)?,
            account_last_4: row.get(15)?,
            provider_name: row.get(16)?,
            is_essential: row.get(17)?,
            tax_category: row.get(18)?,
            confidence: row.get(19)?,
            created_at: parse_datetime(&created_at),
        })
    }
}
