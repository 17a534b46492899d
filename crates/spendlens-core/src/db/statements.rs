//! Statement metadata persistence
//!
//! One row per source file. Re-processing a statement replaces the whole
//! metadata row, including overwriting previous values with NULL when a
//! field is absent from the new extraction.

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Statement, StatementMetadata};
use crate::retry::{with_retry, BackoffPolicy};

impl Database {
    /// Upsert statement metadata, keyed by source file
    ///
    /// Shares the storage retry policy with the other write paths.
    pub fn upsert_statement(&self, source_file: &str, meta: &StatementMetadata) -> Result<()> {
        with_retry(&BackoffPolicy::default(), Error::is_transient, || {
            self.upsert_statement_once(source_file, meta)
        })
    }

    fn upsert_statement_once(&self, source_file: &str, meta: &StatementMetadata) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO statements (
                source_file, provider_name, account_last_4, period_start,
                period_end, opening_balance, closing_balance, total_credits,
                total_debits
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(source_file) DO UPDATE SET
                provider_name = excluded.provider_name,
                account_last_4 = excluded.account_last_4,
                period_start = excluded.period_start,
                period_end = excluded.period_end,
                opening_balance = excluded.opening_balance,
                closing_balance = excluded.closing_balance,
                total_credits = excluded.total_credits,
                total_debits = excluded.total_debits
            "#,
            params![
                source_file,
                meta.provider_name,
                meta.account_last_4,
                meta.period_start,
                meta.period_end,
                meta.opening_balance,
                meta.closing_balance,
                meta.total_credits,
                meta.total_debits,
            ],
        )?;
        Ok(())
    }

    /// List statements, optionally filtered to one source file
    pub fn list_statements(&self, source_file: Option<&str>) -> Result<Vec<Statement>> {
        let conn = self.conn()?;
        let base = r#"
            SELECT id, source_file, provider_name, account_last_4, period_start,
                   period_end, opening_balance, closing_balance, total_credits,
                   total_debits, created_at
            FROM statements
        "#;

        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<Statement> {
            let created_at: String = row.get(10)?;
            Ok(Statement {
                id: row.get(0)?,
                source_file: row.get(1)?,
                provider_name: row.get(2)?,
                account_last_4: row.get(3)?,
                period_start: row.get(4)?,
                period_end: row.get(5)?,
                opening_balance: row.get(6)?,
                closing_balance: row.get(7)?,
                total_credits: row.get(8)?,
                total_debits: row.get(9)?,
                created_at: parse_datetime(&created_at),
            })
        };

        let rows = match source_file {
            Some(sf) => {
                let sql = format!("{} WHERE source_file = ? ORDER BY created_at DESC", base);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![sf], map_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("{} ORDER BY created_at DESC", base);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], map_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(rows)
    }
}
