//! Insight cache persistence
//!
//! Computed insights are cached with a fixed TTL and addressed by
//! (insight_type, key). Saving again under the same address replaces the
//! payload and restarts the TTL clock.

use chrono::{Duration, Utc};
use rusqlite::params;

use super::{format_datetime, parse_datetime, Database};
use crate::error::Result;

/// How long a cached insight stays valid
pub const INSIGHT_TTL_DAYS: i64 = 7;

/// A cached insight row
#[derive(Debug, Clone)]
pub struct InsightRecord {
    pub id: i64,
    pub insight_type: String,
    /// Secondary key within the type ("all" for singleton insights)
    pub key: String,
    /// JSON payload, stored as text
    pub value: String,
    /// Comma-separated IDs of the transactions that produced this insight
    pub transaction_ids: Option<String>,
    pub confidence: f64,
    pub computed_at: chrono::DateTime<Utc>,
    pub expires_at: chrono::DateTime<Utc>,
}

impl InsightRecord {
    /// Deserialize the JSON payload
    pub fn value_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.value)?)
    }
}

impl Database {
    /// Save (or refresh) a cached insight
    ///
    /// Upserts by (insight_type, key); the replaced row gets a fresh
    /// computed_at and a new expiry 7 days out.
    pub fn save_insight(
        &self,
        insight_type: &str,
        key: &str,
        value: &serde_json::Value,
        transaction_ids: Option<&[i64]>,
        confidence: f64,
    ) -> Result<()> {
        let now = Utc::now();
        let expires_at = now + Duration::days(INSIGHT_TTL_DAYS);
        let ids = transaction_ids.map(|ids| {
            ids.iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",")
        });

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO insights (
                insight_type, key, value, transaction_ids, confidence,
                computed_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(insight_type, key) DO UPDATE SET
                value = excluded.value,
                transaction_ids = excluded.transaction_ids,
                confidence = excluded.confidence,
                computed_at = excluded.computed_at,
                expires_at = excluded.expires_at
            "#,
            params![
                insight_type,
                key,
                serde_json::to_string(value)?,
                ids,
                confidence,
                format_datetime(now),
                format_datetime(expires_at),
            ],
        )?;
        Ok(())
    }

    /// Fetch all insights that have not yet expired
    pub fn valid_insights(&self) -> Result<Vec<InsightRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, insight_type, key, value, transaction_ids, confidence,
                   computed_at, expires_at
            FROM insights
            WHERE expires_at > ?
            ORDER BY insight_type, key
            "#,
        )?;

        let now = format_datetime(Utc::now());
        let rows = stmt
            .query_map(params![now], |row| {
                let computed_at: String = row.get(6)?;
                let expires_at: String = row.get(7)?;
                Ok(InsightRecord {
                    id: row.get(0)?,
                    insight_type: row.get(1)?,
                    key: row.get(2)?,
                    value: row.get(3)?,
                    transaction_ids: row.get(4)?,
                    confidence: row.get(5)?,
                    computed_at: parse_datetime(&computed_at),
                    expires_at: parse_datetime(&expires_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Delete all cached insights (forces recomputation on the next run)
    pub fn clear_insights(&self) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM insights", [])?;
        Ok(deleted)
    }
}
