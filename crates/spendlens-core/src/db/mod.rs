//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `transactions` - Deduplicating transaction persistence
//! - `statements` - Statement metadata upserts
//! - `insights` - TTL-based insight cache rows

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{info, warn};

use crate::error::Result;

mod insights;
mod statements;
mod transactions;

pub use insights::{InsightRecord, INSIGHT_TTL_DAYS};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Optional `transactions` columns added by successive extraction versions.
///
/// The base table predates all of these; `ensure_transaction_columns` adds
/// whichever are missing so older databases keep working after an upgrade.
const OPTIONAL_TRANSACTION_COLUMNS: &[(&str, &str)] = &[
    ("merchant", "TEXT"),
    ("is_subscription", "BOOLEAN DEFAULT 0"),
    ("payment_method", "TEXT"),
    ("tags", "TEXT"),
    ("currency", "TEXT DEFAULT 'USD'"),
    ("raw_description", "TEXT"),
    ("transaction_type", "TEXT"),
    ("reference_number", "TEXT"),
    ("account_last_4", "TEXT"),
    ("provider_name", "TEXT"),
    ("is_essential", "BOOLEAN"),
    ("tax_category", "TEXT"),
    ("confidence", "REAL"),
];

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Format a DateTime<Utc> the way SQLite datetimes are stored
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) a database at the given path and run migrations
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a temporary database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each
    /// pooled connection to `:memory:` would see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/spendlens_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::open(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Transactions, keyed by the natural identity tuple.
            -- Optional enrichment columns are added by
            -- ensure_transaction_columns below, not declared here.
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT,
                location TEXT,
                source_file TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(date, description, amount, source_file)
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category);

            -- Statement metadata, one row per source file
            CREATE TABLE IF NOT EXISTS statements (
                id INTEGER PRIMARY KEY,
                source_file TEXT NOT NULL UNIQUE,
                provider_name TEXT,
                account_last_4 TEXT,
                period_start TEXT,
                period_end TEXT,
                opening_balance REAL,
                closing_balance REAL,
                total_credits REAL,
                total_debits REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Insight cache (TTL-based, recomputed on expiry)
            CREATE TABLE IF NOT EXISTS insights (
                id INTEGER PRIMARY KEY,
                insight_type TEXT NOT NULL,          -- category_summary, subscriptions, ...
                key TEXT NOT NULL,                   -- merchant name, or 'all' for singletons
                value TEXT NOT NULL,                 -- JSON-serialized payload
                transaction_ids TEXT,                -- comma-separated provenance IDs
                confidence REAL DEFAULT 1.0,
                computed_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                expires_at DATETIME NOT NULL,
                UNIQUE(insight_type, key)
            );

            CREATE INDEX IF NOT EXISTS idx_insights_expires ON insights(expires_at);
            "#,
        )?;

        self.ensure_transaction_columns(&conn)?;

        info!("Database schema initialized");
        Ok(())
    }

    /// Additive-only schema self-healing for the `transactions` table
    ///
    /// Adds any currently-defined optional column that is absent. A failed
    /// ALTER is logged per column and does not abort initialization.
    fn ensure_transaction_columns(&self, conn: &DbConn) -> Result<()> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('transactions')")?;
        let existing: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (name, col_type) in OPTIONAL_TRANSACTION_COLUMNS {
            if existing.iter().any(|c| c == name) {
                continue;
            }
            let sql = format!("ALTER TABLE transactions ADD COLUMN \"{}\" {}", name, col_type);
            match conn.execute(&sql, []) {
                Ok(_) => info!(column = name, "Added transactions column"),
                Err(e) => warn!(column = name, error = %e, "Failed to add transactions column"),
            }
        }

        Ok(())
    }
}
