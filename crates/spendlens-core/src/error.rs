//! Error types for Spendlens

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this error belongs to the storage layer and is worth retrying.
    ///
    /// Only database and pool errors qualify; everything else propagates
    /// immediately without retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Pool(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
