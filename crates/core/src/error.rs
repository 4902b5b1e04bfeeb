//! Error types for the signal ledger.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the signal ledger.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing data).
    #[error("Data error: {0}")]
    Data(String),

    /// Tabular read/write error (CSV and similar adapters).
    #[error("Table error: {0}")]
    Table(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Neither a Distance nor a Trendline source table was found.
    #[error("No Distance or Trendline source tables found in {0}")]
    MissingSources(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a table error.
    pub fn table(msg: impl Into<String>) -> Self {
        Error::Table(msg.into())
    }

    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Error::Database(msg.into())
    }

    /// Create a missing-sources error for the given directory.
    pub fn missing_sources(dir: impl Into<String>) -> Self {
        Error::MissingSources(dir.into())
    }
}
