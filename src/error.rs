//! Error types for ingestion and storage.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a CSV source into bank records.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The source could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source is not a usable table (CSV syntax, bad header, no data).
    /// Fatal regardless of the invalid-row policy.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A data row failed validation while the policy was `Abort`.
    #[error("Invalid row at line {line}: {reason} in {row:?}")]
    InvalidRow {
        line: u64,
        reason: RowDefect,
        row: Vec<String>,
    },
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return IngestError::MalformedInput(err.to_string());
        }

        match err.into_kind() {
            csv::ErrorKind::Io(io) => IngestError::Io(io),
            other => IngestError::MalformedInput(format!("{:?}", other)),
        }
    }
}

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowDefect {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("invalid country code \"{0}\"")]
    CountryCode(String),

    #[error("invalid SWIFT code \"{0}\"")]
    SwiftCode(String),
}

/// Failures reported by the bank store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A bank with this SWIFT code already exists.
    #[error("duplicate SWIFT code: {0}")]
    DuplicateKey(String),

    /// A headquarters link points at a code that is not stored.
    #[error("headquarters reference does not exist for {0}")]
    ForeignKeyViolation(String),

    #[error("bank not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to load {}: {reason}", .path.display())]
    EnvFile { path: PathBuf, reason: String },
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
