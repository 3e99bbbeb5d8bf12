// SWIFT Registry - Core Library
// CSV ingestion, hierarchy resolution, SQLite storage and the lookup API

pub mod config;
pub mod db;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod parser;
pub mod swift_code;

#[cfg(feature = "server")]
pub mod api;

use std::io::Read;

// Re-export commonly used types
pub use config::{load_env_file, Config, Environment};
pub use db::{
    check_bank_hq_exists, delete_bank, get_bank, get_bank_branches, get_banks_in_country,
    insert_bank, insert_banks, insert_batch, insert_countries, is_empty, open_database,
    setup_database, verify_count,
};
pub use error::{ConfigError, IngestError, IngestResult, RowDefect, StoreError, StoreResult};
pub use hierarchy::{headquarters_codes, resolve};
pub use models::{Bank, Country};
pub use parser::{load_csv, parse_csv, InvalidRowPolicy, ParsedBatch};
pub use swift_code::{classify, CodeKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse and resolve in one go: insertion-ready banks, headquarters first
pub fn ingest<R: Read>(reader: R, policy: InvalidRowPolicy) -> IngestResult<Vec<Bank>> {
    Ok(parse_csv(reader, policy)?.resolve())
}
