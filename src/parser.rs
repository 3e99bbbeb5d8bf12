// 🏗️ Record Parser
// SWIFT code CSV → validated Bank records with tentative headquarters links
//
// Expected layout (header row is required and skipped):
//   COUNTRY ISO2 CODE, SWIFT CODE, CODE TYPE, NAME, ADDRESS, TOWN NAME, COUNTRY NAME, TIME ZONE

use crate::error::{IngestError, IngestResult, RowDefect};
use crate::models::{Bank, Country};
use crate::swift_code::{classify, has_valid_length};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Number of columns every row (header included) must have
pub const EXPECTED_COLUMNS: usize = 8;

// Column positions
const COL_COUNTRY_CODE: usize = 0;
const COL_SWIFT_CODE: usize = 1;
// 2 = CODE TYPE (unused)
const COL_BANK_NAME: usize = 3;
const COL_ADDRESS: usize = 4;
const COL_TOWN_NAME: usize = 5;
const COL_COUNTRY_NAME: usize = 6;
const COL_TIME_ZONE: usize = 7;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// What to do with a row that fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InvalidRowPolicy {
    /// Fail the whole parse (nothing is returned)
    #[default]
    Abort,

    /// Log the row and keep going
    #[value(name = "skip")]
    SkipAndContinue,
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Everything one parse run produced, before hierarchy resolution
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    /// Records in input order; branches carry their implied headquarters code
    pub banks: Vec<Bank>,

    /// Headquarters codes actually present in this batch
    pub headquarters: HashSet<String>,

    /// Distinct (code, name, time zone) triples in first-seen order
    pub countries: Vec<Country>,

    /// Rows dropped under `SkipAndContinue`
    pub skipped: usize,
}

// ============================================================================
// PARSER
// ============================================================================

/// Parse a CSV file from disk
pub fn load_csv(csv_path: &Path, policy: InvalidRowPolicy) -> IngestResult<ParsedBatch> {
    let file = File::open(csv_path)?;
    parse_csv(file, policy)
}

/// Parse SWIFT code rows from any reader.
///
/// Header problems and CSV syntax errors are always fatal. Rows with the wrong
/// column count, a country code that is not 2 characters, or a SWIFT code that
/// is not 11 characters are handled according to `policy`.
pub fn parse_csv<R: Read>(reader: R, policy: InvalidRowPolicy) -> IngestResult<ParsedBatch> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let header = reader.headers()?;
    if header.len() != EXPECTED_COLUMNS {
        return Err(IngestError::MalformedInput(format!(
            "expected {} header columns, found {}",
            EXPECTED_COLUMNS,
            header.len()
        )));
    }

    let mut batch = ParsedBatch::default();
    let mut seen_countries = HashSet::new();
    let mut rows = 0usize;

    for (index, result) in reader.records().enumerate() {
        let record = result?;
        rows += 1;

        // +2: 1-indexed, plus the header row
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);

        let parsed = match parse_row(&record) {
            Ok(parsed) => parsed,
            Err(reason) => match policy {
                InvalidRowPolicy::Abort => {
                    return Err(IngestError::InvalidRow {
                        line,
                        reason,
                        row: record.iter().map(str::to_string).collect(),
                    });
                }
                InvalidRowPolicy::SkipAndContinue => {
                    warn!(line, %reason, row = ?record, "Skipping invalid row");
                    batch.skipped += 1;
                    continue;
                }
            },
        };

        let (bank, country) = parsed;

        if bank.is_headquarter() {
            batch.headquarters.insert(bank.swift_code.clone());
        }
        if seen_countries.insert(country.clone()) {
            batch.countries.push(country);
        }
        batch.banks.push(bank);
    }

    if rows == 0 {
        return Err(IngestError::MalformedInput("no data rows".to_string()));
    }

    debug!(
        banks = batch.banks.len(),
        headquarters = batch.headquarters.len(),
        skipped = batch.skipped,
        "Parsed SWIFT code rows"
    );

    Ok(batch)
}

/// Validate one data row and build its record.
/// The returned bank's `hq_swift_code` is the *implied* headquarters, unchecked.
fn parse_row(record: &StringRecord) -> Result<(Bank, Country), RowDefect> {
    if record.len() != EXPECTED_COLUMNS {
        return Err(RowDefect::ColumnCount {
            expected: EXPECTED_COLUMNS,
            found: record.len(),
        });
    }

    let cell = |i: usize| record.get(i).unwrap_or("");

    let country_code = cell(COL_COUNTRY_CODE).to_uppercase();
    let swift_code = cell(COL_SWIFT_CODE);

    if country_code.chars().count() != 2 {
        return Err(RowDefect::CountryCode(country_code));
    }
    if !has_valid_length(swift_code) {
        return Err(RowDefect::SwiftCode(swift_code.to_string()));
    }

    // Blank addresses fall back to the town name
    let address = match cell(COL_ADDRESS) {
        "" => cell(COL_TOWN_NAME),
        address => address,
    };
    let country_name = cell(COL_COUNTRY_NAME).to_uppercase();

    let bank = Bank {
        swift_code: swift_code.to_string(),
        hq_swift_code: classify(swift_code).implied_headquarters().map(str::to_string),
        bank_name: cell(COL_BANK_NAME).to_string(),
        address: address.to_string(),
        country_iso2_code: country_code.clone(),
        country_name: country_name.clone(),
    };

    let country = Country {
        iso2_code: country_code,
        country_name,
        time_zone: cell(COL_TIME_ZONE).to_string(),
    };

    Ok((bank, country))
}
