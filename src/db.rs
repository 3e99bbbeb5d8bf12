// 🗄️ Bank Store - SQLite persistence
// bank.hq_swift_code references bank.swift_code, so batch inserts must see
// every headquarters before its branches (the resolver guarantees this).

use crate::error::{StoreError, StoreResult};
use crate::models::{Bank, Country};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use tracing::info;

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(db_path: &Path) -> StoreResult<Connection> {
    let conn = Connection::open(db_path)?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> StoreResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Off by default in SQLite, and per connection
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Country Table (optional reference data)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS country (
            iso2_code TEXT NOT NULL,
            country_name TEXT NOT NULL,
            time_zone TEXT NOT NULL,
            PRIMARY KEY (iso2_code, country_name, time_zone)
        )",
        [],
    )?;

    // ==========================================================================
    // Bank Table (self-referencing headquarters link)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS bank (
            swift_code TEXT PRIMARY KEY CHECK (length(swift_code) = 11),
            hq_swift_code TEXT REFERENCES bank(swift_code) ON DELETE SET NULL,
            bank_name TEXT NOT NULL,
            address TEXT NOT NULL,
            country_iso2_code TEXT NOT NULL CHECK (length(country_iso2_code) = 2),
            country_name TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bank_hq ON bank(hq_swift_code)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bank_country ON bank(country_iso2_code)",
        [],
    )?;

    Ok(())
}

/// Map constraint failures to their store error, keyed by the offending code
fn classify_error(err: rusqlite::Error, swift_code: &str) -> StoreError {
    let constraint = match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    };

    match constraint {
        Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) | Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => {
            StoreError::DuplicateKey(swift_code.to_string())
        }
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
            StoreError::ForeignKeyViolation(swift_code.to_string())
        }
        _ => StoreError::Database(err),
    }
}

const INSERT_BANK: &str = "INSERT INTO bank (
        swift_code, hq_swift_code, bank_name, address, country_iso2_code, country_name
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const SELECT_BANK: &str = "SELECT swift_code, hq_swift_code, bank_name, address,
        country_iso2_code, country_name
    FROM bank";

fn bank_from_row(row: &Row) -> rusqlite::Result<Bank> {
    Ok(Bank {
        swift_code: row.get(0)?,
        hq_swift_code: row.get(1)?,
        bank_name: row.get(2)?,
        address: row.get(3)?,
        country_iso2_code: row.get(4)?,
        country_name: row.get(5)?,
    })
}

fn insert_bank_rows(tx: &Transaction, banks: &[Bank]) -> StoreResult<usize> {
    let mut stmt = tx.prepare(INSERT_BANK)?;
    for bank in banks {
        stmt.execute(params![
            bank.swift_code,
            bank.hq_swift_code,
            bank.bank_name,
            bank.address,
            bank.country_iso2_code,
            bank.country_name,
        ])
        .map_err(|e| classify_error(e, &bank.swift_code))?;
    }

    Ok(banks.len())
}

fn insert_country_rows(tx: &Transaction, countries: &[Country]) -> StoreResult<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO country (iso2_code, country_name, time_zone) VALUES (?1, ?2, ?3)",
    )?;
    for country in countries {
        stmt.execute(params![country.iso2_code, country.country_name, country.time_zone])
            .map_err(|e| classify_error(e, &country.iso2_code))?;
    }

    Ok(countries.len())
}

/// Insert a whole batch in one transaction; any failure leaves nothing behind.
/// Headquarters must precede the branches that reference them.
pub fn insert_banks(conn: &mut Connection, banks: &[Bank]) -> StoreResult<usize> {
    let tx = conn.transaction()?;
    let count = insert_bank_rows(&tx, banks)?;
    tx.commit()?;

    info!(count, "Inserted banks");
    Ok(count)
}

pub fn insert_bank(conn: &Connection, bank: &Bank) -> StoreResult<()> {
    conn.execute(
        INSERT_BANK,
        params![
            bank.swift_code,
            bank.hq_swift_code,
            bank.bank_name,
            bank.address,
            bank.country_iso2_code,
            bank.country_name,
        ],
    )
    .map_err(|e| classify_error(e, &bank.swift_code))?;

    Ok(())
}

/// Insert country reference rows in one transaction
pub fn insert_countries(conn: &mut Connection, countries: &[Country]) -> StoreResult<usize> {
    let tx = conn.transaction()?;
    let count = insert_country_rows(&tx, countries)?;
    tx.commit()?;

    info!(count, "Inserted countries");
    Ok(count)
}

/// Load countries and banks together: both tables are filled, or neither is.
/// Returns `(countries, banks)` inserted.
pub fn insert_batch(
    conn: &mut Connection,
    countries: &[Country],
    banks: &[Bank],
) -> StoreResult<(usize, usize)> {
    let tx = conn.transaction()?;
    let country_count = insert_country_rows(&tx, countries)?;
    let bank_count = insert_bank_rows(&tx, banks)?;
    tx.commit()?;

    info!(countries = country_count, banks = bank_count, "Inserted batch");
    Ok((country_count, bank_count))
}

pub fn get_bank(conn: &Connection, swift_code: &str) -> StoreResult<Bank> {
    conn.query_row(
        &format!("{} WHERE swift_code = ?1", SELECT_BANK),
        [swift_code],
        bank_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(swift_code.to_string()))
}

/// Branches linked to a headquarters, in insertion order
pub fn get_bank_branches(conn: &Connection, hq_swift_code: &str) -> StoreResult<Vec<Bank>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE hq_swift_code = ?1 ORDER BY rowid",
        SELECT_BANK
    ))?;

    let banks = stmt
        .query_map([hq_swift_code], bank_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(banks)
}

/// All banks of a country, in insertion order
pub fn get_banks_in_country(conn: &Connection, country_iso2_code: &str) -> StoreResult<Vec<Bank>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE country_iso2_code = ?1 ORDER BY rowid",
        SELECT_BANK
    ))?;

    let banks = stmt
        .query_map([country_iso2_code], bank_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(banks)
}

pub fn check_bank_hq_exists(conn: &Connection, hq_swift_code: &str) -> StoreResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM bank WHERE swift_code = ?1)",
        [hq_swift_code],
        |row| row.get(0),
    )?;

    Ok(exists)
}

/// Delete one bank; branches pointing at it lose their link
pub fn delete_bank(conn: &Connection, swift_code: &str) -> StoreResult<()> {
    let deleted = conn.execute("DELETE FROM bank WHERE swift_code = ?1", [swift_code])?;

    if deleted == 0 {
        return Err(StoreError::NotFound(swift_code.to_string()));
    }

    Ok(())
}

pub fn verify_count(conn: &Connection) -> StoreResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM bank", [], |row| row.get(0))?;

    Ok(count)
}

/// True when neither banks nor countries have been loaded
pub fn is_empty(conn: &Connection) -> StoreResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM bank) + (SELECT COUNT(*) FROM country)",
        [],
        |row| row.get(0),
    )?;

    Ok(count == 0)
}
