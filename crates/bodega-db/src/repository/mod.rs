//! # Repository Implementations
//!
//! One repository per aggregate:
//!
//! - [`product`] - products and their alternate UOMs
//! - [`inventory`] - batches, FIFO-by-expiry deduction, adjustments
//! - [`sale`] - the POS sale orchestrator
//! - [`obligation`] - AR/AP obligations, payments, aging
//! - [`reference`] - the closed set of reference-data kinds
//! - [`settings`] - company settings (VAT config, discount policy)
//!
//! ## Decimal Storage
//! SQLite has no exact decimal type, so monetary and quantity columns hold
//! canonical decimal strings (TEXT). The helpers below convert at the
//! repository boundary; domain code only ever sees `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

pub mod inventory;
pub mod obligation;
pub mod product;
pub mod reference;
pub mod sale;
pub mod settings;

// =============================================================================
// Row Decoding Helpers
// =============================================================================

/// Reads a TEXT column as a `Decimal`.
pub(crate) fn get_decimal(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: rust_decimal::Error| DbError::decode(column, e.to_string()))
}

/// Reads a nullable TEXT column as an `Option<Decimal>`.
pub(crate) fn get_opt_decimal(row: &SqliteRow, column: &str) -> DbResult<Option<Decimal>> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: rust_decimal::Error| DbError::decode(column, e.to_string())),
        None => Ok(None),
    }
}

/// Reads a TEXT column as a status/kind enum via its `FromStr`.
pub(crate) fn get_enum<T>(row: &SqliteRow, column: &str) -> DbResult<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e| DbError::decode(column, e))
}

/// Reads a nullable TEXT column as an optional enum.
pub(crate) fn get_opt_enum<T>(row: &SqliteRow, column: &str) -> DbResult<Option<T>>
where
    T: FromStr<Err = String>,
{
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(s) => s.parse().map(Some).map_err(|e| DbError::decode(column, e)),
        None => Ok(None),
    }
}

// =============================================================================
// Test Utilities
// =============================================================================
