//! Timestamp utilities and the fixed datetime encodings

use crate::{Error, Result};
use chrono::{Local, NaiveDateTime, Timelike};

/// Storage encoding for timestamps (TEXT columns in the vehicles table)
pub const DB_DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Human-facing timestamp format used on receipts
pub const RECEIPT_DATETIME_FMT: &str = "%d/%m/%Y %H:%M";

/// Get current local timestamp, truncated to whole seconds to match the
/// storage encoding
pub fn now() -> NaiveDateTime {
    let ts = Local::now().naive_local();
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Encode a timestamp for storage
pub fn format_db(ts: NaiveDateTime) -> String {
    ts.format(DB_DATETIME_FMT).to_string()
}

/// Decode a timestamp from its storage encoding
pub fn parse_db(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DB_DATETIME_FMT)
        .map_err(|e| Error::InvalidInput(format!("Malformed timestamp '{}': {}", s, e)))
}
