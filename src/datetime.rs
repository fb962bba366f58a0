//! Date/time helpers.
//!
//! Timestamps are stored in SQLite as UTC text in `YYYY-MM-DD HH:MM:SS`
//! form, the same shape `datetime('now')` produces, so values written from
//! Rust and values defaulted by SQL compare correctly as strings.

use chrono::{DateTime, NaiveDateTime, Utc};

const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC instant the way the database stores it.
pub fn to_db_string(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

/// Parse a database timestamp back into a UTC instant.
pub fn parse_db_string(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DB_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Convert a database datetime string (YYYY-MM-DD HH:MM:SS) to RFC3339 format.
///
/// The database stores UTC, so a 'Z' suffix is appended.
pub fn to_rfc3339(datetime_str: &str) -> String {
    format!("{}Z", datetime_str.replace(' ', "T"))
}
