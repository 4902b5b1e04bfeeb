//! Reference "as of" date for recency windows.

use chrono::NaiveDate;
use serde_json::Value;
use signal_ingestion::fields::parse_iso_date;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read the data-fetch date from `{"date": ...}` or `{"datetime": ...}`.
///
/// Any read or parse failure is `None`.
pub fn read_fetch_date(path: &Path) -> Option<NaiveDate> {
    let text = fs::read_to_string(path).ok()?;
    let value: Value = serde_json::from_str(&text).ok()?;
    ["date", "datetime"]
        .iter()
        .filter_map(|key| value.get(*key)?.as_str())
        .find(|s| !s.trim().is_empty())
        .and_then(parse_iso_date)
}

/// Fetch date from the file, else `fallback`.
pub fn resolve_fetch_date(path: &Path, fallback: NaiveDate) -> NaiveDate {
    match read_fetch_date(path) {
        Some(date) => date,
        None => {
            debug!(path = %path.display(), %fallback, "Using fallback fetch date");
            fallback
        }
    }
}
