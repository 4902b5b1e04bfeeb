//! Parsers for the compound text columns of the source tables.
//!
//! Every function here is total: malformed input yields `None` (or an
//! empty string for the interval) and never panics. Grammars:
//!
//! | Column | Grammar |
//! |--------|---------|
//! | signal | `<symbol>, <signal-word>, <YYYY-MM-DD> (Price: <float>)` |
//! | win rate | `<pct>%, <history>, <int>` |
//! | today vs signal | `<YYYY-MM-DD> (Price: <float>), <pct>% above\|below` |
//! | trendpulse | `<date> (Price: <float>)/<date> (Price: <float>)` |
//! | interval | `<interval>, <confirmation>` |

use chrono::NaiveDate;
use regex::Regex;
use signal_core::SignalType;
use std::sync::LazyLock;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("valid date regex"));
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Price:\s*([0-9.]+)").expect("valid price regex"));
static PCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(-?[0-9.]+)\s*%\s*(above|below)?").expect("valid percent regex")
});
static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid integer regex"));

/// Fields of the `Symbol, Signal, Signal Date/Price[$]` column.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalColumn {
    pub symbol: String,
    pub signal_type: SignalType,
    /// The signal word as written, before normalization.
    pub raw_signal: String,
    pub signal_date: NaiveDate,
    pub signal_price: f64,
}

/// Fields of the `Today Trading Date/Price[$], Today price vs Signal` column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TodayVsSignal {
    pub price: Option<f64>,
    pub abs_pct: Option<f64>,
    /// Negative when the text says "below" or carries a minus sign.
    pub signed_pct: Option<f64>,
}

/// Parse a finite float, tolerating surrounding whitespace.
fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First `YYYY-MM-DD` in the text that is a real calendar date.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    let m = DATE_RE.captures(text)?.get(1)?;
    NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok()
}

/// First `Price: <float>` value in the text.
pub fn extract_price(text: &str) -> Option<f64> {
    let m = PRICE_RE.captures(text)?.get(1)?;
    parse_finite(m.as_str())
}

/// Parse an ISO date cell, ignoring anything after the first ten characters
/// (so `"2026-02-09 00:00:00"` works).
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Parse the signal column.
///
/// Needs at least three comma-separated parts; the tail after the second
/// comma is re-joined before looking for the date and price. Returns `None`
/// when the symbol, date or price is missing.
pub fn parse_signal_column(text: &str) -> Option<SignalColumn> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }

    let symbol = parts[0].trim_matches('"').trim();
    if symbol.is_empty() {
        return None;
    }
    let raw_signal = parts[1];
    let date_price = parts[2..].join(",");

    Some(SignalColumn {
        symbol: symbol.to_string(),
        signal_type: SignalType::normalize(raw_signal),
        raw_signal: raw_signal.to_string(),
        signal_date: extract_date(&date_price)?,
        signal_price: extract_price(&date_price)?,
    })
}

/// Parse the win rate column into `(win_rate_pct, number_of_trades)`.
///
/// The trade count is the last integer token of the last comma segment.
pub fn parse_win_rate_and_trades(text: &str) -> (Option<f64>, Option<u32>) {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return (None, None);
    }

    let win_rate = parse_finite(&parts[0].replace('%', ""));
    let num_trades = parts
        .last()
        .and_then(|last| INT_RE.find_iter(last).last())
        .and_then(|m| m.as_str().parse::<u32>().ok());

    (win_rate, num_trades)
}

/// Parse the today-vs-signal column.
pub fn parse_today_vs_signal(text: &str) -> TodayVsSignal {
    let price = extract_price(text);

    let signed_pct = PCT_RE.captures(text).and_then(|caps| {
        let value = parse_finite(caps.get(1)?.as_str())?;
        let below = caps
            .get(2)
            .is_some_and(|m| m.as_str().eq_ignore_ascii_case("below"));
        Some(if below && value > 0.0 { -value } else { value })
    });

    TodayVsSignal {
        price,
        abs_pct: signed_pct.map(f64::abs),
        signed_pct,
    }
}

/// Parse the TrendPulse column into `(start_price, end_price)`.
///
/// Uses the first two `Price:` values left to right; fewer than two is `None`.
pub fn parse_trendpulse_start_end(text: &str) -> Option<(f64, f64)> {
    let mut prices = PRICE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()));

    let start = parse_finite(prices.next()?)?;
    let end = parse_finite(prices.next()?)?;
    Some((start, end))
}

/// Parse the interval column: the text before the first comma.
pub fn parse_interval(text: &str) -> String {
    text.split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Best-effort float coercion of a plain numeric cell.
///
/// Empty cells, `"No Data"`, `NaN` and infinities all become `None`.
pub fn coerce_f64(text: &str) -> Option<f64> {
    parse_finite(text)
}

/// Float coercion after stripping `%` signs (`"24.34%"` -> `24.34`).
pub fn coerce_percent(text: &str) -> Option<f64> {
    parse_finite(&text.replace('%', ""))
}

/// Coerce a count cell; accepts `"13"` and the float form `"13.0"`.
pub fn coerce_count(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(n) = text.parse::<u32>() {
        return Some(n);
    }
    let value = parse_finite(text)?;
    if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}
