//! Core data types for the signal ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Text in the exit column of a signal that has not been closed yet.
pub const NO_EXIT_SENTINEL: &str = "No Exit Yet";

/// Whether an exit cell still carries the "No Exit Yet" sentinel (case-insensitive).
#[inline]
pub fn has_no_exit_sentinel(exit_raw: &str) -> bool {
    exit_raw
        .to_lowercase()
        .contains(&NO_EXIT_SENTINEL.to_lowercase())
}

/// Direction of a trade signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    #[default]
    Long,
    Short,
}

impl SignalType {
    /// Normalize a free-text signal word.
    ///
    /// Anything containing "short" (any case) is SHORT; everything else,
    /// including unrecognized text, is LONG.
    pub fn normalize(raw: &str) -> Self {
        if raw.to_uppercase().contains("SHORT") {
            SignalType::Short
        } else {
            SignalType::Long
        }
    }

    /// Whether the text explicitly names a direction.
    ///
    /// Used to flag inputs that fell through to the LONG default.
    pub fn is_recognized(raw: &str) -> bool {
        let upper = raw.to_uppercase();
        upper.contains("SHORT") || upper.contains("LONG")
    }

    /// Canonical uppercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Long => "LONG",
            SignalType::Short => "SHORT",
        }
    }

    /// Get sign: +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            SignalType::Long => 1.0,
            SignalType::Short => -1.0,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal-generation method that produced a source row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalFunction {
    Distance,
    Trendline,
}

impl SignalFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalFunction::Distance => "Distance",
            SignalFunction::Trendline => "Trendline",
        }
    }
}

impl fmt::Display for SignalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" => Ok(SignalFunction::Distance),
            "trendline" => Ok(SignalFunction::Trendline),
            other => Err(Error::data(format!("unknown signal function '{other}'"))),
        }
    }
}

/// Position status derived from the exit column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Exit column still says "No Exit Yet".
    Open,
    /// Anything else, including an empty exit column.
    Closed,
}

impl PositionStatus {
    pub fn from_exit_raw(exit_raw: &str) -> Self {
        if has_no_exit_sentinel(exit_raw) {
            PositionStatus::Open
        } else {
            PositionStatus::Closed
        }
    }
}

/// One row of a source or persisted table: ordered column name to cell text.
///
/// Numbers arrive in their textual form; nothing here interprets cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignalRow {
    cells: Vec<(String, String)>,
}

impl RawSignalRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (column, value) pairs. Later duplicates replace earlier ones.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = Self::new();
        for (k, v) in pairs {
            row.insert(k, v);
        }
        row
    }

    /// Cell text for a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Cell text for a column, or `""` when absent.
    pub fn text(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.iter().any(|(name, _)| name == column)
    }

    /// Set a cell, keeping the column's original position if it exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Build the identity of one logical trade occurrence.
///
/// `Function|Symbol|Signal_Date|SignalType|Interval`, with missing parts
/// rendered as empty strings.
pub fn dedup_key(
    function: SignalFunction,
    symbol: Option<&str>,
    signal_date: Option<NaiveDate>,
    signal_type: SignalType,
    interval: &str,
) -> String {
    let date = signal_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        "{}|{}|{}|{}|{}",
        function,
        symbol.map(str::trim).unwrap_or(""),
        date,
        signal_type,
        interval.trim()
    )
}

/// The canonical, normalized form of one signal observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedRecord {
    pub symbol: Option<String>,
    pub signal_type: SignalType,
    pub signal_date: Option<NaiveDate>,
    pub signal_price: Option<f64>,
    /// Backtested win rate in percent.
    pub win_rate: Option<f64>,
    pub number_of_trades: Option<u32>,
    pub today_price: Option<f64>,
    /// Unsigned move of today's price vs the signal price, percent.
    pub today_vs_signal_pct: Option<f64>,
    /// Signed move (negative when below the signal price), percent.
    pub today_vs_signal_pct_signed: Option<f64>,
    pub exit_signal_raw: String,
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    pub function: SignalFunction,
    pub interval: String,
    pub pe_ratio: Option<f64>,
    pub industry_pe: Option<f64>,
    pub last_quarter_profit: Option<f64>,
    pub last_year_same_quarter_profit: Option<f64>,
    /// Backtested CAGR in percent.
    pub strategy_cagr: Option<f64>,
    pub strategy_sharpe: Option<f64>,
    /// Raw TrendPulse cell, kept for display.
    pub trendpulse_start_end: String,
    pub trendpulse_start_price: Option<f64>,
    pub trendpulse_end_price: Option<f64>,
    pub dedup_key: String,
    /// Original source row, flattened into the ledger on save.
    pub raw: RawSignalRow,
}

impl StandardizedRecord {
    /// Empty record for a function; every optional field is null.
    pub fn new(function: SignalFunction) -> Self {
        let mut record = Self {
            symbol: None,
            signal_type: SignalType::Long,
            signal_date: None,
            signal_price: None,
            win_rate: None,
            number_of_trades: None,
            today_price: None,
            today_vs_signal_pct: None,
            today_vs_signal_pct_signed: None,
            exit_signal_raw: String::new(),
            exit_date: None,
            exit_price: None,
            function,
            interval: String::new(),
            pe_ratio: None,
            industry_pe: None,
            last_quarter_profit: None,
            last_year_same_quarter_profit: None,
            strategy_cagr: None,
            strategy_sharpe: None,
            trendpulse_start_end: String::new(),
            trendpulse_start_price: None,
            trendpulse_end_price: None,
            dedup_key: String::new(),
            raw: RawSignalRow::new(),
        };
        record.refresh_dedup_key();
        record
    }

    /// Key computed from the identity fields.
    pub fn compute_dedup_key(&self) -> String {
        dedup_key(
            self.function,
            self.symbol.as_deref(),
            self.signal_date,
            self.signal_type,
            &self.interval,
        )
    }

    /// Recompute `dedup_key` after identity fields changed.
    pub fn refresh_dedup_key(&mut self) {
        self.dedup_key = self.compute_dedup_key();
    }

    pub fn status(&self) -> PositionStatus {
        PositionStatus::from_exit_raw(&self.exit_signal_raw)
    }

    pub fn is_open(&self) -> bool {
        self.status() == PositionStatus::Open
    }

    /// Unrealized P&L in percent at `price`, inverted for SHORT signals.
    pub fn mark_to_market_pct(&self, price: f64) -> Option<f64> {
        let signal = self.signal_price.filter(|p| *p > 0.0)?;
        Some((price - signal) / signal * 100.0 * self.signal_type.sign())
    }

    /// Realized P&L in percent for a closed record with an exit price.
    pub fn realized_pct(&self) -> Option<f64> {
        if self.is_open() {
            return None;
        }
        self.mark_to_market_pct(self.exit_price?)
    }

    /// `"92.31%"`, or empty when the win rate is missing.
    pub fn win_rate_display(&self) -> String {
        self.win_rate
            .map(|w| format!("{w:.2}%"))
            .unwrap_or_default()
    }
}
