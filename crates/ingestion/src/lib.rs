//! Source row ingestion and normalization for the signal ledger.
//!
//! This crate handles:
//! - Parsing the compound text columns of the Distance/Trendline exports
//! - Numeric coercion of loosely formatted cells
//! - Building standardized records with their dedup keys

pub mod fields;
pub mod normalizer;

pub use fields::{
    parse_interval, parse_signal_column, parse_today_vs_signal, parse_trendpulse_start_end,
    parse_win_rate_and_trades, SignalColumn, TodayVsSignal,
};
pub use normalizer::{build_standard_record, normalize_rows, NormalizeStats};
