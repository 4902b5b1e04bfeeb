//! Standardization of raw Distance/Trendline rows.
//!
//! Turns one source row into a [`StandardizedRecord`], absorbing any
//! malformed cells as nulls.

use signal_core::columns::*;
use signal_core::{
    has_no_exit_sentinel, RawSignalRow, SignalFunction, SignalType, StandardizedRecord,
};
use tracing::debug;

use crate::fields::{
    coerce_f64, coerce_percent, extract_date, extract_price, parse_interval, parse_signal_column,
    parse_today_vs_signal, parse_trendpulse_start_end, parse_win_rate_and_trades,
};

/// Counters for one normalization batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Rows turned into records.
    pub rows: usize,
    /// Rows whose signal column could not be parsed.
    pub unparsed_signal: usize,
    /// Rows whose signal word fell through to the LONG default.
    pub unrecognized_signal_type: usize,
}

/// How the signal column of one row was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalOutcome {
    Parsed,
    Unparsed,
    Unrecognized,
}

/// Build a standardized record from one raw source row.
///
/// Pure: the row is copied into the record's passthrough payload and
/// nothing else is touched.
pub fn build_standard_record(row: &RawSignalRow, function: SignalFunction) -> StandardizedRecord {
    standardize(row, function).0
}

fn standardize(
    row: &RawSignalRow,
    function: SignalFunction,
) -> (StandardizedRecord, SignalOutcome) {
    let mut record = StandardizedRecord::new(function);

    let signal_text = row.text(SRC_SIGNAL);
    let outcome = match parse_signal_column(signal_text) {
        Some(signal) => {
            let outcome = if SignalType::is_recognized(&signal.raw_signal) {
                SignalOutcome::Parsed
            } else {
                debug!(
                    symbol = %signal.symbol,
                    signal_word = %signal.raw_signal,
                    "Unrecognized signal word, defaulting to LONG"
                );
                SignalOutcome::Unrecognized
            };
            record.symbol = Some(signal.symbol);
            record.signal_type = signal.signal_type;
            record.signal_date = Some(signal.signal_date);
            record.signal_price = Some(signal.signal_price);
            outcome
        }
        None => {
            debug!(function = %function, cell = %signal_text, "Unparseable signal column");
            SignalOutcome::Unparsed
        }
    };

    let (win_rate, num_trades) = parse_win_rate_and_trades(row.text(SRC_WIN_RATE));
    record.win_rate = win_rate;
    record.number_of_trades = num_trades;

    let today = parse_today_vs_signal(row.text(SRC_TODAY_VS_SIGNAL));
    record.today_price = today.price;
    record.today_vs_signal_pct = today.abs_pct;
    record.today_vs_signal_pct_signed = today.signed_pct;

    record.interval = parse_interval(row.text(SRC_INTERVAL));

    record.trendpulse_start_end = row.text(SRC_TRENDPULSE).to_string();
    if let Some((start, end)) = parse_trendpulse_start_end(&record.trendpulse_start_end) {
        record.trendpulse_start_price = Some(start);
        record.trendpulse_end_price = Some(end);
    }

    record.pe_ratio = coerce_f64(row.text(PE_RATIO));
    record.industry_pe = coerce_f64(row.text(INDUSTRY_PE));
    record.last_quarter_profit = coerce_f64(row.text(LAST_QUARTER_PROFIT));
    record.last_year_same_quarter_profit = coerce_f64(row.text(LAST_YEAR_SAME_QUARTER_PROFIT));
    record.strategy_cagr = coerce_percent(row.text(SRC_STRATEGY_CAGR));
    record.strategy_sharpe = coerce_f64(row.text(SRC_STRATEGY_SHARPE));

    record.exit_signal_raw = row.text(SRC_EXIT_SIGNAL).trim().to_string();
    let (exit_date, exit_price) = derive_exit(&record.exit_signal_raw);
    record.exit_date = exit_date;
    record.exit_price = exit_price;

    record.refresh_dedup_key();
    record.raw = row.clone();
    (record, outcome)
}

/// Exit date and price, only when the exit cell is filled and not the sentinel.
pub fn derive_exit(exit_raw: &str) -> (Option<chrono::NaiveDate>, Option<f64>) {
    if exit_raw.trim().is_empty() || has_no_exit_sentinel(exit_raw) {
        return (None, None);
    }
    (extract_date(exit_raw), extract_price(exit_raw))
}

/// Normalize every row of one source table.
///
/// Malformed signal columns are only counted here; callers decide how
/// loudly to report them.
pub fn normalize_rows<'a, I>(
    rows: I,
    function: SignalFunction,
) -> (Vec<StandardizedRecord>, NormalizeStats)
where
    I: IntoIterator<Item = &'a RawSignalRow>,
{
    let mut stats = NormalizeStats::default();
    let records = rows
        .into_iter()
        .map(|row| {
            let (record, outcome) = standardize(row, function);
            stats.rows += 1;
            match outcome {
                SignalOutcome::Parsed => {}
                SignalOutcome::Unparsed => stats.unparsed_signal += 1,
                SignalOutcome::Unrecognized => stats.unrecognized_signal_type += 1,
            }
            record
        })
        .collect();
    (records, stats)
}
