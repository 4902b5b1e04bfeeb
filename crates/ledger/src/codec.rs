//! Conversion between standardized records and persisted rows.

use chrono::NaiveDate;
use signal_core::columns::*;
use signal_core::{
    has_no_exit_sentinel, RawSignalRow, Result, SignalFunction, SignalType, StandardizedRecord,
};
use signal_ingestion::fields::{coerce_count, coerce_f64, coerce_percent, parse_iso_date};
use signal_ingestion::normalizer::derive_exit;

/// Which columns a persisted row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// Every standardized column, then passthrough source columns.
    Ledger,
    /// Only the curated columns of the entry/exit tables.
    Curated,
}

fn fmt_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Text of one standardized column.
fn standard_cell(record: &StandardizedRecord, column: &str) -> String {
    match column {
        SYMBOL => record.symbol.clone().unwrap_or_default(),
        SIGNAL_TYPE => record.signal_type.to_string(),
        SIGNAL_DATE => fmt_date(record.signal_date),
        SIGNAL_PRICE => fmt_f64(record.signal_price),
        WIN_RATE => fmt_f64(record.win_rate),
        NUMBER_OF_TRADES => record
            .number_of_trades
            .map(|n| n.to_string())
            .unwrap_or_default(),
        WIN_RATE_DISPLAY => record.win_rate_display(),
        TODAY_PRICE => fmt_f64(record.today_price),
        TODAY_VS_SIGNAL_PCT => fmt_f64(record.today_vs_signal_pct),
        TODAY_VS_SIGNAL_PCT_SIGNED => fmt_f64(record.today_vs_signal_pct_signed),
        EXIT_SIGNAL_RAW => record.exit_signal_raw.clone(),
        FUNCTION => record.function.to_string(),
        INTERVAL => record.interval.clone(),
        PE_RATIO => fmt_f64(record.pe_ratio),
        INDUSTRY_PE => fmt_f64(record.industry_pe),
        LAST_QUARTER_PROFIT => fmt_f64(record.last_quarter_profit),
        LAST_YEAR_SAME_QUARTER_PROFIT => fmt_f64(record.last_year_same_quarter_profit),
        STRATEGY_CAGR => fmt_f64(record.strategy_cagr),
        STRATEGY_SHARPE => fmt_f64(record.strategy_sharpe),
        TRENDPULSE_START_END => record.trendpulse_start_end.clone(),
        TRENDPULSE_START_PRICE => fmt_f64(record.trendpulse_start_price),
        TRENDPULSE_END_PRICE => fmt_f64(record.trendpulse_end_price),
        EXIT_DATE => fmt_date(record.exit_date),
        EXIT_PRICE => fmt_f64(record.exit_price),
        DEDUP_KEY => record.dedup_key.clone(),
        _ => String::new(),
    }
}

/// Flatten a record into a persisted row.
///
/// In the ledger layout, passthrough columns never override a standardized one.
pub fn record_to_row(record: &StandardizedRecord, layout: RowLayout) -> RawSignalRow {
    let columns: &[&str] = match layout {
        RowLayout::Ledger => &LEDGER_COLUMNS,
        RowLayout::Curated => &CURATED_COLUMNS,
    };

    let mut row = RawSignalRow::from_pairs(
        columns
            .iter()
            .map(|&column| (column, standard_cell(record, column))),
    );

    if layout == RowLayout::Ledger {
        for (column, value) in record.raw.iter() {
            if !is_standard_column(column) {
                row.insert(column, value);
            }
        }
    }
    row
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Rebuild a record from a persisted ledger row.
///
/// Numbers are re-coerced, the signal type re-normalized and the key
/// recomputed. Fails only when `Function` is not a known signal function.
pub fn record_from_row(row: &RawSignalRow) -> Result<StandardizedRecord> {
    let function: SignalFunction = row.text(FUNCTION).parse()?;
    let mut record = StandardizedRecord::new(function);

    record.symbol = non_empty(row.text(SYMBOL));
    record.signal_type = SignalType::normalize(row.text(SIGNAL_TYPE));
    record.signal_date = parse_iso_date(row.text(SIGNAL_DATE));
    record.signal_price = coerce_f64(row.text(SIGNAL_PRICE));
    record.win_rate = coerce_percent(row.text(WIN_RATE));
    record.number_of_trades = coerce_count(row.text(NUMBER_OF_TRADES));
    record.today_price = coerce_f64(row.text(TODAY_PRICE));
    record.today_vs_signal_pct = coerce_f64(row.text(TODAY_VS_SIGNAL_PCT));
    record.today_vs_signal_pct_signed = coerce_f64(row.text(TODAY_VS_SIGNAL_PCT_SIGNED));
    record.interval = row.text(INTERVAL).trim().to_string();
    record.pe_ratio = coerce_f64(row.text(PE_RATIO));
    record.industry_pe = coerce_f64(row.text(INDUSTRY_PE));
    record.last_quarter_profit = coerce_f64(row.text(LAST_QUARTER_PROFIT));
    record.last_year_same_quarter_profit = coerce_f64(row.text(LAST_YEAR_SAME_QUARTER_PROFIT));
    record.strategy_cagr = coerce_percent(row.text(STRATEGY_CAGR));
    record.strategy_sharpe = coerce_f64(row.text(STRATEGY_SHARPE));
    record.trendpulse_start_end = row.text(TRENDPULSE_START_END).to_string();
    record.trendpulse_start_price = coerce_f64(row.text(TRENDPULSE_START_PRICE));
    record.trendpulse_end_price = coerce_f64(row.text(TRENDPULSE_END_PRICE));

    record.exit_signal_raw = row.text(EXIT_SIGNAL_RAW).trim().to_string();
    if !record.exit_signal_raw.is_empty() && !has_no_exit_sentinel(&record.exit_signal_raw) {
        let (derived_date, derived_price) = derive_exit(&record.exit_signal_raw);
        record.exit_date = parse_iso_date(row.text(EXIT_DATE)).or(derived_date);
        record.exit_price = coerce_f64(row.text(EXIT_PRICE)).or(derived_price);
    }

    record.refresh_dedup_key();
    record.raw =
        RawSignalRow::from_pairs(row.iter().filter(|(column, _)| !is_standard_column(column)));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_record() -> StandardizedRecord {
        let mut record = StandardizedRecord::new(SignalFunction::Trendline);
        record.symbol = Some("HCLTECH.NS".into());
        record.signal_date = NaiveDate::from_ymd_opt(2026, 2, 9);
        record.signal_price = Some(1597.5);
        record.win_rate = Some(92.31);
        record.number_of_trades = Some(13);
        record.interval = "Daily".into();
        record.exit_signal_raw = "No Exit Yet".into();
        record.trendpulse_start_end =
            "2025-12-18 (Price: 200.9578)/2026-02-09 (Price: 169.4817)".into();
        record.trendpulse_start_price = Some(200.9578);
        record.trendpulse_end_price = Some(169.4817);
        record.raw = RawSignalRow::from_pairs([
            (SRC_SIGNAL, "HCLTECH.NS, Long, 2026-02-09 (Price: 1597.5)"),
            (PE_RATIO, "stale raw value"),
        ]);
        record.refresh_dedup_key();
        record
    }

    #[test]
    fn test_ledger_row_layout() {
        let row = record_to_row(&make_record(), RowLayout::Ledger);
        let columns: Vec<_> = row.columns().collect();

        assert_eq!(&columns[..LEDGER_COLUMNS.len()], &LEDGER_COLUMNS[..]);
        assert_eq!(columns.last(), Some(&SRC_SIGNAL));
        // The standardized value wins over the raw cell of the same name.
        assert_eq!(row.get(PE_RATIO), Some(""));
        assert_eq!(row.get(WIN_RATE_DISPLAY), Some("92.31%"));
        assert_eq!(row.get(SIGNAL_TYPE), Some("LONG"));
    }

    #[test]
    fn test_curated_row_has_no_passthrough() {
        let row = record_to_row(&make_record(), RowLayout::Curated);
        assert_eq!(row.len(), CURATED_COLUMNS.len());
        assert!(!row.contains(SRC_SIGNAL));
        assert!(!row.contains(TODAY_VS_SIGNAL_PCT));
    }

    #[test]
    fn test_roundtrip_preserves_core_fields() {
        let record = make_record();
        let restored = record_from_row(&record_to_row(&record, RowLayout::Ledger)).unwrap();

        assert_eq!(restored.dedup_key, record.dedup_key);
        assert_eq!(restored.symbol, record.symbol);
        assert_eq!(restored.signal_date, record.signal_date);
        assert_relative_eq!(restored.signal_price.unwrap(), 1597.5);
        assert_eq!(restored.number_of_trades, Some(13));
        assert_relative_eq!(restored.trendpulse_end_price.unwrap(), 169.4817);
        assert!(restored.is_open());
        assert_eq!(restored.raw.get(SRC_SIGNAL), record.raw.get(SRC_SIGNAL));
        assert!(!restored.raw.contains(PE_RATIO));
    }

    #[test]
    fn test_restore_normalizes_loose_cells() {
        let row = RawSignalRow::from_pairs([
            (FUNCTION, "Distance"),
            (SYMBOL, " INFY.NS "),
            (SIGNAL_TYPE, "Short"),
            (SIGNAL_DATE, "2026-02-05 00:00:00"),
            (NUMBER_OF_TRADES, "13.0"),
            (WIN_RATE, "88.5%"),
            (EXIT_SIGNAL_RAW, "2026-02-08 (Price: 1500.0)"),
            (DEDUP_KEY, "stale"),
        ]);
        let record = record_from_row(&row).unwrap();
        assert_eq!(record.signal_type, SignalType::Short);
        assert_eq!(record.number_of_trades, Some(13));
        assert_relative_eq!(record.win_rate.unwrap(), 88.5);
        assert_eq!(record.exit_date, NaiveDate::from_ymd_opt(2026, 2, 8));
        assert_relative_eq!(record.exit_price.unwrap(), 1500.0);
        assert_eq!(record.dedup_key, "Distance|INFY.NS|2026-02-05|SHORT|");
    }

    #[test]
    fn test_sentinel_clears_exit_columns() {
        let row = RawSignalRow::from_pairs([
            (FUNCTION, "Trendline"),
            (EXIT_SIGNAL_RAW, "No Exit Yet"),
            (EXIT_DATE, "2026-02-08"),
            (EXIT_PRICE, "10"),
        ]);
        let record = record_from_row(&row).unwrap();
        assert!(record.exit_date.is_none());
        assert!(record.exit_price.is_none());
    }

    #[test]
    fn test_unknown_function_is_an_error() {
        let row = RawSignalRow::from_pairs([(FUNCTION, "Momentum")]);
        assert!(record_from_row(&row).is_err());
    }
}
