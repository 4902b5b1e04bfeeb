//! Summary metrics over a set of signals.
//!
//! Closed signals are measured at their exit price, open ones are marked to
//! market against `Today_Price`.

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::Serialize;
use signal_core::StandardizedRecord;
use statrs::statistics::Statistics;

/// One signal's measured performance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performer {
    pub symbol: String,
    pub dedup_key: String,
    /// Realized or mark-to-market profit, percent.
    pub profit_pct: f64,
}

/// Aggregate performance of a signal list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalSummary {
    /// Number of records summarized.
    pub total: usize,
    /// Records with a measurable profit.
    pub measured: usize,
    /// Measured records with a positive profit.
    pub winners: usize,
    /// Share of measured records that are winners, percent.
    pub actual_win_rate: Option<f64>,
    /// Mean profit of measured records, percent.
    pub avg_profit_pct: Option<f64>,
    /// Mean days from signal to exit (closed) or to the fetch date (open).
    pub avg_holding_days: Option<f64>,
    /// Mean backtested win rate, percent.
    pub avg_backtested_win_rate: Option<f64>,
    /// Mean backtested strategy CAGR, percent.
    pub avg_strategy_cagr: Option<f64>,
    /// Mean backtested strategy Sharpe ratio.
    pub avg_strategy_sharpe: Option<f64>,
    pub best: Option<Performer>,
    pub worst: Option<Performer>,
}

/// Mean of the values, `None` when there are none.
fn mean_of(values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.mean())
    }
}

/// Profit of one record: realized when closed, MTM against today's price when open.
pub fn record_profit_pct(record: &StandardizedRecord) -> Option<f64> {
    if record.is_open() {
        record.mark_to_market_pct(record.today_price?)
    } else {
        record.realized_pct()
    }
}

/// Days held: signal to exit for closed records, signal to fetch date for open ones.
pub fn holding_days(record: &StandardizedRecord, fetch_date: NaiveDate) -> Option<i64> {
    let start = record.signal_date?;
    let end = if record.is_open() {
        fetch_date
    } else {
        record.exit_date?
    };
    Some((end - start).num_days())
}

impl SignalSummary {
    /// Summarize the records as of `fetch_date`.
    pub fn from_records(records: &[StandardizedRecord], fetch_date: NaiveDate) -> Self {
        let performers: Vec<Performer> = records
            .iter()
            .filter_map(|record| {
                Some(Performer {
                    symbol: record.symbol.clone().unwrap_or_default(),
                    dedup_key: record.dedup_key.clone(),
                    profit_pct: record_profit_pct(record)?,
                })
            })
            .collect();

        let winners = performers.iter().filter(|p| p.profit_pct > 0.0).count();
        let actual_win_rate = if performers.is_empty() {
            None
        } else {
            Some(winners as f64 / performers.len() as f64 * 100.0)
        };

        let best = performers
            .iter()
            .max_by_key(|p| OrderedFloat(p.profit_pct))
            .cloned();
        let worst = performers
            .iter()
            .min_by_key(|p| OrderedFloat(p.profit_pct))
            .cloned();

        Self {
            total: records.len(),
            measured: performers.len(),
            winners,
            actual_win_rate,
            avg_profit_pct: mean_of(performers.iter().map(|p| p.profit_pct).collect()),
            avg_holding_days: mean_of(
                records
                    .iter()
                    .filter_map(|r| holding_days(r, fetch_date))
                    .map(|d| d as f64)
                    .collect(),
            ),
            avg_backtested_win_rate: mean_of(records.iter().filter_map(|r| r.win_rate).collect()),
            avg_strategy_cagr: mean_of(records.iter().filter_map(|r| r.strategy_cagr).collect()),
            avg_strategy_sharpe: mean_of(
                records.iter().filter_map(|r| r.strategy_sharpe).collect(),
            ),
            best,
            worst,
        }
    }
}
