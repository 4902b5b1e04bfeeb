//! Individual eligibility gates shared by the entry and exit rule sets.
//!
//! Each gate returns `Ok(())` or the first [`Rejection`] it finds. A missing
//! input is always a rejection.

use chrono::NaiveDate;
use signal_core::{ClassifierConfig, SignalFunction, StandardizedRecord};
use std::fmt;

/// Why a record was excluded from a candidate list.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// A required input is null.
    MissingField(&'static str),
    NotLong,
    NotOpen,
    NotClosed,
    WinRateTooLow(f64),
    TooFewTrades(u32),
    /// Signal price is zero or negative, so no move can be computed.
    InvalidSignalPrice(f64),
    /// Price already ran up past the upper band.
    PriceRanUp(f64),
    /// Price fell through the lower band.
    PriceFellTooFar(f64),
    /// Industry PE does not exceed the stock's PE.
    NotCheaperThanIndustry { pe: f64, industry_pe: f64 },
    PeAboveCap(f64),
    WeakEarnings { last_quarter: f64, last_year_quarter: f64 },
    TrendPulseNotDeclining { start: f64, end: f64 },
    /// Signal date outside the entry recency window, in days.
    StaleSignal(i64),
    /// Exit date older than the exit recency window, in days.
    StaleExit(i64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingField(name) => write!(f, "missing {name}"),
            Rejection::NotLong => write!(f, "not a LONG signal"),
            Rejection::NotOpen => write!(f, "position already closed"),
            Rejection::NotClosed => write!(f, "position still open"),
            Rejection::WinRateTooLow(w) => write!(f, "win rate {w:.2}% too low"),
            Rejection::TooFewTrades(n) => write!(f, "only {n} backtested trades"),
            Rejection::InvalidSignalPrice(p) => write!(f, "invalid signal price {p}"),
            Rejection::PriceRanUp(pct) => write!(f, "price ran up {pct:.2}%"),
            Rejection::PriceFellTooFar(pct) => write!(f, "price fell {pct:.2}%"),
            Rejection::NotCheaperThanIndustry { pe, industry_pe } => {
                write!(f, "PE {pe} not below industry PE {industry_pe}")
            }
            Rejection::PeAboveCap(pe) => write!(f, "PE {pe} above cap"),
            Rejection::WeakEarnings {
                last_quarter,
                last_year_quarter,
            } => write!(
                f,
                "last quarter profit {last_quarter} weak vs {last_year_quarter} a year ago"
            ),
            Rejection::TrendPulseNotDeclining { start, end } => {
                write!(f, "trendpulse {start} -> {end} not declining")
            }
            Rejection::StaleSignal(days) => write!(f, "signal is {days} days old"),
            Rejection::StaleExit(days) => write!(f, "exit is {days} days old"),
        }
    }
}

pub type GateResult = Result<(), Rejection>;

fn require<T: Copy>(value: Option<T>, name: &'static str) -> Result<T, Rejection> {
    value.ok_or(Rejection::MissingField(name))
}

/// Backtest quality: both win rate and trade count strictly above the minimums.
pub fn backtest_quality(record: &StandardizedRecord, config: &ClassifierConfig) -> GateResult {
    let win_rate = require(record.win_rate, "Win_Rate")?;
    let trades = require(record.number_of_trades, "Number_Of_Trades")?;
    if win_rate <= config.min_win_rate {
        return Err(Rejection::WinRateTooLow(win_rate));
    }
    if trades <= config.min_num_trades {
        return Err(Rejection::TooFewTrades(trades));
    }
    Ok(())
}

/// Move of today's price against the signal price, in percent.
pub fn price_move_pct(record: &StandardizedRecord) -> Result<f64, Rejection> {
    let signal = require(record.signal_price, "Signal_Price")?;
    let today = require(record.today_price, "Today_Price")?;
    if signal <= 0.0 {
        return Err(Rejection::InvalidSignalPrice(signal));
    }
    Ok((today - signal) / signal * 100.0)
}

/// Asymmetric price band: `lower < pct < upper`, both bounds exclusive.
pub fn price_band(record: &StandardizedRecord, config: &ClassifierConfig) -> GateResult {
    let pct = price_move_pct(record)?;
    if pct >= config.price_band_upper_pct {
        return Err(Rejection::PriceRanUp(pct));
    }
    if pct <= config.price_band_lower_pct {
        return Err(Rejection::PriceFellTooFar(pct));
    }
    Ok(())
}

/// Relative and absolute valuation.
pub fn valuation(record: &StandardizedRecord, config: &ClassifierConfig) -> GateResult {
    let pe = require(record.pe_ratio, "PE_Ratio")?;
    let industry_pe = require(record.industry_pe, "Industry_PE")?;
    if industry_pe <= pe {
        return Err(Rejection::NotCheaperThanIndustry { pe, industry_pe });
    }
    if pe >= config.max_pe_ratio {
        return Err(Rejection::PeAboveCap(pe));
    }
    Ok(())
}

/// Earnings momentum: last quarter beats `profit_ratio` of the same quarter last year.
pub fn earnings_momentum(record: &StandardizedRecord, config: &ClassifierConfig) -> GateResult {
    let last_quarter = require(record.last_quarter_profit, "Last_Quarter_Profit")?;
    let last_year_quarter = require(
        record.last_year_same_quarter_profit,
        "Last_Year_Same_Quarter_Profit",
    )?;
    if last_quarter <= config.profit_ratio * last_year_quarter {
        return Err(Rejection::WeakEarnings {
            last_quarter,
            last_year_quarter,
        });
    }
    Ok(())
}

/// Trendline signals must show a price decline across the trend window.
pub fn trendpulse_direction(record: &StandardizedRecord) -> GateResult {
    if record.function != SignalFunction::Trendline {
        return Ok(());
    }
    let start = require(record.trendpulse_start_price, "TrendPulse_Start_Price")?;
    let end = require(record.trendpulse_end_price, "TrendPulse_End_Price")?;
    if start <= end {
        return Err(Rejection::TrendPulseNotDeclining { start, end });
    }
    Ok(())
}

/// Optional entry gate: `0 <= fetch - signal_date <= max_days`.
pub fn signal_recency(
    record: &StandardizedRecord,
    fetch_date: NaiveDate,
    max_days: Option<i64>,
) -> GateResult {
    let Some(max_days) = max_days else {
        return Ok(());
    };
    let signal_date = require(record.signal_date, "Signal_Date")?;
    let age = (fetch_date - signal_date).num_days();
    if !(0..=max_days).contains(&age) {
        return Err(Rejection::StaleSignal(age));
    }
    Ok(())
}

/// Exit must have closed no more than `max_days` before the fetch date.
///
/// Exit dates after the fetch date are accepted.
pub fn exit_recency(
    record: &StandardizedRecord,
    fetch_date: NaiveDate,
    max_days: i64,
) -> GateResult {
    let exit_date = require(record.exit_date, "Exit_Date")?;
    require(record.exit_price, "Exit_Price")?;
    let age = (fetch_date - exit_date).num_days();
    if age > max_days {
        return Err(Rejection::StaleExit(age));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn priced(signal: f64, today: f64) -> StandardizedRecord {
        let mut record = StandardizedRecord::new(SignalFunction::Distance);
        record.signal_price = Some(signal);
        record.today_price = Some(today);
        record
    }

    #[test]
    fn test_price_band_upper_boundary() {
        let config = ClassifierConfig::default();
        assert!(matches!(
            price_band(&priced(100.0, 101.0), &config),
            Err(Rejection::PriceRanUp(_))
        ));
        assert!(price_band(&priced(100.0, 100.9), &config).is_ok());
    }

    #[test]
    fn test_price_band_lower_boundary() {
        let config = ClassifierConfig::default();
        assert!(matches!(
            price_band(&priced(100.0, 97.0), &config),
            Err(Rejection::PriceFellTooFar(_))
        ));
        assert!(price_band(&priced(100.0, 97.01), &config).is_ok());
    }

    #[test]
    fn test_price_band_lower_edge_with_inexact_prices() {
        // 7.1101 against 7.33 lands on -3.0 exactly when divided first.
        let config = ClassifierConfig::default();
        let record = priced(7.33, 7.1101);
        assert_eq!(price_move_pct(&record), Ok(-3.0));
        assert!(matches!(
            price_band(&record, &config),
            Err(Rejection::PriceFellTooFar(_))
        ));
    }

    #[test]
    fn test_price_move_pct() {
        assert_relative_eq!(price_move_pct(&priced(100.0, 101.0)).unwrap(), 1.0);
        assert_relative_eq!(price_move_pct(&priced(100.0, 97.0)).unwrap(), -3.0);
        assert_eq!(
            price_move_pct(&priced(0.0, 10.0)),
            Err(Rejection::InvalidSignalPrice(0.0))
        );
        let mut missing = priced(100.0, 100.0);
        missing.today_price = None;
        assert_eq!(
            price_move_pct(&missing),
            Err(Rejection::MissingField("Today_Price"))
        );
    }

    #[test]
    fn test_backtest_quality_is_strict() {
        let config = ClassifierConfig::default();
        let mut record = StandardizedRecord::new(SignalFunction::Distance);
        record.win_rate = Some(80.0);
        record.number_of_trades = Some(13);
        assert_eq!(
            backtest_quality(&record, &config),
            Err(Rejection::WinRateTooLow(80.0))
        );

        record.win_rate = Some(80.01);
        record.number_of_trades = Some(6);
        assert_eq!(
            backtest_quality(&record, &config),
            Err(Rejection::TooFewTrades(6))
        );

        record.number_of_trades = Some(7);
        assert!(backtest_quality(&record, &config).is_ok());
    }

    #[test]
    fn test_valuation() {
        let config = ClassifierConfig::default();
        let mut record = StandardizedRecord::new(SignalFunction::Distance);
        record.pe_ratio = Some(20.0);
        record.industry_pe = Some(20.0);
        assert!(matches!(
            valuation(&record, &config),
            Err(Rejection::NotCheaperThanIndustry { .. })
        ));

        record.pe_ratio = Some(50.0);
        record.industry_pe = Some(60.0);
        assert_eq!(valuation(&record, &config), Err(Rejection::PeAboveCap(50.0)));

        record.pe_ratio = Some(15.0);
        assert!(valuation(&record, &config).is_ok());
    }

    #[test]
    fn test_earnings_momentum() {
        let config = ClassifierConfig::default();
        let mut record = StandardizedRecord::new(SignalFunction::Distance);
        record.last_quarter_profit = Some(100.0);
        record.last_year_same_quarter_profit = Some(200.0);
        assert!(earnings_momentum(&record, &config).is_err());

        record.last_quarter_profit = Some(100.5);
        assert!(earnings_momentum(&record, &config).is_ok());

        // Negative base year: any profit above half a loss passes.
        record.last_quarter_profit = Some(-10.0);
        record.last_year_same_quarter_profit = Some(-40.0);
        assert!(earnings_momentum(&record, &config).is_ok());
    }

    #[test]
    fn test_trendpulse_only_for_trendline() {
        let mut record = StandardizedRecord::new(SignalFunction::Distance);
        assert!(trendpulse_direction(&record).is_ok());

        record.function = SignalFunction::Trendline;
        assert_eq!(
            trendpulse_direction(&record),
            Err(Rejection::MissingField("TrendPulse_Start_Price"))
        );

        record.trendpulse_start_price = Some(40.0);
        record.trendpulse_end_price = Some(40.0);
        assert!(trendpulse_direction(&record).is_err());

        record.trendpulse_start_price = Some(50.0);
        assert!(trendpulse_direction(&record).is_ok());
    }

    #[test]
    fn test_signal_recency() {
        let fetch = date("2026-02-10");
        let mut record = StandardizedRecord::new(SignalFunction::Distance);
        assert!(signal_recency(&record, fetch, None).is_ok());
        assert_eq!(
            signal_recency(&record, fetch, Some(3)),
            Err(Rejection::MissingField("Signal_Date"))
        );

        record.signal_date = Some(date("2026-02-07"));
        assert!(signal_recency(&record, fetch, Some(3)).is_ok());
        record.signal_date = Some(date("2026-02-06"));
        assert_eq!(
            signal_recency(&record, fetch, Some(3)),
            Err(Rejection::StaleSignal(4))
        );
        record.signal_date = Some(date("2026-02-11"));
        assert_eq!(
            signal_recency(&record, fetch, Some(3)),
            Err(Rejection::StaleSignal(-1))
        );
    }

    #[test]
    fn test_exit_recency_boundary() {
        let fetch = date("2026-02-10");
        let mut record = StandardizedRecord::new(SignalFunction::Distance);
        record.exit_price = Some(101.0);

        record.exit_date = Some(date("2026-02-07"));
        assert!(exit_recency(&record, fetch, 3).is_ok());

        record.exit_date = Some(date("2026-02-06"));
        assert_eq!(exit_recency(&record, fetch, 3), Err(Rejection::StaleExit(4)));

        record.exit_date = Some(date("2026-02-12"));
        assert!(exit_recency(&record, fetch, 3).is_ok());

        record.exit_price = None;
        assert_eq!(
            exit_recency(&record, fetch, 3),
            Err(Rejection::MissingField("Exit_Price"))
        );
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(
            Rejection::MissingField("PE_Ratio").to_string(),
            "missing PE_Ratio"
        );
        assert_eq!(Rejection::StaleExit(5).to_string(), "exit is 5 days old");
    }
}
