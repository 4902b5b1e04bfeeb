//! PyO3 bindings for the trade signal ledger.
//!
//! Exposes the Rust core to the Python dashboard:
//! - Field parsers for the compound source columns
//! - Record normalization
//! - Entry/exit classification
//! - The full ingest/classify pipeline

use chrono::NaiveDate;
use pyo3::exceptions::{PyFileNotFoundError, PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use tracing_subscriber::EnvFilter;

use signal_classifier::SignalClassifier;
use signal_core::{
    ClassifierConfig as RustClassifierConfig, Config as RustConfig, Error as RustError,
    RawSignalRow, SignalFunction, StandardizedRecord as RustRecord,
};
use signal_ingestion::fields;
use signal_ledger::SignalPipeline;

fn to_py_err(err: RustError) -> PyErr {
    match err {
        RustError::MissingSources(_) => PyFileNotFoundError::new_err(err.to_string()),
        RustError::Config(_) | RustError::Data(_) => PyValueError::new_err(err.to_string()),
        RustError::Io(_) => PyIOError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn parse_date(text: &str) -> PyResult<NaiveDate> {
    fields::parse_iso_date(text)
        .ok_or_else(|| PyValueError::new_err(format!("invalid date '{text}', expected YYYY-MM-DD")))
}

fn fmt_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

// ============================================================================
// Field parsers
// ============================================================================

/// Parse `"<symbol>, <signal>, <date> (Price: <p>)"` into
/// `(symbol, signal_type, signal_date, signal_price)`, or `None`.
#[pyfunction]
fn parse_signal_column(text: &str) -> Option<(String, String, String, f64)> {
    fields::parse_signal_column(text).map(|s| {
        (
            s.symbol,
            s.signal_type.to_string(),
            s.signal_date.format("%Y-%m-%d").to_string(),
            s.signal_price,
        )
    })
}

/// `(win_rate_pct, number_of_trades)`.
#[pyfunction]
fn parse_win_rate_and_trades(text: &str) -> (Option<f64>, Option<u32>) {
    fields::parse_win_rate_and_trades(text)
}

/// `(price, abs_pct, signed_pct)`.
#[pyfunction]
fn parse_today_vs_signal(text: &str) -> (Option<f64>, Option<f64>, Option<f64>) {
    let t = fields::parse_today_vs_signal(text);
    (t.price, t.abs_pct, t.signed_pct)
}

/// `(start_price, end_price)`; both `None` unless two prices are present.
#[pyfunction]
fn parse_trendpulse_start_end(text: &str) -> (Option<f64>, Option<f64>) {
    match fields::parse_trendpulse_start_end(text) {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    }
}

#[pyfunction]
fn parse_interval(text: &str) -> String {
    fields::parse_interval(text)
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// A normalized signal record.
#[pyclass(name = "StandardizedRecord")]
#[derive(Clone)]
pub struct StandardizedRecord {
    inner: RustRecord,
}

#[pymethods]
impl StandardizedRecord {
    #[getter]
    fn symbol(&self) -> Option<String> {
        self.inner.symbol.clone()
    }

    #[getter]
    fn signal_type(&self) -> String {
        self.inner.signal_type.to_string()
    }

    #[getter]
    fn signal_date(&self) -> Option<String> {
        fmt_date(self.inner.signal_date)
    }

    #[getter]
    fn signal_price(&self) -> Option<f64> {
        self.inner.signal_price
    }

    #[getter]
    fn win_rate(&self) -> Option<f64> {
        self.inner.win_rate
    }

    #[getter]
    fn number_of_trades(&self) -> Option<u32> {
        self.inner.number_of_trades
    }

    #[getter]
    fn today_price(&self) -> Option<f64> {
        self.inner.today_price
    }

    /// Only the today price may change after normalization.
    #[setter]
    fn set_today_price(&mut self, price: Option<f64>) {
        self.inner.today_price = price;
    }

    #[getter]
    fn exit_signal_raw(&self) -> String {
        self.inner.exit_signal_raw.clone()
    }

    #[getter]
    fn exit_date(&self) -> Option<String> {
        fmt_date(self.inner.exit_date)
    }

    #[getter]
    fn exit_price(&self) -> Option<f64> {
        self.inner.exit_price
    }

    #[getter]
    fn function(&self) -> String {
        self.inner.function.to_string()
    }

    #[getter]
    fn interval(&self) -> String {
        self.inner.interval.clone()
    }

    #[getter]
    fn pe_ratio(&self) -> Option<f64> {
        self.inner.pe_ratio
    }

    #[getter]
    fn industry_pe(&self) -> Option<f64> {
        self.inner.industry_pe
    }

    #[getter]
    fn last_quarter_profit(&self) -> Option<f64> {
        self.inner.last_quarter_profit
    }

    #[getter]
    fn last_year_same_quarter_profit(&self) -> Option<f64> {
        self.inner.last_year_same_quarter_profit
    }

    #[getter]
    fn strategy_cagr(&self) -> Option<f64> {
        self.inner.strategy_cagr
    }

    #[getter]
    fn strategy_sharpe(&self) -> Option<f64> {
        self.inner.strategy_sharpe
    }

    #[getter]
    fn trendpulse_start_price(&self) -> Option<f64> {
        self.inner.trendpulse_start_price
    }

    #[getter]
    fn trendpulse_end_price(&self) -> Option<f64> {
        self.inner.trendpulse_end_price
    }

    #[getter]
    fn dedup_key(&self) -> String {
        self.inner.dedup_key.clone()
    }

    #[getter]
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Unrealized P&L at `price` in percent, sign inverted for SHORT.
    fn mark_to_market_pct(&self, price: f64) -> Option<f64> {
        self.inner.mark_to_market_pct(price)
    }

    fn __repr__(&self) -> String {
        format!(
            "StandardizedRecord(key={:?}, status={})",
            self.inner.dedup_key,
            if self.inner.is_open() { "OPEN" } else { "CLOSED" }
        )
    }
}

impl From<RustRecord> for StandardizedRecord {
    fn from(inner: RustRecord) -> Self {
        StandardizedRecord { inner }
    }
}

/// Entry/exit thresholds.
#[pyclass]
#[derive(Clone)]
pub struct ClassifierConfig {
    #[pyo3(get, set)]
    pub min_win_rate: f64,
    #[pyo3(get, set)]
    pub min_num_trades: u32,
    #[pyo3(get, set)]
    pub price_band_upper_pct: f64,
    #[pyo3(get, set)]
    pub price_band_lower_pct: f64,
    #[pyo3(get, set)]
    pub max_pe_ratio: f64,
    #[pyo3(get, set)]
    pub profit_ratio: f64,
    #[pyo3(get, set)]
    pub exit_recency_days: i64,
    #[pyo3(get, set)]
    pub entry_signal_recency_days: Option<i64>,
}

#[pymethods]
impl ClassifierConfig {
    #[new]
    fn new() -> Self {
        RustClassifierConfig::default().into()
    }

    fn __repr__(&self) -> String {
        format!(
            "ClassifierConfig(min_win_rate={}, min_num_trades={}, band=({}, {}), \
             max_pe={}, profit_ratio={}, exit_days={})",
            self.min_win_rate,
            self.min_num_trades,
            self.price_band_lower_pct,
            self.price_band_upper_pct,
            self.max_pe_ratio,
            self.profit_ratio,
            self.exit_recency_days
        )
    }
}

impl From<RustClassifierConfig> for ClassifierConfig {
    fn from(c: RustClassifierConfig) -> Self {
        ClassifierConfig {
            min_win_rate: c.min_win_rate,
            min_num_trades: c.min_num_trades,
            price_band_upper_pct: c.price_band_upper_pct,
            price_band_lower_pct: c.price_band_lower_pct,
            max_pe_ratio: c.max_pe_ratio,
            profit_ratio: c.profit_ratio,
            exit_recency_days: c.exit_recency_days,
            entry_signal_recency_days: c.entry_signal_recency_days,
        }
    }
}

impl From<&ClassifierConfig> for RustClassifierConfig {
    fn from(c: &ClassifierConfig) -> Self {
        RustClassifierConfig {
            min_win_rate: c.min_win_rate,
            min_num_trades: c.min_num_trades,
            price_band_upper_pct: c.price_band_upper_pct,
            price_band_lower_pct: c.price_band_lower_pct,
            max_pe_ratio: c.max_pe_ratio,
            profit_ratio: c.profit_ratio,
            exit_recency_days: c.exit_recency_days,
            entry_signal_recency_days: c.entry_signal_recency_days,
        }
    }
}

fn classifier_for(config: Option<&ClassifierConfig>) -> PyResult<SignalClassifier> {
    let config: RustClassifierConfig = config.map(Into::into).unwrap_or_default();
    config.validate().map_err(to_py_err)?;
    Ok(SignalClassifier::new(config))
}

// ============================================================================
// Functions
// ============================================================================

/// Normalize one source row (a dict of column name to cell) for a function
/// (`"Distance"` or `"Trendline"`).
#[pyfunction]
fn build_standard_record(row: &Bound<'_, PyDict>, function: &str) -> PyResult<StandardizedRecord> {
    let function: SignalFunction = function.parse().map_err(to_py_err)?;

    let mut raw = RawSignalRow::new();
    for (key, value) in row.iter() {
        let text = if value.is_none() {
            String::new()
        } else {
            value.str()?.to_string()
        };
        raw.insert(key.str()?.to_string(), text);
    }

    Ok(signal_ingestion::build_standard_record(&raw, function).into())
}

/// Whether the record is a potential entry as of `fetch_date`.
#[pyfunction]
#[pyo3(signature = (record, fetch_date, config=None))]
fn entry_conditions(
    record: &StandardizedRecord,
    fetch_date: &str,
    config: Option<&ClassifierConfig>,
) -> PyResult<bool> {
    let classifier = classifier_for(config)?;
    Ok(classifier.entry_conditions(&record.inner, parse_date(fetch_date)?))
}

/// Whether the record is a potential exit as of `fetch_date`.
#[pyfunction]
#[pyo3(signature = (record, fetch_date, config=None))]
fn exit_conditions(
    record: &StandardizedRecord,
    fetch_date: &str,
    config: Option<&ClassifierConfig>,
) -> PyResult<bool> {
    let classifier = classifier_for(config)?;
    Ok(classifier.exit_conditions(&record.inner, parse_date(fetch_date)?))
}

/// Why the record is not an entry, or `None` when it is one.
#[pyfunction]
#[pyo3(signature = (record, fetch_date, config=None))]
fn entry_rejection(
    record: &StandardizedRecord,
    fetch_date: &str,
    config: Option<&ClassifierConfig>,
) -> PyResult<Option<String>> {
    let classifier = classifier_for(config)?;
    Ok(classifier
        .check_entry(&record.inner, parse_date(fetch_date)?)
        .err()
        .map(|r| r.to_string()))
}

/// Run ingest and classification.
///
/// `config_path` is a JSON config file (defaults when omitted). The fetch date
/// falls back to the configured fetch-date file, then to today.
/// Returns `(ledger_size, entries, exits)`.
#[pyfunction]
#[pyo3(signature = (config_path=None, fetch_date=None))]
fn run_pipeline(
    py: Python<'_>,
    config_path: Option<&str>,
    fetch_date: Option<&str>,
) -> PyResult<(usize, usize, usize)> {
    let config = match config_path {
        Some(path) => RustConfig::from_json_file(path).map_err(to_py_err)?,
        None => RustConfig::default(),
    };
    let explicit = fetch_date.map(parse_date).transpose()?;

    py.allow_threads(|| {
        let pipeline = SignalPipeline::from_config(config);
        let fetch_date = explicit
            .unwrap_or_else(|| pipeline.fetch_date(chrono::Local::now().date_naive()));
        let report = pipeline.run(fetch_date, None).map_err(to_py_err)?;
        Ok((
            report.ingest.ledger_size,
            report.classify.entries,
            report.classify.exits,
        ))
    })
}

/// Install a `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins over `level` when set. Returns `False` if a subscriber
/// was already installed.
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

// ============================================================================
// Module Definition
// ============================================================================

/// Trade signal ledger core - Rust components for Python.
#[pymodule]
fn signal_ledger_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<StandardizedRecord>()?;
    m.add_class::<ClassifierConfig>()?;

    // Parsers
    m.add_function(wrap_pyfunction!(parse_signal_column, m)?)?;
    m.add_function(wrap_pyfunction!(parse_win_rate_and_trades, m)?)?;
    m.add_function(wrap_pyfunction!(parse_today_vs_signal, m)?)?;
    m.add_function(wrap_pyfunction!(parse_trendpulse_start_end, m)?)?;
    m.add_function(wrap_pyfunction!(parse_interval, m)?)?;

    // Records and rules
    m.add_function(wrap_pyfunction!(build_standard_record, m)?)?;
    m.add_function(wrap_pyfunction!(entry_conditions, m)?)?;
    m.add_function(wrap_pyfunction!(exit_conditions, m)?)?;
    m.add_function(wrap_pyfunction!(entry_rejection, m)?)?;

    // Pipeline
    m.add_function(wrap_pyfunction!(run_pipeline, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    Ok(())
}
