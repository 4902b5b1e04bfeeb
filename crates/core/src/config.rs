//! Configuration structures for the signal ledger.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration for a ledger run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entry/exit rule thresholds.
    pub classifier: ClassifierConfig,
    /// File locations of sources and artifacts.
    pub paths: PathsConfig,
}

impl Config {
    /// Load a configuration from a JSON file.
    ///
    /// Every section and field is optional; anything left out keeps its
    /// default. The result is validated before it is returned.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that thresholds are internally consistent.
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()
    }
}

/// Entry/exit classifier thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Backtested win rate must be strictly above this (percent).
    pub min_win_rate: f64,
    /// Backtested trade count must be strictly above this.
    pub min_num_trades: u32,
    /// Entry rejected when today's move vs signal is at or above this (percent).
    pub price_band_upper_pct: f64,
    /// Entry rejected when today's move vs signal is at or below this (percent).
    pub price_band_lower_pct: f64,
    /// PE ratio must be strictly below this.
    pub max_pe_ratio: f64,
    /// Last quarter profit must exceed this multiple of the same quarter last year.
    pub profit_ratio: f64,
    /// Exits older than this many days before the fetch date are dropped.
    pub exit_recency_days: i64,
    /// When set, entries need a signal no older than this many days.
    pub entry_signal_recency_days: Option<i64>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_win_rate: 80.0,
            min_num_trades: 6,
            price_band_upper_pct: 1.0,
            price_band_lower_pct: -3.0,
            max_pe_ratio: 50.0,
            profit_ratio: 0.5,
            exit_recency_days: 3,
            entry_signal_recency_days: None,
        }
    }
}

impl ClassifierConfig {
    /// Reject inverted bands and negative windows.
    pub fn validate(&self) -> Result<()> {
        if self.price_band_lower_pct >= self.price_band_upper_pct {
            return Err(Error::config(format!(
                "price band lower bound {} must be below upper bound {}",
                self.price_band_lower_pct, self.price_band_upper_pct
            )));
        }
        if self.profit_ratio < 0.0 {
            return Err(Error::config(format!(
                "profit_ratio must be non-negative, got {}",
                self.profit_ratio
            )));
        }
        if self.exit_recency_days < 0 {
            return Err(Error::config(format!(
                "exit_recency_days must be non-negative, got {}",
                self.exit_recency_days
            )));
        }
        if matches!(self.entry_signal_recency_days, Some(days) if days < 0) {
            return Err(Error::config(
                "entry_signal_recency_days must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Where sources live and where artifacts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the dated source tables and the output artifacts.
    pub source_dir: PathBuf,
    /// Suffix of Distance source files (`YYYY-MM-DD_<suffix>`).
    pub distance_suffix: String,
    /// Suffix of Trendline source files (`YYYY-MM-DD_<suffix>`).
    pub trendline_suffix: String,
    /// Master ledger artifact name.
    pub ledger_file: String,
    /// Potential entry artifact name.
    pub entry_file: String,
    /// Potential exit artifact name.
    pub exit_file: String,
    /// Directory of per-symbol price files (`<symbol>.csv`).
    pub price_dir: PathBuf,
    /// Symbol to "today" date map, relative to `price_dir`.
    pub today_date_file: String,
    /// Data fetch date marker, relative to `source_dir`.
    pub fetch_date_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("trade_store/INDIA"),
            distance_suffix: "Distance.csv".to_string(),
            trendline_suffix: "Trendline.csv".to_string(),
            ledger_file: "all_signals.csv".to_string(),
            entry_file: "potential_entry.csv".to_string(),
            exit_file: "potential_exit.csv".to_string(),
            price_dir: PathBuf::from("stock_data/INDIA"),
            today_date_file: "today_date.json".to_string(),
            fetch_date_file: "data_fetch_datetime.json".to_string(),
        }
    }
}

impl PathsConfig {
    /// Full path of the symbol to date map.
    pub fn today_date_path(&self) -> PathBuf {
        self.price_dir.join(&self.today_date_file)
    }

    /// Full path of the fetch date marker.
    pub fn fetch_date_path(&self) -> PathBuf {
        self.source_dir.join(&self.fetch_date_file)
    }
}
