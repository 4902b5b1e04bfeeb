//! Today-price refresh.
//!
//! Runs separately from ingestion and touches only `Today_Price`.

use chrono::NaiveDate;
use signal_ingestion::fields::{coerce_f64, parse_iso_date};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::csv_store::read_csv;
use crate::ledger::MasterLedger;

/// Something that can quote a latest price for a symbol.
pub trait PriceSource {
    fn latest_price(&self, symbol: &str) -> Option<f64>;
}

impl<F> PriceSource for F
where
    F: Fn(&str) -> Option<f64>,
{
    fn latest_price(&self, symbol: &str) -> Option<f64> {
        self(symbol)
    }
}

/// Symbol to expected "today" trading date, loaded once by the caller.
#[derive(Debug, Clone, Default)]
pub struct TodayDateCache {
    dates: HashMap<String, NaiveDate>,
}

impl TodayDateCache {
    /// Read `{symbol: "YYYY-MM-DD"}` from a JSON file.
    ///
    /// A missing or malformed file yields an empty cache; entries with an
    /// unparseable date are dropped.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                debug!(path = %path.display(), "No today-date file");
                return Self::default();
            }
        };
        let map: HashMap<String, serde_json::Value> = match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring malformed today-date file");
                return Self::default();
            }
        };

        let dates = map
            .into_iter()
            .filter_map(|(symbol, value)| {
                let date = parse_iso_date(value.as_str()?)?;
                Some((symbol.trim().to_string(), date))
            })
            .collect();
        Self { dates }
    }

    pub fn from_map(dates: HashMap<String, NaiveDate>) -> Self {
        Self { dates }
    }

    pub fn get(&self, symbol: &str) -> Option<NaiveDate> {
        self.dates.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Prices from `<dir>/<symbol>.csv` files with `Date` and `Close` columns.
#[derive(Debug, Clone)]
pub struct LocalPriceStore<'a> {
    dir: PathBuf,
    dates: &'a TodayDateCache,
}

impl<'a> LocalPriceStore<'a> {
    pub fn new(dir: impl Into<PathBuf>, dates: &'a TodayDateCache) -> Self {
        Self {
            dir: dir.into(),
            dates,
        }
    }
}

impl PriceSource for LocalPriceStore<'_> {
    /// Close on the cached today date when that row exists, else the last row's close.
    fn latest_price(&self, symbol: &str) -> Option<f64> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return None;
        }
        let path = self.dir.join(format!("{symbol}.csv"));
        if !path.is_file() {
            return None;
        }
        let table = match read_csv(&path) {
            Ok(table) => table,
            Err(err) => {
                warn!(symbol, error = %err, "Unreadable price file");
                return None;
            }
        };

        let close_idx = table.headers().iter().position(|h| h == "Close")?;
        let date_idx = table.headers().iter().position(|h| h == "Date");

        if let (Some(target), Some(date_idx)) = (self.dates.get(symbol), date_idx) {
            let on_target = table
                .cells()
                .iter()
                .find(|row| parse_iso_date(&row[date_idx]) == Some(target))
                .and_then(|row| coerce_f64(&row[close_idx]));
            if on_target.is_some() {
                return on_target;
            }
        }

        table.cells().last().and_then(|row| coerce_f64(&row[close_idx]))
    }
}

/// Counts from one price refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: usize,
    pub unchanged: usize,
}

/// Set `Today_Price` (rounded to cents) on every record whose symbol has a price.
///
/// Records without a symbol or a price keep their old value.
pub fn refresh_today_prices(ledger: &mut MasterLedger, source: &dyn PriceSource) -> RefreshReport {
    let mut report = RefreshReport::default();
    let mut cache: HashMap<String, Option<f64>> = HashMap::new();

    for record in ledger.iter_mut() {
        let price = record.symbol.as_deref().map(str::trim).and_then(|symbol| {
            *cache
                .entry(symbol.to_string())
                .or_insert_with(|| source.latest_price(symbol))
        });
        match price {
            Some(price) => {
                record.today_price = Some((price * 100.0).round() / 100.0);
                report.updated += 1;
            }
            None => report.unchanged += 1,
        }
    }

    info!(
        updated = report.updated,
        unchanged = report.unchanged,
        "Refreshed today prices"
    );
    report
}
