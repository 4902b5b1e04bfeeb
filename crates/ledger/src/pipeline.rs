//! Run orchestration: ingest sources, refresh prices, classify.
//!
//! Every step reads what it needs fully into memory and computes all
//! outputs before the first write, so a failed run leaves the previous
//! artifacts in place.

use chrono::NaiveDate;
use signal_classifier::{SignalClassifier, SignalSummary};
use signal_core::{Config, Error, Result, SignalFunction};
use signal_ingestion::normalize_rows;
use tracing::{info, warn};

use crate::csv_store::CsvStore;
use crate::fetch_date::resolve_fetch_date;
use crate::ledger::{curated_table, MasterLedger, MergeStats};
use crate::prices::{refresh_today_prices, PriceSource, RefreshReport};
use crate::table::{Table, TableStore};

/// What one ingest pass read and merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Source tables that were read, by name.
    pub sources: Vec<String>,
    /// Rows normalized across all sources.
    pub rows: usize,
    pub merge: MergeStats,
    /// Ledger size after the merge.
    pub ledger_size: usize,
}

/// Sizes and performance of the candidate lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifyReport {
    pub fetch_date: Option<NaiveDate>,
    pub entries: usize,
    pub exits: usize,
    pub entry_summary: SignalSummary,
    pub exit_summary: SignalSummary,
}

/// Combined report of [`SignalPipeline::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub ingest: IngestReport,
    pub refresh: Option<RefreshReport>,
    pub classify: ClassifyReport,
}

/// Ledger pipeline over one table store.
pub struct SignalPipeline<S: TableStore> {
    config: Config,
    store: S,
    classifier: SignalClassifier,
}

impl SignalPipeline<CsvStore> {
    /// Pipeline over the CSV files in `config.paths.source_dir`.
    pub fn from_config(config: Config) -> Self {
        let store = CsvStore::new(config.paths.source_dir.clone());
        Self::new(config, store)
    }
}

impl<S: TableStore> SignalPipeline<S> {
    pub fn new(config: Config, store: S) -> Self {
        let classifier = SignalClassifier::new(config.classifier.clone());
        Self {
            config,
            store,
            classifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch date from the configured file, else `fallback`.
    pub fn fetch_date(&self, fallback: NaiveDate) -> NaiveDate {
        resolve_fetch_date(&self.config.paths.fetch_date_path(), fallback)
    }

    /// Load the persisted ledger.
    pub fn load_ledger(&self) -> Result<MasterLedger> {
        MasterLedger::load(&self.store, &self.config.paths.ledger_file)
    }

    /// Latest Distance and Trendline tables; fails when neither exists.
    fn read_sources(&self) -> Result<Vec<(SignalFunction, String, Table)>> {
        let paths = &self.config.paths;
        let mut sources = Vec::new();

        for (function, suffix) in [
            (SignalFunction::Distance, &paths.distance_suffix),
            (SignalFunction::Trendline, &paths.trendline_suffix),
        ] {
            let Some(name) = self.store.latest_dated(suffix)? else {
                warn!(function = %function, suffix = %suffix, "No source table found");
                continue;
            };
            let table = self.store.read_table(&name)?.unwrap_or_default();
            info!(function = %function, source = %name, rows = table.len(), "Read source table");
            sources.push((function, name, table));
        }

        if sources.is_empty() {
            return Err(Error::missing_sources(
                paths.source_dir.display().to_string(),
            ));
        }
        Ok(sources)
    }

    fn ingest_into(&self, ledger: &mut MasterLedger) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for (function, name, table) in self.read_sources()? {
            let rows: Vec<_> = table.rows().collect();
            let (records, stats) = normalize_rows(&rows, function);
            if stats.unparsed_signal > 0 || stats.unrecognized_signal_type > 0 {
                warn!(
                    source = %name,
                    unparsed = stats.unparsed_signal,
                    unrecognized_type = stats.unrecognized_signal_type,
                    "Source rows with malformed signal columns"
                );
            }

            let merge = ledger.merge(records);
            report.rows += stats.rows;
            report.merge.inserted += merge.inserted;
            report.merge.replaced += merge.replaced;
            report.sources.push(name);
        }

        report.ledger_size = ledger.len();
        info!(
            rows = report.rows,
            inserted = report.merge.inserted,
            replaced = report.merge.replaced,
            ledger_size = report.ledger_size,
            "Merged sources into ledger"
        );
        Ok(report)
    }

    fn classify_ledger(
        &self,
        ledger: &MasterLedger,
        fetch_date: NaiveDate,
    ) -> (Table, Table, ClassifyReport) {
        let snapshot = ledger.snapshot();
        let classification = self.classifier.classify(&snapshot, fetch_date);

        let report = ClassifyReport {
            fetch_date: Some(fetch_date),
            entries: classification.entries.len(),
            exits: classification.exits.len(),
            entry_summary: SignalSummary::from_records(&classification.entries, fetch_date),
            exit_summary: SignalSummary::from_records(&classification.exits, fetch_date),
        };
        (
            curated_table(&classification.entries),
            curated_table(&classification.exits),
            report,
        )
    }

    fn write_lists(&self, entries: &Table, exits: &Table) -> Result<()> {
        self.store.write_table(&self.config.paths.entry_file, entries)?;
        self.store.write_table(&self.config.paths.exit_file, exits)
    }

    /// Merge the latest sources into the persisted ledger.
    pub fn ingest(&self) -> Result<IngestReport> {
        let mut ledger = self.load_ledger()?;
        let report = self.ingest_into(&mut ledger)?;
        ledger.save(&self.store, &self.config.paths.ledger_file)?;
        Ok(report)
    }

    /// Rewrite the potential entry and exit tables from the persisted ledger.
    pub fn classify(&self, fetch_date: NaiveDate) -> Result<ClassifyReport> {
        let ledger = self.load_ledger()?;
        let (entries, exits, report) = self.classify_ledger(&ledger, fetch_date);
        self.write_lists(&entries, &exits)?;
        Ok(report)
    }

    /// Refresh `Today_Price` across the persisted ledger.
    pub fn refresh_prices(&self, source: &dyn PriceSource) -> Result<RefreshReport> {
        let mut ledger = self.load_ledger()?;
        let report = refresh_today_prices(&mut ledger, source);
        ledger.save(&self.store, &self.config.paths.ledger_file)?;
        Ok(report)
    }

    /// Ingest, optionally refresh prices, then classify.
    pub fn run(
        &self,
        fetch_date: NaiveDate,
        prices: Option<&dyn PriceSource>,
    ) -> Result<RunReport> {
        let mut ledger = self.load_ledger()?;
        let ingest = self.ingest_into(&mut ledger)?;
        let refresh = prices.map(|source| refresh_today_prices(&mut ledger, source));
        let (entries, exits, classify) = self.classify_ledger(&ledger, fetch_date);

        ledger.save(&self.store, &self.config.paths.ledger_file)?;
        self.write_lists(&entries, &exits)?;

        info!(
            %fetch_date,
            ledger_size = ingest.ledger_size,
            entries = classify.entries,
            exits = classify.exits,
            "Pipeline run complete"
        );
        Ok(RunReport {
            ingest,
            refresh,
            classify,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_store::SqliteStore;
    use signal_core::columns::*;
    use signal_core::RawSignalRow;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn source_row(symbol: &str, today: &str) -> RawSignalRow {
        RawSignalRow::from_pairs([
            (SRC_SIGNAL, format!("{symbol}, Long, 2026-02-09 (Price: 100)")),
            (SRC_WIN_RATE, "92.3%, Past 4 years, 13".to_string()),
            (SRC_TODAY_VS_SIGNAL, format!("2026-02-10 (Price: {today}), 0.9% above")),
            (SRC_INTERVAL, "Daily, is CONFIRMED on 2026-02-09".to_string()),
            (SRC_EXIT_SIGNAL, "No Exit Yet".to_string()),
            (PE_RATIO, "15".to_string()),
            (INDUSTRY_PE, "20".to_string()),
            (LAST_QUARTER_PROFIT, "120".to_string()),
            (LAST_YEAR_SAME_QUARTER_PROFIT, "200".to_string()),
        ])
    }

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        let rows = [source_row("A", "100.9"), source_row("B", "105")];
        store
            .write_table("2026-02-10_Distance.csv", &Table::from_rows(&rows))
            .unwrap();
        store
    }

    #[test]
    fn test_missing_sources_is_an_error() {
        let pipeline = SignalPipeline::new(Config::default(), SqliteStore::in_memory().unwrap());
        assert!(matches!(pipeline.ingest(), Err(Error::MissingSources(_))));
        assert!(pipeline.store().read_table("all_signals.csv").unwrap().is_none());
    }

    #[test]
    fn test_run_over_sqlite_store() {
        let pipeline = SignalPipeline::new(Config::default(), seeded_store());
        let report = pipeline.run(date("2026-02-10"), None).unwrap();

        assert_eq!(report.ingest.rows, 2);
        assert_eq!(report.ingest.ledger_size, 2);
        assert_eq!(report.classify.entries, 1);
        assert_eq!(report.classify.exits, 0);

        let entries = pipeline.store().read_table("potential_entry.csv").unwrap().unwrap();
        let rows: Vec<_> = entries.rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(SYMBOL), Some("A"));

        let exits = pipeline.store().read_table("potential_exit.csv").unwrap().unwrap();
        assert!(exits.is_empty());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let pipeline = SignalPipeline::new(Config::default(), seeded_store());
        pipeline.run(date("2026-02-10"), None).unwrap();
        let first = pipeline.load_ledger().unwrap();

        let second_report = pipeline.run(date("2026-02-10"), None).unwrap();
        let second = pipeline.load_ledger().unwrap();

        assert_eq!(second_report.ingest.merge, MergeStats { inserted: 0, replaced: 2 });
        assert_eq!(first, second);
    }

    #[test]
    fn test_refresh_prices_moves_entry_out_of_band() {
        let pipeline = SignalPipeline::new(Config::default(), seeded_store());
        pipeline.ingest().unwrap();

        let source = |_: &str| Some(110.0);
        let refreshed = pipeline.refresh_prices(&source).unwrap();
        assert_eq!(refreshed.updated, 2);

        let report = pipeline.classify(date("2026-02-10")).unwrap();
        assert_eq!(report.entries, 0);
    }
}
