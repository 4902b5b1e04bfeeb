//! End-to-end runs over a directory of CSV files.

use anyhow::Result;
use chrono::NaiveDate;
use signal_core::columns::*;
use signal_core::{Config, PathsConfig, RawSignalRow};
use signal_ledger::{
    LocalPriceStore, MasterLedger, PriceSource, SignalPipeline, Table, TableStore, TodayDateCache,
};
use std::fs;
use std::path::Path;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn config_for(root: &Path) -> Config {
    Config {
        paths: PathsConfig {
            source_dir: root.join("trade_store"),
            price_dir: root.join("stock_data"),
            ..PathsConfig::default()
        },
        ..Config::default()
    }
}

fn trendline_row(symbol: &str, exit: &str) -> RawSignalRow {
    RawSignalRow::from_pairs([
        (SRC_SIGNAL, format!("{symbol}, Long, 2026-02-09 (Price: 100)")),
        (SRC_WIN_RATE, "92.3%, Past 4 years, 13".to_string()),
        (SRC_TODAY_VS_SIGNAL, "2026-02-10 (Price: 100.9), 0.9% above".to_string()),
        (SRC_INTERVAL, "Daily, is CONFIRMED on 2026-02-09".to_string()),
        (
            SRC_TRENDPULSE,
            "2025-12-18 (Price: 50)/2026-02-09 (Price: 40)".to_string(),
        ),
        (SRC_EXIT_SIGNAL, exit.to_string()),
        (SRC_STRATEGY_CAGR, "24.34%".to_string()),
        (PE_RATIO, "15".to_string()),
        (INDUSTRY_PE, "20".to_string()),
        (LAST_QUARTER_PROFIT, "120".to_string()),
        (LAST_YEAR_SAME_QUARTER_PROFIT, "200".to_string()),
        ("Backtested Returns", "310%".to_string()),
    ])
}

fn write_source(config: &Config, name: &str, rows: &[RawSignalRow]) -> Result<()> {
    let pipeline = SignalPipeline::from_config(config.clone());
    pipeline.store().write_table(name, &Table::from_rows(rows))?;
    Ok(())
}

#[test]
fn test_full_run_writes_all_artifacts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config_for(dir.path());

    write_source(
        &config,
        "2026-02-10_Trendline.csv",
        &[
            trendline_row("OPEN.NS", "No Exit Yet"),
            trendline_row("CLOSED.NS", "2026-02-09 (Price: 104.5)"),
        ],
    )?;
    // An older file is ignored.
    write_source(
        &config,
        "2026-02-01_Trendline.csv",
        &[trendline_row("OLD.NS", "No Exit Yet")],
    )?;

    let pipeline = SignalPipeline::from_config(config.clone());
    let report = pipeline.run(date("2026-02-10"), None)?;

    assert_eq!(report.ingest.sources, vec!["2026-02-10_Trendline.csv"]);
    assert_eq!(report.classify.entries, 1);
    assert_eq!(report.classify.exits, 1);

    let source_dir = &config.paths.source_dir;
    for file in ["all_signals.csv", "potential_entry.csv", "potential_exit.csv"] {
        assert!(source_dir.join(file).is_file(), "{file} not written");
    }

    let ledger = MasterLedger::load(pipeline.store(), "all_signals.csv")?;
    assert_eq!(ledger.len(), 2);
    let open = ledger
        .get("Trendline|OPEN.NS|2026-02-09|LONG|Daily")
        .expect("open record");
    assert_eq!(open.raw.get("Backtested Returns"), Some("310%"));
    assert_eq!(open.strategy_cagr, Some(24.34));

    let ledger_csv = fs::read_to_string(source_dir.join("all_signals.csv"))?;
    let header = ledger_csv.lines().next().unwrap_or_default();
    assert!(header.starts_with("Symbol,Signal_Type,Signal_Date"));
    assert!(header.contains("Backtested Returns"));

    let entry_csv = fs::read_to_string(source_dir.join("potential_entry.csv"))?;
    assert!(!entry_csv.contains("Backtested Returns"));
    assert!(entry_csv.contains("OPEN.NS"));
    Ok(())
}

#[test]
fn test_newer_observation_supersedes_older() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config_for(dir.path());

    write_source(
        &config,
        "2026-02-10_Distance.csv",
        &[trendline_row("X.NS", "No Exit Yet")],
    )?;
    let pipeline = SignalPipeline::from_config(config.clone());
    pipeline.run(date("2026-02-10"), None)?;

    write_source(
        &config,
        "2026-02-11_Distance.csv",
        &[trendline_row("X.NS", "2026-02-11 (Price: 99.0)")],
    )?;
    let report = pipeline.run(date("2026-02-11"), None)?;

    assert_eq!(report.ingest.ledger_size, 1);
    assert_eq!(report.classify.entries, 0);
    assert_eq!(report.classify.exits, 1);

    let ledger = pipeline.load_ledger()?;
    let record = ledger.iter().next().expect("one record");
    assert!(!record.is_open());
    assert_eq!(record.exit_price, Some(99.0));
    Ok(())
}

#[test]
fn test_local_price_refresh() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config_for(dir.path());
    write_source(
        &config,
        "2026-02-10_Trendline.csv",
        &[trendline_row("OPEN.NS", "No Exit Yet")],
    )?;

    fs::create_dir_all(&config.paths.price_dir)?;
    fs::write(
        config.paths.price_dir.join("OPEN.NS.csv"),
        "Date,Close\n2026-02-10,100.504\n2026-02-11,96.0\n",
    )?;
    fs::write(config.paths.today_date_path(), r#"{"OPEN.NS": "2026-02-10"}"#)?;

    let dates = TodayDateCache::load(&config.paths.today_date_path());
    let prices = LocalPriceStore::new(&config.paths.price_dir, &dates);

    let pipeline = SignalPipeline::from_config(config.clone());
    let report = pipeline.run(date("2026-02-10"), Some(&prices as &dyn PriceSource))?;

    assert_eq!(report.refresh.map(|r| r.updated), Some(1));
    assert_eq!(report.classify.entries, 1);

    let ledger = pipeline.load_ledger()?;
    let record = ledger.iter().next().expect("one record");
    assert_eq!(record.today_price, Some(100.5));
    Ok(())
}

#[test]
fn test_no_sources_leaves_artifacts_untouched() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config_for(dir.path());
    fs::create_dir_all(&config.paths.source_dir)?;
    fs::write(config.paths.source_dir.join("all_signals.csv"), "Symbol\nKEEP\n")?;

    let pipeline = SignalPipeline::from_config(config.clone());
    assert!(pipeline.run(date("2026-02-10"), None).is_err());

    let kept = fs::read_to_string(config.paths.source_dir.join("all_signals.csv"))?;
    assert_eq!(kept, "Symbol\nKEEP\n");
    Ok(())
}
