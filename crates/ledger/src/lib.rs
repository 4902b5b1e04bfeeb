//! Master ledger, persistence and run orchestration.
//!
//! This crate provides:
//! - The deduplicated master ledger with key-based merge
//! - Table stores (CSV directory, SQLite) behind one trait
//! - Record/row conversion for the persisted artifacts
//! - Decoupled today-price refresh
//! - The ingest/classify pipeline

pub mod codec;
pub mod csv_store;
pub mod fetch_date;
pub mod ledger;
pub mod pipeline;
pub mod prices;
pub mod sqlite_store;
pub mod table;

pub use csv_store::{latest_dated_file, CsvStore};
pub use fetch_date::{read_fetch_date, resolve_fetch_date};
pub use ledger::{curated_table, MasterLedger, MergeStats};
pub use pipeline::{ClassifyReport, IngestReport, RunReport, SignalPipeline};
pub use prices::{refresh_today_prices, LocalPriceStore, PriceSource, RefreshReport, TodayDateCache};
pub use sqlite_store::SqliteStore;
pub use table::{Table, TableStore};
