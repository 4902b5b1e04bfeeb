//! Deduplicated master ledger of signals.
//!
//! One record per dedup key; a merge always replaces the whole record.

use signal_core::columns::{CURATED_COLUMNS, LEDGER_COLUMNS};
use signal_core::{Result, StandardizedRecord};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::codec::{record_from_row, record_to_row, RowLayout};
use crate::table::{Table, TableStore};

/// Outcome of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Keys that were not in the ledger before.
    pub inserted: usize,
    /// Keys whose record was overwritten.
    pub replaced: usize,
}

/// Latest record per dedup key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterLedger {
    records: BTreeMap<String, StandardizedRecord>,
}

/// Signal date descending with undated records last, then key ascending.
fn snapshot_order(a: &StandardizedRecord, b: &StandardizedRecord) -> Ordering {
    match (a.signal_date, b.signal_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.dedup_key.cmp(&b.dedup_key))
}

impl MasterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted ledger.
    ///
    /// A missing, empty or header-only table yields an empty ledger. Rows
    /// with an unknown `Function` are skipped.
    pub fn load<S: TableStore + ?Sized>(store: &S, name: &str) -> Result<Self> {
        let mut ledger = Self::new();
        let Some(table) = store.read_table(name)? else {
            info!(table = name, "No persisted ledger, starting empty");
            return Ok(ledger);
        };

        let mut skipped = 0usize;
        let records: Vec<StandardizedRecord> = table
            .rows()
            .filter_map(|row| match record_from_row(&row) {
                Ok(record) => Some(record),
                Err(err) => {
                    skipped += 1;
                    warn!(table = name, error = %err, "Skipping ledger row");
                    None
                }
            })
            .collect();
        ledger.merge(records);

        info!(table = name, records = ledger.len(), skipped, "Loaded ledger");
        Ok(ledger)
    }

    /// Merge records in order; later records win for a shared key.
    pub fn merge<I>(&mut self, incoming: I) -> MergeStats
    where
        I: IntoIterator<Item = StandardizedRecord>,
    {
        let mut stats = MergeStats::default();
        for record in incoming {
            match self.records.insert(record.dedup_key.clone(), record) {
                Some(_) => stats.replaced += 1,
                None => stats.inserted += 1,
            }
        }
        stats
    }

    /// Consuming form of [`MasterLedger::merge`].
    pub fn merged<I>(mut self, incoming: I) -> Self
    where
        I: IntoIterator<Item = StandardizedRecord>,
    {
        self.merge(incoming);
        self
    }

    pub fn get(&self, key: &str) -> Option<&StandardizedRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StandardizedRecord> {
        self.records.values()
    }

    /// Mutable access for in-place updates that keep the key stable.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut StandardizedRecord> {
        self.records.values_mut()
    }

    /// Records in persisted order.
    pub fn snapshot(&self) -> Vec<StandardizedRecord> {
        let mut records: Vec<StandardizedRecord> = self.records.values().cloned().collect();
        records.sort_by(snapshot_order);
        records
    }

    /// Full ledger table: standardized columns then passthrough columns.
    pub fn to_table(&self) -> Table {
        if self.is_empty() {
            return Table::new(LEDGER_COLUMNS);
        }
        let rows: Vec<_> = self
            .snapshot()
            .iter()
            .map(|r| record_to_row(r, RowLayout::Ledger))
            .collect();
        Table::from_rows(&rows)
    }

    /// Rewrite the persisted ledger in one atomic write.
    pub fn save<S: TableStore + ?Sized>(&self, store: &S, name: &str) -> Result<()> {
        store.write_table(name, &self.to_table())?;
        info!(table = name, records = self.len(), "Saved ledger");
        Ok(())
    }
}

/// Curated entry/exit table for a list of records, in the given order.
pub fn curated_table(records: &[StandardizedRecord]) -> Table {
    if records.is_empty() {
        return Table::new(CURATED_COLUMNS);
    }
    let rows: Vec<_> = records
        .iter()
        .map(|r| record_to_row(r, RowLayout::Curated))
        .collect();
    Table::from_rows(&rows)
}
