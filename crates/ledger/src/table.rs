//! In-memory tables and the persistence boundary.
//!
//! The pipeline only needs a list of string rows in and out; [`TableStore`]
//! is the seam where file formats plug in.

use chrono::NaiveDate;
use signal_core::{RawSignalRow, Result};

/// A header row plus string cells, as read from or written to storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from mapped rows.
    ///
    /// Headers are the union of every row's columns in first-seen order;
    /// cells a row lacks are written empty.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a RawSignalRow>,
    {
        let rows: Vec<&RawSignalRow> = rows.into_iter().collect();
        let mut headers: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.columns() {
                if !headers.iter().any(|h| h == column) {
                    headers.push(column.to_string());
                }
            }
        }

        let cells = rows
            .iter()
            .map(|row| headers.iter().map(|h| row.text(h).to_string()).collect())
            .collect();

        Self {
            headers,
            rows: cells,
        }
    }

    /// Append a row; short rows are padded and long rows truncated to the header width.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw cell rows, aligned with [`Table::headers`].
    pub fn cells(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows as column-name mappings.
    pub fn rows(&self) -> impl Iterator<Item = RawSignalRow> + '_ {
        self.rows.iter().map(|cells| {
            RawSignalRow::from_pairs(
                self.headers
                    .iter()
                    .zip(cells.iter())
                    .map(|(h, v)| (h.as_str(), v.as_str())),
            )
        })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when there are no data rows, including header-only tables.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Storage for named tables.
///
/// Implementations must make `write_table` a full replacement: after a
/// failed write the previous contents are still readable.
pub trait TableStore {
    /// Read a table; `Ok(None)` when it does not exist.
    fn read_table(&self, name: &str) -> Result<Option<Table>>;

    /// Replace a table's contents atomically.
    fn write_table(&self, name: &str, table: &Table) -> Result<()>;

    /// Names of every stored table.
    fn table_names(&self) -> Result<Vec<String>>;

    /// Newest table named `YYYY-MM-DD_<suffix>`.
    fn latest_dated(&self, suffix: &str) -> Result<Option<String>> {
        let names = self.table_names()?;
        Ok(latest_dated_name(names.iter().map(String::as_str), suffix))
    }
}

/// Date prefix of a `YYYY-MM-DD_<suffix>` name, if it is a real calendar date.
pub fn dated_prefix(name: &str, suffix: &str) -> Option<NaiveDate> {
    let prefix = name.strip_suffix(suffix)?.strip_suffix('_')?;
    if prefix.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Pick the newest `YYYY-MM-DD_<suffix>` name; names that do not match are ignored.
pub fn latest_dated_name<'a, I>(names: I, suffix: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter_map(|name| dated_prefix(name, suffix).map(|date| (date, name)))
        .max()
        .map(|(_, name)| name.to_string())
}
