//! Directory-of-CSV-files table store.

use csv::{ReaderBuilder, WriterBuilder};
use signal_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::table::{latest_dated_name, Table, TableStore};

fn csv_error(path: &Path, err: csv::Error) -> Error {
    Error::table(format!("{}: {err}", path.display()))
}

/// Tables stored as `<root>/<name>` CSV files.
#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a table name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Read a CSV file. Missing trailing cells read as empty strings.
pub fn read_csv(path: &Path) -> Result<Table> {
    if fs::metadata(path)?.len() == 0 {
        return Ok(Table::default());
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        table.push_row(record.iter().map(str::to_string).collect());
    }
    Ok(table)
}

/// Write a CSV file by persisting a sibling temp file over the destination.
pub fn write_csv_atomic(path: &Path, table: &Table) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    if !table.headers().is_empty() {
        let mut writer = WriterBuilder::new().from_writer(tmp.as_file_mut());
        writer
            .write_record(table.headers())
            .map_err(|e| csv_error(path, e))?;
        for row in table.cells() {
            writer.write_record(row).map_err(|e| csv_error(path, e))?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    debug!(path = %path.display(), rows = table.len(), "Wrote CSV");
    Ok(())
}

/// Newest `YYYY-MM-DD_<suffix>` file in a directory; a missing directory yields `None`.
pub fn latest_dated_file(dir: &Path, suffix: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let names = file_names(dir)?;
    Ok(latest_dated_name(names.iter().map(String::as_str), suffix).map(|name| dir.join(name)))
}

fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

impl TableStore for CsvStore {
    fn read_table(&self, name: &str) -> Result<Option<Table>> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Ok(None);
        }
        read_csv(&path).map(Some)
    }

    fn write_table(&self, name: &str, table: &Table) -> Result<()> {
        write_csv_atomic(&self.path_for(name), table)
    }

    fn table_names(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        file_names(&self.root)
    }
}
