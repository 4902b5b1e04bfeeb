//! SQLite-backed table store.
//!
//! Each named table is one SQLite table of `TEXT` columns. Writes drop and
//! recreate the table inside a single transaction.

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use signal_core::{Error, Result};
use std::path::Path;
use tracing::debug;

use crate::table::{Table, TableStore};

fn db_error(err: rusqlite::Error) -> Error {
    Error::database(err.to_string())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cell_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    })
}

/// Tables stored in one SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_error)?;
        Ok(Self { conn })
    }

    /// Private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Ok(Self { conn })
    }

    fn exists(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        Ok(found.is_some())
    }
}

impl TableStore for SqliteStore {
    fn read_table(&self, name: &str) -> Result<Option<Table>> {
        if !self.exists(name)? {
            return Ok(None);
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote_ident(name)))
            .map_err(db_error)?;
        let headers: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = headers.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| cell_text(row, i))
                    .collect::<rusqlite::Result<Vec<String>>>()
            })
            .map_err(db_error)?;

        let mut table = Table::new(headers);
        for row in rows {
            table.push_row(row.map_err(db_error)?);
        }
        Ok(Some(table))
    }

    /// A table without headers is stored as no table at all.
    fn write_table(&self, name: &str, table: &Table) -> Result<()> {
        let ident = quote_ident(name);
        let tx = self.conn.unchecked_transaction().map_err(db_error)?;

        tx.execute(&format!("DROP TABLE IF EXISTS {ident}"), [])
            .map_err(db_error)?;

        if !table.headers().is_empty() {
            let columns: Vec<String> = table
                .headers()
                .iter()
                .map(|h| format!("{} TEXT", quote_ident(h)))
                .collect();
            tx.execute(&format!("CREATE TABLE {ident} ({})", columns.join(", ")), [])
                .map_err(db_error)?;

            let placeholders: Vec<String> =
                (1..=table.headers().len()).map(|i| format!("?{i}")).collect();
            let mut insert = tx
                .prepare(&format!(
                    "INSERT INTO {ident} VALUES ({})",
                    placeholders.join(", ")
                ))
                .map_err(db_error)?;
            for row in table.cells() {
                insert.execute(params_from_iter(row.iter())).map_err(db_error)?;
            }
        }

        tx.commit().map_err(db_error)?;
        debug!(table = name, rows = table.len(), "Wrote SQLite table");
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(db_error)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_error)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(db_error)?;
        Ok(names)
    }
}
