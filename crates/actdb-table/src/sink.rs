//! Persistence sinks for finished activation tables.

use std::fs;
use std::path::{Path, PathBuf};

use actdb_core::errors::{ActError, ErrorInfo};
use csv::WriterBuilder;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction};
use tracing::info;

use crate::table::{ActivationTable, Cell};

/// Destination accepting whole tables.
///
/// Writing a table replaces any existing table of the same name; a failed
/// write leaves the previous contents in place.
pub trait TableSink {
    /// Writes `table` under `name`.
    fn write_table(&mut self, name: &str, table: &ActivationTable) -> Result<(), ActError> {
        self.write_tables(&[(name, table)])
    }

    /// Writes several tables as one unit: either all of them replace their
    /// previous contents or none does.
    fn write_tables(&mut self, tables: &[(&str, &ActivationTable)]) -> Result<(), ActError>;
}

fn persistence_error(code: &str, message: &str, table: &str, err: impl ToString) -> ActError {
    ActError::Persistence(
        ErrorInfo::new(code, message)
            .with_context("table", table)
            .with_hint(err.to_string()),
    )
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_affinity(table: &ActivationTable, idx: usize) -> &'static str {
    let mut affinity = "INTEGER";
    for row in table.rows() {
        match &row[idx] {
            Cell::Null | Cell::Integer(_) => {}
            Cell::Real(_) => affinity = "REAL",
            Cell::Text(_) => return "TEXT",
        }
    }
    affinity
}

fn to_sql_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Integer(value) => Value::Integer(*value),
        Cell::Real(value) => Value::Real(*value),
        Cell::Text(value) => Value::Text(value.clone()),
    }
}

/// SQLite-backed sink.
#[derive(Debug)]
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, ActError> {
        ensure_parent(path)?;
        let conn = Connection::open(path).map_err(|err| {
            ActError::Persistence(
                ErrorInfo::new("sink.sqlite-open", "failed to open sqlite database")
                    .with_context("path", path.display())
                    .with_hint(err.to_string()),
            )
        })?;
        Ok(Self { conn })
    }

    /// Wraps an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Reads a table back, typing cells from their SQLite storage class.
    pub fn read_table(&self, name: &str) -> Result<ActivationTable, ActError> {
        let sql = format!("SELECT * FROM {}", quote_ident(name));
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|err| persistence_error("sink.sqlite-prepare", "failed to prepare query", name, err))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();
        let mut table = ActivationTable::new(columns);
        let mut rows = stmt
            .query([])
            .map_err(|err| persistence_error("sink.sqlite-query", "failed to query table", name, err))?;
        while let Some(row) = rows
            .next()
            .map_err(|err| persistence_error("sink.sqlite-row", "failed to fetch row", name, err))?
        {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                let value: Value = row.get(idx).map_err(|err| {
                    persistence_error("sink.sqlite-get", "failed to read column", name, err)
                })?;
                cells.push(match value {
                    Value::Null | Value::Blob(_) => Cell::Null,
                    Value::Integer(v) => Cell::Integer(v),
                    Value::Real(v) => Cell::Real(v),
                    Value::Text(v) => Cell::Text(v),
                });
            }
            table.push_row(cells)?;
        }
        Ok(table)
    }
}

fn replace_table(
    tx: &Transaction<'_>,
    name: &str,
    table: &ActivationTable,
) -> Result<(), ActError> {
    let ident = quote_ident(name);
    let definitions: Vec<String> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| format!("{} {}", quote_ident(column), column_affinity(table, idx)))
        .collect();
    let placeholders = vec!["?"; table.columns().len()].join(", ");

    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {ident}; CREATE TABLE {ident} ({});",
        definitions.join(", ")
    ))
    .map_err(|err| persistence_error("sink.sqlite-schema", "failed to recreate table", name, err))?;
    let mut stmt = tx
        .prepare(&format!("INSERT INTO {ident} VALUES ({placeholders})"))
        .map_err(|err| persistence_error("sink.sqlite-prepare", "failed to prepare insert", name, err))?;
    for (row_idx, row) in table.rows().iter().enumerate() {
        stmt.execute(params_from_iter(row.iter().map(to_sql_value)))
            .map_err(|err| {
                ActError::Persistence(
                    ErrorInfo::new("sink.sqlite-insert", "failed to insert row")
                        .with_context("table", name)
                        .with_context("row", row_idx)
                        .with_hint(err.to_string()),
                )
            })?;
    }
    Ok(())
}

impl TableSink for SqliteSink {
    fn write_tables(&mut self, tables: &[(&str, &ActivationTable)]) -> Result<(), ActError> {
        let names: Vec<&str> = tables.iter().map(|(name, _)| *name).collect();
        let label = names.join(",");
        let tx = self.conn.transaction().map_err(|err| {
            persistence_error("sink.sqlite-transaction", "failed to start transaction", &label, err)
        })?;
        for (name, table) in tables {
            replace_table(&tx, name, table)?;
        }
        tx.commit()
            .map_err(|err| persistence_error("sink.sqlite-commit", "failed to commit tables", &label, err))?;
        for (name, table) in tables {
            info!(table = *name, rows = table.len(), "wrote sqlite table");
        }
        Ok(())
    }
}

/// Sink writing one `<name>.csv` file per table into a directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    /// Creates a sink rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the table `name` is written to.
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl CsvSink {
    fn stage(&self, name: &str, table: &ActivationTable) -> Result<PathBuf, ActError> {
        let staging = self.table_path(name).with_extension("csv.partial");
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&staging)
            .map_err(|err| persistence_error("sink.csv-open", "failed to open CSV output", name, err))?;
        writer
            .write_record(table.columns())
            .map_err(|err| persistence_error("sink.csv-write", "failed to write header", name, err))?;
        for row in table.rows() {
            writer
                .write_record(row.iter().map(Cell::to_string))
                .map_err(|err| persistence_error("sink.csv-write", "failed to write row", name, err))?;
        }
        writer
            .flush()
            .map_err(|err| persistence_error("sink.csv-flush", "failed to flush CSV output", name, err))?;
        Ok(staging)
    }
}

impl TableSink for CsvSink {
    /// Stages every table before moving any into place, so a failed write
    /// leaves all previous files untouched.
    fn write_tables(&mut self, tables: &[(&str, &ActivationTable)]) -> Result<(), ActError> {
        let label = tables.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(",");
        fs::create_dir_all(&self.dir)
            .map_err(|err| persistence_error("sink.csv-dir", "failed to create output directory", &label, err))?;
        let mut staged = Vec::with_capacity(tables.len());
        for (name, table) in tables {
            match self.stage(name, table) {
                Ok(path) => staged.push(path),
                Err(err) => {
                    for path in &staged {
                        let _ = fs::remove_file(path);
                    }
                    return Err(err);
                }
            }
        }
        for ((name, table), staging) in tables.iter().zip(staged) {
            let target = self.table_path(name);
            fs::rename(&staging, &target)
                .map_err(|err| persistence_error("sink.csv-rename", "failed to move CSV into place", name, err))?;
            info!(table = *name, rows = table.len(), path = %target.display(), "wrote csv table");
        }
        Ok(())
    }
}

/// Sink selected from an output path.
#[derive(Debug)]
pub enum Sink {
    /// SQLite database.
    Sqlite(SqliteSink),
    /// Directory of CSV files.
    Csv(CsvSink),
}

impl Sink {
    /// Opens SQLite for `.db`/`.sqlite`/`.sqlite3` paths and a CSV directory
    /// otherwise.
    pub fn from_path(path: &Path) -> Result<Self, ActError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("db") | Some("sqlite") | Some("sqlite3") => Ok(Sink::Sqlite(SqliteSink::open(path)?)),
            _ => Ok(Sink::Csv(CsvSink::new(path))),
        }
    }
}

impl TableSink for Sink {
    fn write_tables(&mut self, tables: &[(&str, &ActivationTable)]) -> Result<(), ActError> {
        match self {
            Sink::Sqlite(sink) => sink.write_tables(tables),
            Sink::Csv(sink) => sink.write_tables(tables),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), ActError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            ActError::Persistence(
                ErrorInfo::new("sink.create-dir", "failed to create output directory")
                    .with_context("path", parent.display())
                    .with_hint(err.to_string()),
            )
        })?;
    }
    Ok(())
}
