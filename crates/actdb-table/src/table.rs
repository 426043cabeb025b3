use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use actdb_core::errors::{ActError, ErrorInfo};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// A single typed table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value.
    Null,
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Real(f64),
    /// Free text.
    Text(String),
}

impl Cell {
    /// Types a raw CSV field: integer, then real, then text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Null;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Cell::Integer(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            return Cell::Real(value);
        }
        Cell::Text(raw.to_string())
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(value) => Some(*value as f64),
            Cell::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// Text view of the cell, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(value) => write!(f, "{value}"),
            Cell::Real(value) => write!(f, "{value}"),
            Cell::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Real(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Column-named rows, as produced by the activation output reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivationTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ActivationTable {
    /// Creates an empty table with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Loads a table from CSV with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ActError> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns = reader
            .headers()
            .map_err(|err| wrap_csv("table.csv-header", err))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut table = Self::new(columns);
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|err| {
                ActError::Table(
                    ErrorInfo::new("table.csv-record", "failed to read CSV record")
                        .with_context("row", idx)
                        .with_hint(err.to_string()),
                )
            })?;
            table.push_row(record.iter().map(Cell::infer).collect())?;
        }
        Ok(table)
    }

    /// Loads a table from a CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, ActError> {
        let file = File::open(path).map_err(|err| {
            ActError::Table(
                ErrorInfo::new("table.open", "failed to open activation table")
                    .with_context("path", path.display())
                    .with_hint(err.to_string()),
            )
        })?;
        Self::from_csv_reader(file).map_err(|err| match err {
            ActError::Table(info) => ActError::Table(info.with_context("path", path.display())),
            other => other,
        })
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row; its width must match the header.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), ActError> {
        if row.len() != self.columns.len() {
            return Err(ActError::Table(
                ErrorInfo::new("table.row-width", "row width does not match header")
                    .with_context("row", self.rows.len())
                    .with_context("cells", row.len())
                    .with_context("columns", self.columns.len()),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Position of `name` in the header.
    pub fn column_index(&self, name: &str) -> Result<usize, ActError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| {
                ActError::Table(
                    ErrorInfo::new("table.missing-column", "column not present in table")
                        .with_context("column", name),
                )
            })
    }

    /// Cells of column `name`, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&Cell>, ActError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Appends a column whose cells are computed from each existing row.
    pub fn add_column_with<F>(&mut self, name: &str, mut cell: F) -> Result<(), ActError>
    where
        F: FnMut(usize, &[Cell]) -> Result<Cell, ActError>,
    {
        if self.columns.iter().any(|column| column == name) {
            return Err(ActError::Table(
                ErrorInfo::new("table.duplicate-column", "column already present")
                    .with_context("column", name),
            ));
        }
        let mut cells = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            cells.push(cell(idx, row)?);
        }
        for (row, value) in self.rows.iter_mut().zip(cells) {
            row.push(value);
        }
        self.columns.push(name.to_string());
        Ok(())
    }

    /// Appends a column holding `value` in every row.
    pub fn add_constant_column(&mut self, name: &str, value: Cell) -> Result<(), ActError> {
        self.add_column_with(name, |_, _| Ok(value.clone()))
    }

    /// Removes column `name`.
    pub fn drop_column(&mut self, name: &str) -> Result<(), ActError> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(())
    }

    /// Renames column `from` to `to`.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), ActError> {
        let idx = self.column_index(from)?;
        if from != to && self.columns.iter().any(|column| column == to) {
            return Err(ActError::Table(
                ErrorInfo::new("table.duplicate-column", "rename target already present")
                    .with_context("column", from)
                    .with_context("target", to),
            ));
        }
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// Concatenates tables, taking the union of their columns.
    ///
    /// Columns keep first-seen order; cells missing from a table are null.
    pub fn concat(tables: Vec<ActivationTable>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut seen = BTreeSet::new();
        for table in &tables {
            for column in &table.columns {
                if seen.insert(column.clone()) {
                    columns.push(column.clone());
                }
            }
        }
        let mut merged = Self::new(columns);
        for table in tables {
            let positions: Vec<Option<usize>> = merged
                .columns
                .iter()
                .map(|column| table.columns.iter().position(|c| c == column))
                .collect();
            for row in table.rows {
                let cells = positions
                    .iter()
                    .map(|pos| pos.map(|idx| row[idx].clone()).unwrap_or(Cell::Null))
                    .collect();
                merged.rows.push(cells);
            }
        }
        merged
    }
}

fn wrap_csv(code: &str, err: csv::Error) -> ActError {
    ActError::Table(ErrorInfo::new(code, "CSV activation table failure").with_hint(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "time,time_unit,nuclide,value,block_num\n\
                          1,y,h3,1.5e20,1\n\
                          1,y,co60,2.0e18,2\n";

    #[test]
    fn csv_cells_are_typed() {
        let table = ActivationTable::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], Cell::Integer(1));
        assert_eq!(table.rows()[0][1], Cell::Text("y".into()));
        assert_eq!(table.rows()[0][3], Cell::Real(1.5e20));
    }

    #[test]
    fn rename_and_drop() {
        let mut table = ActivationTable::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        table.drop_column("time_unit").unwrap();
        table.rename_column("value", "num_dens").unwrap();
        assert_eq!(table.columns(), &["time", "nuclide", "num_dens", "block_num"]);
        assert_eq!(table.rows()[1].len(), 4);
        assert!(table.drop_column("time_unit").is_err());
    }

    #[test]
    fn concat_fills_missing_cells() {
        let mut a = ActivationTable::new(vec!["x".into()]);
        a.push_row(vec![Cell::Integer(1)]).unwrap();
        let mut b = ActivationTable::new(vec!["y".into(), "x".into()]);
        b.push_row(vec![Cell::Text("v".into()), Cell::Integer(2)]).unwrap();
        let merged = ActivationTable::concat(vec![a, b]);
        assert_eq!(merged.columns(), &["x", "y"]);
        assert_eq!(merged.rows()[0], vec![Cell::Integer(1), Cell::Null]);
        assert_eq!(merged.rows()[1], vec![Cell::Integer(2), Cell::Text("v".into())]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut table = ActivationTable::new(vec!["a".into(), "b".into()]);
        let err = table.push_row(vec![Cell::Null]).unwrap_err();
        assert_eq!(err.context("cells"), Some("1"));
    }
}
