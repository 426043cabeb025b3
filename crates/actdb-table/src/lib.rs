//! Activation tables: loading the per-run tables produced by the activation
//! code, merging schedule and flux results into them, and persisting the
//! finished table.

#![deny(missing_docs)]

pub mod assemble;
/// Column drop and rename rules.
pub mod mapping;
pub mod sink;
/// In-memory activation tables and their CSV loader.
pub mod table;

pub use assemble::{ResultAssembler, RunSpec};
pub use mapping::{ColumnAction, ColumnMapping, ColumnRule};
pub use sink::{CsvSink, Sink, SqliteSink, TableSink};
pub use table::{ActivationTable, Cell};
