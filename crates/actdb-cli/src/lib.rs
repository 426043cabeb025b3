//! Configuration and pipeline driver behind the `actdb` binary.

pub mod config;
pub mod pipeline;

pub use config::{OutputConfig, RunConfig, RunEntry};
pub use pipeline::{load_groups, persist, prepare, provenance_table, run, PipelineOutput, Prepared};
