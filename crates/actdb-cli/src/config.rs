use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use actdb_core::errors::{ActError, ErrorInfo};
use actdb_core::TimeUnit;
use actdb_flux::{AveragingStrategy, ShapeConvention};
use actdb_sched::BurnTime;
use actdb_table::ColumnMapping;
use serde::{Deserialize, Serialize};

/// YAML run file describing one post-processing job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Multi-group flux file.
    pub flux_file: PathBuf,
    /// YAML file holding `{name, boundaries}` of the energy group structure.
    pub group_structure: PathBuf,
    /// Active burn time, scalar or one value per pulse count.
    pub active_burn_time: BurnTime,
    /// Duty cycles to solve for.
    pub duty_cycles: Vec<f64>,
    /// Pulse counts to solve for.
    #[serde(alias = "pulse_list")]
    pub num_pulses: Vec<u32>,
    /// Unit of `active_burn_time`.
    #[serde(default)]
    pub time_unit: TimeUnit,
    /// Averaging strategy for `avg_flux_mag`.
    #[serde(default)]
    pub averaging: AveragingStrategy,
    /// Convention for `flux_spectrum_shape`.
    #[serde(default)]
    pub shape_convention: ShapeConvention,
    /// Activation runs merged into the output table.
    #[serde(default)]
    pub runs: Vec<RunEntry>,
    /// Drop/rename rules applied to every run table.
    #[serde(default)]
    pub columns: ColumnMapping,
    /// Sink configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// One activation run and its schedule point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEntry {
    /// Label stored in `run_lbl`.
    pub label: String,
    /// CSV activation table for the run.
    pub table: PathBuf,
    /// Duty cycle the run was computed with.
    pub duty_cycle: f64,
    /// Pulse count the run was computed with.
    pub num_pulses: u32,
}

/// Where and under which names results are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// SQLite database (`.db`, `.sqlite`) or CSV directory.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Name of the result table.
    #[serde(default = "default_table")]
    pub table: String,
    /// Name of the provenance table.
    #[serde(default = "default_provenance_table")]
    pub provenance_table: String,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("activation_results.db")
}

fn default_table() -> String {
    "number_densities".to_string()
}

fn default_provenance_table() -> String {
    "run_provenance".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            table: default_table(),
            provenance_table: default_provenance_table(),
        }
    }
}

impl RunConfig {
    /// Parses a YAML document without touching the filesystem.
    pub fn from_yaml_str(text: &str) -> Result<Self, ActError> {
        let config: RunConfig = serde_yaml::from_str(text).map_err(|err| {
            ActError::Config(
                ErrorInfo::new("config.parse", "failed to parse run configuration")
                    .with_hint(err.to_string()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a run file and resolves its relative paths against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ActError> {
        let text = fs::read_to_string(path).map_err(|err| {
            ActError::Config(
                ErrorInfo::new("config.read", "failed to read run configuration")
                    .with_context("path", path.display())
                    .with_hint(err.to_string()),
            )
        })?;
        let mut config = Self::from_yaml_str(&text).map_err(|err| match err {
            ActError::Config(info) => ActError::Config(info.with_context("path", path.display())),
            other => other,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.flux_file);
        resolve(&mut self.group_structure);
        resolve(&mut self.output.path);
        for run in &mut self.runs {
            resolve(&mut run.table);
        }
    }

    fn validate(&self) -> Result<(), ActError> {
        if self.duty_cycles.is_empty() {
            return Err(ActError::Config(
                ErrorInfo::new("config.missing", "at least one duty cycle is required")
                    .with_context("key", "duty_cycles"),
            ));
        }
        if self.num_pulses.is_empty() {
            return Err(ActError::Config(
                ErrorInfo::new("config.missing", "at least one pulse count is required")
                    .with_context("key", "num_pulses"),
            ));
        }
        let mut labels = BTreeSet::new();
        for (idx, run) in self.runs.iter().enumerate() {
            if run.label.trim().is_empty() {
                return Err(ActError::Config(
                    ErrorInfo::new("config.run-label", "run labels must be non-empty")
                        .with_context("key", format!("runs[{idx}].label")),
                ));
            }
            if !labels.insert(run.label.as_str()) {
                return Err(ActError::Config(
                    ErrorInfo::new("config.run-label", "run labels must be unique")
                        .with_context("key", format!("runs[{idx}].label"))
                        .with_context("label", &run.label),
                ));
            }
        }
        Ok(())
    }
}
