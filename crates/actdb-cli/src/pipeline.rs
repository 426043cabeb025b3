//! End-to-end driver: flux + schedule -> merged activation table -> sink.

use std::fs;

use actdb_core::errors::{ActError, ErrorInfo};
use actdb_core::{canonical_json_bytes, GroupStructure, RunProvenance};
use actdb_flux::{normalize, parse_flux_file, FluxMatrix, NormalizedFluxShape};
use actdb_sched::{solve_grid, ScheduleGrid};
use actdb_table::{ActivationTable, Cell, ResultAssembler, RunSpec, TableSink};
use serde::Serialize;
use tracing::info;

use crate::config::RunConfig;

/// Numeric inputs derived from a configuration before any table is touched.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Energy group structure the flux is binned with.
    pub groups: GroupStructure,
    /// Solved schedule grid (pulse counts x duty cycles).
    pub grid: ScheduleGrid,
    /// Parsed, unnormalized flux.
    pub flux: FluxMatrix,
    /// Per-zone spectral shapes.
    pub shape: NormalizedFluxShape,
}

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Numeric intermediates.
    pub prepared: Prepared,
    /// Merged result table.
    pub table: ActivationTable,
    /// Provenance of the result table.
    pub provenance: RunProvenance,
}

/// Reads the group structure named by `config`.
pub fn load_groups(config: &RunConfig) -> Result<GroupStructure, ActError> {
    let text = fs::read_to_string(&config.group_structure).map_err(|err| {
        ActError::InvalidGroupStructure(
            ErrorInfo::new("groups.read", "failed to read group structure file")
                .with_context("path", config.group_structure.display())
                .with_hint(err.to_string()),
        )
    })?;
    GroupStructure::from_yaml_str(&text)
}

/// Solves the schedule and parses and normalizes the flux.
pub fn prepare(config: &RunConfig) -> Result<Prepared, ActError> {
    let grid = solve_grid(
        &config.active_burn_time,
        &config.duty_cycles,
        &config.num_pulses,
    )?;
    let groups = load_groups(config)?;
    let flux = parse_flux_file(&config.flux_file, &groups)?;
    let shape = normalize(&flux, &groups, config.shape_convention)?;
    info!(
        group_structure = groups.name(),
        zones = flux.zones(),
        schedule_points = grid.points().len(),
        "prepared flux and schedule"
    );
    Ok(Prepared {
        groups,
        grid,
        flux,
        shape,
    })
}

/// Runs the whole pipeline without writing anything.
pub fn run(config: &RunConfig) -> Result<PipelineOutput, ActError> {
    if config.runs.is_empty() {
        return Err(ActError::Config(
            ErrorInfo::new("config.missing", "at least one run is required to build a table")
                .with_context("key", "runs"),
        ));
    }
    let prepared = prepare(config)?;
    let mut runs = Vec::with_capacity(config.runs.len());
    for entry in &config.runs {
        let schedule = *prepared
            .grid
            .find(entry.duty_cycle, entry.num_pulses)
            .map_err(|err| {
                ActError::InvalidScheduleParameter(
                    err.info().clone().with_context("run", &entry.label),
                )
            })?;
        let table = ActivationTable::from_csv_path(&entry.table)?;
        info!(run = %entry.label, rows = table.len(), "loaded activation table");
        runs.push((
            table,
            RunSpec {
                label: entry.label.clone(),
                schedule,
                time_unit: config.time_unit,
            },
        ));
    }
    let assembler = ResultAssembler::new(config.columns.clone(), config.averaging);
    let table = assembler.assemble(runs, &prepared.shape)?;
    let provenance = RunProvenance::for_config(
        config,
        prepared.groups.name(),
        config.runs.iter().map(|run| run.label.clone()).collect(),
    )?;
    Ok(PipelineOutput {
        prepared,
        table,
        provenance,
    })
}

/// One-row table describing how a result table was produced.
pub fn provenance_table(provenance: &RunProvenance) -> Result<ActivationTable, ActError> {
    let mut table = ActivationTable::new(
        ["input_hash", "group_structure", "run_labels", "created_at", "tool_versions"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );
    table.push_row(vec![
        Cell::from(provenance.input_hash.as_str()),
        Cell::from(provenance.group_structure.as_str()),
        Cell::Text(json_text(&provenance.run_labels)?),
        Cell::from(provenance.created_at.as_str()),
        Cell::Text(json_text(&provenance.tool_versions)?),
    ])?;
    Ok(table)
}

fn json_text<T: Serialize>(value: &T) -> Result<String, ActError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes the result table and its provenance to `sink` as one unit.
pub fn persist(
    output: &PipelineOutput,
    config: &RunConfig,
    sink: &mut dyn TableSink,
) -> Result<(), ActError> {
    let provenance = provenance_table(&output.provenance)?;
    sink.write_tables(&[
        (config.output.table.as_str(), &output.table),
        (config.output.provenance_table.as_str(), &provenance),
    ])
}
