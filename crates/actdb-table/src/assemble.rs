//! Merges schedule and flux results into activation tables.

use actdb_core::errors::{ActError, ErrorInfo};
use actdb_core::TimeUnit;
use actdb_flux::{average, AveragingStrategy, NormalizedFluxShape};
use actdb_sched::ScheduleResult;
use tracing::debug;

use crate::mapping::ColumnMapping;
use crate::table::{ActivationTable, Cell};

/// Column of the raw table identifying the flux zone of a row.
pub const ZONE_COLUMN: &str = "block_num";

/// Names of the columns the assembler adds.
pub mod columns {
    /// Active burn time in seconds.
    pub const ACTIVE_T_IRR: &str = "active_t_irr_(s)";
    /// Dwell time between pulses in seconds.
    pub const DWELL_T: &str = "dwell_t_(s)";
    /// Total irradiation time in seconds.
    pub const TOTAL_T_IRR: &str = "total_t_irr_(s)";
    /// Duty cycle of the run.
    pub const DUTY_CYCLE: &str = "duty_cycle";
    /// Pulse count of the run.
    pub const NUM_PULSES: &str = "num_pulses";
    /// JSON array holding the zone's normalized spectrum.
    pub const FLUX_SPECTRUM_SHAPE: &str = "flux_spectrum_shape";
    /// Time-averaged flux magnitude of the zone.
    pub const AVG_FLUX_MAG: &str = "avg_flux_mag";
    /// Run label.
    pub const RUN_LBL: &str = "run_lbl";
}

/// One activation run and the schedule point it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpec {
    /// Label written to the `run_lbl` column.
    pub label: String,
    /// Solved schedule point.
    pub schedule: ScheduleResult,
    /// Unit the schedule times are expressed in.
    pub time_unit: TimeUnit,
}

/// Adds schedule- and flux-derived columns to activation tables and applies
/// the configured column mapping.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    mapping: ColumnMapping,
    strategy: AveragingStrategy,
}

impl ResultAssembler {
    /// Creates an assembler with the given mapping and averaging strategy.
    pub fn new(mapping: ColumnMapping, strategy: AveragingStrategy) -> Self {
        Self { mapping, strategy }
    }

    /// Merges one run into its activation table.
    pub fn assemble_run(
        &self,
        mut table: ActivationTable,
        run: &RunSpec,
        shape: &NormalizedFluxShape,
    ) -> Result<ActivationTable, ActError> {
        let zone_idx = table.column_index(ZONE_COLUMN).map_err(|err| {
            ActError::Table(err.info().clone().with_context("run", &run.label))
        })?;
        let zones = zone_lookup(&table, zone_idx, shape.zones(), &run.label)?;

        let schedule = &run.schedule;
        let unit = run.time_unit;
        table.add_constant_column(
            columns::ACTIVE_T_IRR,
            Cell::Real(unit.to_seconds(schedule.active_burn_time)),
        )?;
        table.add_constant_column(columns::DWELL_T, Cell::Real(unit.to_seconds(schedule.dwell_time)))?;
        table.add_constant_column(
            columns::TOTAL_T_IRR,
            Cell::Real(unit.to_seconds(schedule.total_irradiation_time)),
        )?;
        table.add_constant_column(columns::DUTY_CYCLE, Cell::Real(schedule.duty_cycle))?;
        table.add_constant_column(
            columns::NUM_PULSES,
            Cell::Integer(i64::from(schedule.num_pulses)),
        )?;

        let shapes = (0..shape.zones())
            .map(|zone| {
                let row = shape.row(zone).unwrap_or_default();
                serde_json::to_string(row).map_err(|err| {
                    ActError::Table(
                        ErrorInfo::new("table.shape-encode", "failed to encode spectrum shape")
                            .with_context("zone", zone)
                            .with_hint(err.to_string()),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        table.add_column_with(columns::FLUX_SPECTRUM_SHAPE, |row_idx, _| {
            Ok(Cell::Text(shapes[zones[row_idx]].clone()))
        })?;

        let totals = shape.total_flux();
        table.add_column_with(columns::AVG_FLUX_MAG, |row_idx, _| {
            Ok(Cell::Real(average(self.strategy, totals[zones[row_idx]], schedule)))
        })?;
        table.add_constant_column(columns::RUN_LBL, Cell::Text(run.label.clone()))?;

        self.mapping.apply(&mut table)?;
        debug!(run = %run.label, rows = table.len(), "assembled run table");
        Ok(table)
    }

    /// Merges every run and concatenates the results into one table.
    pub fn assemble(
        &self,
        runs: Vec<(ActivationTable, RunSpec)>,
        shape: &NormalizedFluxShape,
    ) -> Result<ActivationTable, ActError> {
        let mut tables = Vec::with_capacity(runs.len());
        for (table, run) in runs {
            tables.push(self.assemble_run(table, &run, shape)?);
        }
        Ok(ActivationTable::concat(tables))
    }
}

/// Assigns every row the flux zone of its identifier. Distinct numeric
/// identifiers, in ascending order, map onto flux rows, so `1` and `1.0`
/// name the same zone.
fn zone_lookup(
    table: &ActivationTable,
    zone_idx: usize,
    flux_zones: usize,
    run: &str,
) -> Result<Vec<usize>, ActError> {
    let mut ids = Vec::with_capacity(table.len());
    for (row_idx, row) in table.rows().iter().enumerate() {
        let cell = &row[zone_idx];
        match cell.as_f64().filter(|value| value.is_finite()) {
            // Adding zero folds -0.0 into 0.0.
            Some(value) => ids.push(value + 0.0),
            None => {
                return Err(ActError::Table(
                    ErrorInfo::new("table.zone-id", "zone identifier must be numeric")
                        .with_context("run", run)
                        .with_context("row", row_idx)
                        .with_context("value", cell),
                ))
            }
        }
    }
    let mut distinct = ids.clone();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() != flux_zones {
        return Err(ActError::MisalignedFluxData(
            ErrorInfo::new(
                "table.zone-count",
                "activation table zones do not match flux zones",
            )
            .with_context("run", run)
            .with_context("table_zones", distinct.len())
            .with_context("flux_zones", flux_zones),
        ));
    }
    Ok(ids
        .into_iter()
        .map(|id| distinct.partition_point(|known| *known < id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actdb_core::GroupStructure;
    use actdb_flux::{normalize, FluxMatrix, ShapeConvention};
    use actdb_sched::solve;

    fn shape() -> NormalizedFluxShape {
        let groups = GroupStructure::new("toy", vec![0.0, 1.0, 2.0]).unwrap();
        let matrix = FluxMatrix::from_rows(vec![vec![1.0, 3.0], vec![2.0, 2.0]]).unwrap();
        normalize(&matrix, &groups, ShapeConvention::Fractional).unwrap()
    }

    fn raw_table(zones: &[i64]) -> ActivationTable {
        raw_table_with(zones.iter().map(|&zone| Cell::Integer(zone)).collect())
    }

    fn raw_table_with(zones: Vec<Cell>) -> ActivationTable {
        let mut table = ActivationTable::new(
            ["time", "time_unit", "nuclide", "value", "variable", "var_unit", "block", "block_num"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        for zone in zones {
            table
                .push_row(vec![
                    Cell::Integer(1),
                    Cell::from("y"),
                    Cell::from("h3"),
                    Cell::Real(1e20),
                    Cell::from("Number Density"),
                    Cell::from("atoms/cm3"),
                    Cell::from("Interval"),
                    zone,
                ])
                .unwrap();
        }
        table
    }

    fn run(duty: f64, pulses: u32) -> RunSpec {
        RunSpec {
            label: format!("runs_{}", (duty * 100.0) as u32),
            schedule: solve(4.0, duty, pulses).unwrap(),
            time_unit: TimeUnit::Year,
        }
    }

    #[test]
    fn zones_follow_sorted_block_numbers() {
        let assembler = ResultAssembler::new(ColumnMapping::default(), AveragingStrategy::OnOff);
        let table = assembler
            .assemble_run(raw_table(&[7, 3, 7]), &run(0.5, 4), &shape())
            .unwrap();
        let avg = table.column(columns::AVG_FLUX_MAG).unwrap();
        // Block 3 is zone 0 (total 4), block 7 is zone 1 (total 4 as well).
        assert_eq!(avg[0], &Cell::Real(4.0 * 4.0 / 7.0));
        let shapes = table.column(columns::FLUX_SPECTRUM_SHAPE).unwrap();
        assert_eq!(shapes[1], &Cell::from("[0.25,0.75]"));
        assert_eq!(shapes[0], &Cell::from("[0.5,0.5]"));
        assert!(table.column_index("block_num").is_err());
        assert_eq!(
            table.column(columns::ACTIVE_T_IRR).unwrap()[0],
            &Cell::Real(126_144_000.0)
        );
    }

    #[test]
    fn integer_and_real_block_numbers_share_a_zone() {
        let groups = GroupStructure::new("toy", vec![0.0, 1.0, 2.0]).unwrap();
        let matrix = FluxMatrix::from_rows(vec![vec![1.0, 1.0], vec![5.0, 5.0]]).unwrap();
        let shape = normalize(&matrix, &groups, ShapeConvention::Fractional).unwrap();
        let assembler = ResultAssembler::new(ColumnMapping::default(), AveragingStrategy::OnOff);
        let table = assembler
            .assemble_run(
                raw_table_with(vec![Cell::Integer(1), Cell::Real(1.0), Cell::Integer(2)]),
                &run(1.0, 2),
                &shape,
            )
            .unwrap();
        let avg = table.column(columns::AVG_FLUX_MAG).unwrap();
        assert_eq!(avg, vec![&Cell::Real(2.0), &Cell::Real(2.0), &Cell::Real(10.0)]);
    }

    #[test]
    fn mixed_spellings_of_one_block_count_once() {
        let assembler = ResultAssembler::new(ColumnMapping::default(), AveragingStrategy::OnOff);
        let err = assembler
            .assemble_run(
                raw_table_with(vec![Cell::Integer(1), Cell::Real(1.0)]),
                &run(1.0, 2),
                &shape(),
            )
            .unwrap_err();
        assert_eq!(err.context("table_zones"), Some("1"));
    }

    #[test]
    fn zone_count_mismatch_is_reported() {
        let assembler = ResultAssembler::new(ColumnMapping::default(), AveragingStrategy::OnOff);
        let err = assembler
            .assemble_run(raw_table(&[1, 2, 3]), &run(1.0, 2), &shape())
            .unwrap_err();
        assert!(matches!(err, ActError::MisalignedFluxData(_)));
        assert_eq!(err.context("table_zones"), Some("3"));
        assert_eq!(err.context("flux_zones"), Some("2"));
    }

    #[test]
    fn runs_are_concatenated() {
        let assembler =
            ResultAssembler::new(ColumnMapping::default(), AveragingStrategy::WholePeriod);
        let merged = assembler
            .assemble(
                vec![
                    (raw_table(&[1, 2]), run(1.0, 2)),
                    (raw_table(&[1, 2]), run(0.5, 2)),
                ],
                &shape(),
            )
            .unwrap();
        assert_eq!(merged.len(), 4);
        let labels = merged.column(columns::RUN_LBL).unwrap();
        assert_eq!(labels[0], &Cell::from("runs_100"));
        assert_eq!(labels[3], &Cell::from("runs_50"));
        let avg = merged.column(columns::AVG_FLUX_MAG).unwrap();
        assert_eq!(avg[0], &Cell::Real(1.0));
        assert_eq!(avg[2], &Cell::Real(4.0 / 6.0));
    }
}
