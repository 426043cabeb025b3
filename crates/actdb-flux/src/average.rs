use actdb_sched::{ScheduleGrid, ScheduleResult};
use serde::{Deserialize, Serialize};

/// Strategy used to turn a nominal zone flux into a schedule average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AveragingStrategy {
    /// Time-weighted over pulses (flux on) and dwells (flux off).
    #[default]
    OnOff,
    /// Zone total divided by the total irradiation time.
    WholePeriod,
}

/// Time-weighted average of a flux that is `nominal_flux` while pulsing and
/// zero during dwells.
///
/// The model takes a single nominal value. Zones with different totals must
/// be averaged one call at a time. With one pulse (or no dwell) the nominal
/// value is returned unchanged.
pub fn average_on_off(nominal_flux: f64, schedule: &ScheduleResult) -> f64 {
    let off_time = schedule.off_time();
    if off_time == 0.0 {
        return nominal_flux;
    }
    let on_time = schedule.on_time();
    (on_time * nominal_flux + off_time * 0.0) / (on_time + off_time)
}

/// Coarse estimate: `total_flux / total_irradiation_time`.
pub fn average_whole_period(total_flux: f64, schedule: &ScheduleResult) -> f64 {
    total_flux / schedule.total_irradiation_time
}

/// Dispatches to the averaging function selected by `strategy`.
pub fn average(strategy: AveragingStrategy, flux: f64, schedule: &ScheduleResult) -> f64 {
    match strategy {
        AveragingStrategy::OnOff => average_on_off(flux, schedule),
        AveragingStrategy::WholePeriod => average_whole_period(flux, schedule),
    }
}

/// Averages for every zone at every schedule point of a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageFluxGrid {
    strategy: AveragingStrategy,
    zones: usize,
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl AverageFluxGrid {
    /// Strategy the values were computed with.
    pub fn strategy(&self) -> AveragingStrategy {
        self.strategy
    }

    /// Number of zones.
    pub fn zones(&self) -> usize {
        self.zones
    }

    /// Average for `zone` at grid row `pulse_idx`, column `duty_idx`.
    pub fn get(&self, zone: usize, pulse_idx: usize, duty_idx: usize) -> Option<f64> {
        if zone >= self.zones || pulse_idx >= self.rows || duty_idx >= self.cols {
            return None;
        }
        self.values
            .get((zone * self.rows + pulse_idx) * self.cols + duty_idx)
            .copied()
    }

    /// The `num_pulses x duty_cycles` matrix of one zone.
    pub fn zone_matrix(&self, zone: usize) -> Option<Vec<Vec<f64>>> {
        if zone >= self.zones {
            return None;
        }
        let block = self.rows * self.cols;
        let slice = &self.values[zone * block..(zone + 1) * block];
        Some(slice.chunks(self.cols).map(<[f64]>::to_vec).collect())
    }
}

/// Averages every zone total against every point of `grid`.
pub fn average_grid(
    total_flux: &[f64],
    grid: &ScheduleGrid,
    strategy: AveragingStrategy,
) -> AverageFluxGrid {
    let rows = grid.num_pulses().len();
    let cols = grid.duty_cycles().len();
    let mut values = Vec::with_capacity(total_flux.len() * rows * cols);
    for &flux in total_flux {
        for point in grid.points() {
            values.push(average(strategy, flux, point));
        }
    }
    AverageFluxGrid {
        strategy,
        zones: total_flux.len(),
        rows,
        cols,
        values,
    }
}
