use actdb_core::errors::{ActError, ErrorInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::solver::{solve_unchecked, validate, ScheduleResult};

/// Tolerance used when matching a requested duty cycle against the grid axis.
const DUTY_MATCH_TOLERANCE: f64 = 1e-12;

/// Active burn time shared by every pulse count, or given per pulse count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BurnTime {
    /// One burn time broadcast across the grid.
    Scalar(f64),
    /// One burn time per entry of the pulse-count axis.
    PerPulseCount(Vec<f64>),
}

impl BurnTime {
    fn resolve(&self, num_pulses: &[u32]) -> Result<Vec<f64>, ActError> {
        match self {
            BurnTime::Scalar(value) => Ok(vec![*value; num_pulses.len()]),
            BurnTime::PerPulseCount(values) if values.len() == num_pulses.len() => {
                Ok(values.clone())
            }
            BurnTime::PerPulseCount(values) => Err(ActError::InvalidScheduleParameter(
                ErrorInfo::new(
                    "schedule.burn-time-shape",
                    "per-pulse-count burn times must match the pulse list length",
                )
                .with_context("burn_times", values.len())
                .with_context("pulse_counts", num_pulses.len()),
            )),
        }
    }
}

impl From<f64> for BurnTime {
    fn from(value: f64) -> Self {
        BurnTime::Scalar(value)
    }
}

/// Serialized form of a [`ScheduleGrid`], checked on the way in.
#[derive(Debug, Deserialize)]
struct ScheduleGridFile {
    duty_cycles: Vec<f64>,
    num_pulses: Vec<u32>,
    points: Vec<ScheduleResult>,
}

impl TryFrom<ScheduleGridFile> for ScheduleGrid {
    type Error = ActError;

    fn try_from(raw: ScheduleGridFile) -> Result<Self, Self::Error> {
        let expected = raw.duty_cycles.len() * raw.num_pulses.len();
        if expected == 0 || raw.points.len() != expected {
            return Err(ActError::InvalidScheduleParameter(
                ErrorInfo::new("schedule.grid-shape", "grid points do not fill both axes")
                    .with_context("duty_cycles", raw.duty_cycles.len())
                    .with_context("num_pulses", raw.num_pulses.len())
                    .with_context("points", raw.points.len()),
            ));
        }
        for (idx, point) in raw.points.iter().enumerate() {
            let duty = raw.duty_cycles[idx % raw.duty_cycles.len()];
            let pulses = raw.num_pulses[idx / raw.duty_cycles.len()];
            if point.num_pulses != pulses || (point.duty_cycle - duty).abs() > DUTY_MATCH_TOLERANCE {
                return Err(ActError::InvalidScheduleParameter(
                    ErrorInfo::new("schedule.grid-point", "grid point does not match its axes")
                        .with_context("index", idx)
                        .with_context("duty_cycle", duty)
                        .with_context("num_pulses", pulses),
                ));
            }
            validate(point.active_burn_time, point.duty_cycle, point.num_pulses)?;
        }
        Ok(Self {
            duty_cycles: raw.duty_cycles,
            num_pulses: raw.num_pulses,
            points: raw.points,
        })
    }
}

/// Solved schedule points laid out with pulse counts as rows and duty
/// cycles as columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleGridFile")]
pub struct ScheduleGrid {
    duty_cycles: Vec<f64>,
    num_pulses: Vec<u32>,
    points: Vec<ScheduleResult>,
}

impl ScheduleGrid {
    /// Duty cycle axis (columns).
    pub fn duty_cycles(&self) -> &[f64] {
        &self.duty_cycles
    }

    /// Pulse count axis (rows).
    pub fn num_pulses(&self) -> &[u32] {
        &self.num_pulses
    }

    /// All points in row-major order.
    pub fn points(&self) -> &[ScheduleResult] {
        &self.points
    }

    /// Point at row `pulse_idx` and column `duty_idx`.
    pub fn get(&self, pulse_idx: usize, duty_idx: usize) -> Option<&ScheduleResult> {
        if pulse_idx >= self.num_pulses.len() || duty_idx >= self.duty_cycles.len() {
            return None;
        }
        self.points.get(pulse_idx * self.duty_cycles.len() + duty_idx)
    }

    /// Looks up the point solved for `(duty_cycle, num_pulses)`.
    pub fn find(&self, duty_cycle: f64, num_pulses: u32) -> Result<&ScheduleResult, ActError> {
        let pulse_idx = self.num_pulses.iter().position(|n| *n == num_pulses);
        let duty_idx = self
            .duty_cycles
            .iter()
            .position(|d| (d - duty_cycle).abs() <= DUTY_MATCH_TOLERANCE);
        pulse_idx
            .zip(duty_idx)
            .and_then(|(row, col)| self.get(row, col))
            .ok_or_else(|| {
                ActError::InvalidScheduleParameter(
                    ErrorInfo::new("schedule.unknown-point", "schedule point was not solved")
                        .with_context("duty_cycle", duty_cycle)
                        .with_context("num_pulses", num_pulses),
                )
            })
    }

    /// Pulse length for every row.
    pub fn pulse_lengths(&self) -> Vec<f64> {
        self.rows()
            .filter_map(|row| row.first().map(|point| point.pulse_length))
            .collect()
    }

    /// Dwell times as a `num_pulses x duty_cycles` matrix.
    pub fn dwell_times(&self) -> Vec<Vec<f64>> {
        self.rows()
            .map(|row| row.iter().map(|point| point.dwell_time).collect())
            .collect()
    }

    /// Total irradiation times as a `num_pulses x duty_cycles` matrix.
    pub fn total_irradiation_times(&self) -> Vec<Vec<f64>> {
        self.rows()
            .map(|row| row.iter().map(|point| point.total_irradiation_time).collect())
            .collect()
    }

    fn rows(&self) -> impl Iterator<Item = &[ScheduleResult]> {
        self.points.chunks(self.duty_cycles.len().max(1))
    }
}

/// Solves every combination of `duty_cycles` and `num_pulses`.
///
/// All parameters are validated before any point is solved. The result has
/// one row per pulse count and one column per duty cycle.
pub fn solve_grid(
    burn_time: &BurnTime,
    duty_cycles: &[f64],
    num_pulses: &[u32],
) -> Result<ScheduleGrid, ActError> {
    if duty_cycles.is_empty() || num_pulses.is_empty() {
        return Err(ActError::InvalidScheduleParameter(
            ErrorInfo::new("schedule.empty-axis", "duty cycle and pulse lists must be non-empty")
                .with_context("duty_cycles", duty_cycles.len())
                .with_context("num_pulses", num_pulses.len()),
        ));
    }
    let burn_times = burn_time.resolve(num_pulses)?;
    for (&pulses, &burn) in num_pulses.iter().zip(&burn_times) {
        for &duty in duty_cycles {
            validate(burn, duty, pulses)?;
        }
    }

    let mut points = Vec::with_capacity(num_pulses.len() * duty_cycles.len());
    for (&pulses, &burn) in num_pulses.iter().zip(&burn_times) {
        for &duty in duty_cycles {
            points.push(solve_unchecked(burn, duty, pulses));
        }
    }
    debug!(
        rows = num_pulses.len(),
        cols = duty_cycles.len(),
        "solved pulse schedule grid"
    );
    Ok(ScheduleGrid {
        duty_cycles: duty_cycles.to_vec(),
        num_pulses: num_pulses.to_vec(),
        points,
    })
}
