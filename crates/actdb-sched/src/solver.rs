use actdb_core::errors::{ActError, ErrorInfo};
use serde::{Deserialize, Serialize};

/// Time parameters of a single schedule point.
///
/// All times share the unit of the active burn time they were solved from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Cumulative time with the source on.
    pub active_burn_time: f64,
    /// Fraction of each pulse period spent on.
    pub duty_cycle: f64,
    /// Number of pulses the burn time is split into.
    pub num_pulses: u32,
    /// Duration of one pulse.
    pub pulse_length: f64,
    /// Idle time between two consecutive pulses.
    pub dwell_time: f64,
    /// Elapsed time from the start of the first pulse to the end of the last.
    pub total_irradiation_time: f64,
}

impl ScheduleResult {
    /// Cumulative on time, `pulse_length * num_pulses`.
    pub fn on_time(&self) -> f64 {
        self.pulse_length * f64::from(self.num_pulses)
    }

    /// Cumulative off time, `dwell_time * (num_pulses - 1)`.
    pub fn off_time(&self) -> f64 {
        self.dwell_time * f64::from(self.num_pulses.saturating_sub(1))
    }
}

pub(crate) fn validate(
    active_burn_time: f64,
    duty_cycle: f64,
    num_pulses: u32,
) -> Result<(), ActError> {
    if !(active_burn_time.is_finite() && active_burn_time > 0.0) {
        return Err(ActError::InvalidScheduleParameter(
            ErrorInfo::new("schedule.burn-time", "active burn time must be positive")
                .with_context("active_burn_time", active_burn_time),
        ));
    }
    if !(duty_cycle > 0.0 && duty_cycle <= 1.0) {
        return Err(ActError::InvalidScheduleParameter(
            ErrorInfo::new("schedule.duty-cycle", "duty cycle must lie in (0, 1]")
                .with_context("duty_cycle", duty_cycle)
                .with_context("num_pulses", num_pulses),
        ));
    }
    if num_pulses < 1 {
        return Err(ActError::InvalidScheduleParameter(
            ErrorInfo::new("schedule.num-pulses", "pulse count must be at least one")
                .with_context("duty_cycle", duty_cycle)
                .with_context("num_pulses", num_pulses),
        ));
    }
    Ok(())
}

/// Solves the time parameters of one schedule point.
///
/// The dwell time `d` satisfies `p / (p + d) = duty_cycle` for pulse length
/// `p`, so `d = p * (1 - duty_cycle) / duty_cycle`. A duty cycle of one means
/// continuous operation and yields a dwell time of exactly zero.
pub fn solve(
    active_burn_time: f64,
    duty_cycle: f64,
    num_pulses: u32,
) -> Result<ScheduleResult, ActError> {
    validate(active_burn_time, duty_cycle, num_pulses)?;
    Ok(solve_unchecked(active_burn_time, duty_cycle, num_pulses))
}

pub(crate) fn solve_unchecked(
    active_burn_time: f64,
    duty_cycle: f64,
    num_pulses: u32,
) -> ScheduleResult {
    let pulse_length = active_burn_time / f64::from(num_pulses);
    let dwell_time = if duty_cycle == 1.0 {
        0.0
    } else {
        pulse_length * (1.0 - duty_cycle) / duty_cycle
    };
    let gaps = f64::from(num_pulses - 1);
    ScheduleResult {
        active_burn_time,
        duty_cycle,
        num_pulses,
        pulse_length,
        dwell_time,
        total_irradiation_time: active_burn_time + dwell_time * gaps,
    }
}
