//! Pulse schedule solver for duty-cycled irradiation regimes.
//!
//! A schedule point is one `(duty_cycle, num_pulses)` pair. For an active
//! burn time `T` split into `n` pulses the solver returns the pulse length
//! `T / n`, the dwell time separating consecutive pulses and the total
//! elapsed irradiation time including the `n - 1` dwell gaps.

#![deny(missing_docs)]

mod grid;
mod solver;

pub use grid::{solve_grid, BurnTime, ScheduleGrid};
pub use solver::{solve, ScheduleResult};
