use std::error::Error;
use std::path::PathBuf;

use actdb_cli::RunConfig;
use actdb_sched::solve_grid;
use clap::Args;
use serde::Serialize;

use super::print_json;

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// YAML run configuration.
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Debug, Serialize)]
struct ScheduleReport {
    time_unit: String,
    duty_cycles: Vec<f64>,
    num_pulses: Vec<u32>,
    pulse_length: Vec<f64>,
    dwell_time: Vec<Vec<f64>>,
    total_irradiation_time: Vec<Vec<f64>>,
}

pub fn run(args: &ScheduleArgs) -> Result<(), Box<dyn Error>> {
    let config = RunConfig::load(&args.config)?;
    let grid = solve_grid(
        &config.active_burn_time,
        &config.duty_cycles,
        &config.num_pulses,
    )?;
    print_json(&ScheduleReport {
        time_unit: config.time_unit.to_string(),
        duty_cycles: grid.duty_cycles().to_vec(),
        num_pulses: grid.num_pulses().to_vec(),
        pulse_length: grid.pulse_lengths(),
        dwell_time: grid.dwell_times(),
        total_irradiation_time: grid.total_irradiation_times(),
    })
}
