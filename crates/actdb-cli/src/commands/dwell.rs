use std::error::Error;

use actdb_core::TimeUnit;
use actdb_sched::{solve_grid, BurnTime};
use clap::{Args, ValueEnum};

use super::print_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct DwellArgs {
    /// Active burn time shared by every schedule point.
    #[arg(long, default_value_t = 4.0)]
    pub burn_time: f64,
    /// Comma separated duty cycles in (0, 1].
    #[arg(long, value_delimiter = ',', default_values_t = [1.0, 0.9, 0.5, 0.25])]
    pub duty_cycles: Vec<f64>,
    /// Comma separated pulse counts.
    #[arg(long, value_delimiter = ',', default_values_t = [2, 4, 8, 32, 64])]
    pub pulses: Vec<u32>,
    /// Unit of the burn time (s, m, h, d, w, y, c).
    #[arg(long, default_value = "y")]
    pub unit: TimeUnit,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(args: &DwellArgs) -> Result<(), Box<dyn Error>> {
    let grid = solve_grid(&BurnTime::Scalar(args.burn_time), &args.duty_cycles, &args.pulses)?;
    match args.format {
        OutputFormat::Json => print_json(&grid),
        OutputFormat::Text => {
            for (duty_idx, duty_cycle) in grid.duty_cycles().iter().enumerate() {
                for (pulse_idx, num) in grid.num_pulses().iter().enumerate() {
                    let Some(point) = grid.get(pulse_idx, duty_idx) else {
                        continue;
                    };
                    println!(
                        "duty_cycle={duty_cycle}, num={num}, dwell_time = {} {unit}, t_irr = {} {unit}",
                        point.dwell_time,
                        point.total_irradiation_time,
                        unit = args.unit,
                    );
                }
            }
            Ok(())
        }
    }
}
