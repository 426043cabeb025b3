use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    build::{self, BuildArgs},
    dwell::{self, DwellArgs},
    flux::{self, FluxArgs},
    schedule::{self, ScheduleArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "actdb",
    version,
    about = "Pulsed-irradiation post-processing for activation databases"
)]
struct Cli {
    /// Log debug output.
    #[arg(long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log warnings and errors.
    #[arg(long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print dwell times for every duty cycle and pulse count.
    Dwell(DwellArgs),
    /// Solve the schedule grid of a run configuration.
    Schedule(ScheduleArgs),
    /// Parse and normalize the flux of a run configuration.
    Flux(FluxArgs),
    /// Run the full pipeline and write the result table.
    Build(BuildArgs),
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match cli.command {
        Command::Dwell(args) => dwell::run(&args),
        Command::Schedule(args) => schedule::run(&args),
        Command::Flux(args) => flux::run(&args),
        Command::Build(args) => build::run(&args),
    }
}
