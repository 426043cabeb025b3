use std::error::Error;
use std::path::PathBuf;

use actdb_cli::{load_groups, RunConfig};
use actdb_flux::{normalize, parse_flux_file, ShapeConvention};
use clap::{Args, ValueEnum};
use serde::Serialize;

use super::print_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConventionArg {
    Fractional,
    PerUnitEnergy,
}

impl From<ConventionArg> for ShapeConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::Fractional => ShapeConvention::Fractional,
            ConventionArg::PerUnitEnergy => ShapeConvention::PerUnitEnergy,
        }
    }
}

#[derive(Args, Debug)]
pub struct FluxArgs {
    /// YAML run configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Override the configured shape convention.
    #[arg(long, value_enum)]
    pub convention: Option<ConventionArg>,
}

#[derive(Debug, Serialize)]
struct FluxReport {
    group_structure: String,
    groups: usize,
    zones: usize,
    convention: ShapeConvention,
    total_flux: Vec<f64>,
    shapes: Vec<Vec<f64>>,
}

pub fn run(args: &FluxArgs) -> Result<(), Box<dyn Error>> {
    let config = RunConfig::load(&args.config)?;
    let groups = load_groups(&config)?;
    let flux = parse_flux_file(&config.flux_file, &groups)?;
    let convention = args
        .convention
        .map(ShapeConvention::from)
        .unwrap_or(config.shape_convention);
    let shape = normalize(&flux, &groups, convention)?;
    let shapes = (0..shape.zones())
        .filter_map(|zone| shape.row(zone).map(<[f64]>::to_vec))
        .collect();
    print_json(&FluxReport {
        group_structure: groups.name().to_string(),
        groups: groups.group_count(),
        zones: flux.zones(),
        convention,
        total_flux: shape.total_flux().to_vec(),
        shapes,
    })
}
