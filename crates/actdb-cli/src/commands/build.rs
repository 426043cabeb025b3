use std::error::Error;
use std::path::PathBuf;

use actdb_cli::{persist, run as run_pipeline, RunConfig};
use actdb_table::Sink;
use clap::Args;
use tracing::info;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// YAML run configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Override the configured output path.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &BuildArgs) -> Result<(), Box<dyn Error>> {
    let mut config = RunConfig::load(&args.config)?;
    if let Some(out) = &args.out {
        config.output.path = out.clone();
    }
    let output = run_pipeline(&config)?;
    let mut sink = Sink::from_path(&config.output.path)?;
    persist(&output, &config, &mut sink)?;
    info!(
        path = %config.output.path.display(),
        table = %config.output.table,
        rows = output.table.len(),
        input_hash = %output.provenance.input_hash,
        "activation table written"
    );
    println!(
        "wrote {} rows to {} ({})",
        output.table.len(),
        config.output.path.display(),
        config.output.table
    );
    Ok(())
}
