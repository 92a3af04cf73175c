/*
 * Flocking - Viewer
 *
 * Opens a window showing the flock from above with a control panel for the
 * preset, the group interval and parallel planning.
 */

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use flocking::{FlockResult, Preset, SimulationParams};

#[derive(Debug, Parser)]
#[command(name = "flocking-viewer", version, about = "Watch a boid flock from above")]
struct Cli {
    /// TOML file with simulation parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the starting preset
    #[arg(long, value_enum)]
    preset: Option<Preset>,
}

fn main() -> ExitCode {
    flocking::init_logging();
    let cli = Cli::parse();

    match start(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "viewer failed to start");
            ExitCode::FAILURE
        }
    }
}

fn start(cli: &Cli) -> FlockResult<()> {
    let mut params = match &cli.config {
        Some(path) => SimulationParams::load(path)?,
        None => SimulationParams::default(),
    };
    if let Some(preset) = cli.preset {
        params.preset = preset;
    }
    flocking::app::run(params)
}
