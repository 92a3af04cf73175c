/*
 * Flocking - Headless Runner
 *
 * Runs a flock for a fixed number of ticks without a window and reports the
 * flocks it ends up in. Boids follow five rules:
 * 1. Separation: keep an optimal distance from neighbors
 * 2. Cohesion: move toward the center of visible neighbors
 * 3. Alignment: match the neighbors' average velocity
 * 4. Collision avoidance: stay clear of obstacles
 * 5. Attraction: drift toward the current waypoint
 *
 * Parameters come from an optional TOML file; command line flags override it.
 */

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use flocking::{FlockResult, Preset, Simulation, SimulationParams};

#[derive(Debug, Parser)]
#[command(name = "flocking", version, about = "Run a boid flock headless and report its flocks")]
struct Cli {
    /// TOML file with simulation parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of fixed ticks to run
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// Override the number of boids
    #[arg(long)]
    boids: Option<usize>,

    /// Override the preset
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Seed for spawn positions
    #[arg(long)]
    seed: Option<u64>,

    /// Plan boids on one thread
    #[arg(long)]
    sequential: bool,

    /// Switch every boid to this preset halfway through
    #[arg(long, value_enum)]
    switch_to: Option<Preset>,
}

fn main() -> ExitCode {
    flocking::init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn load_params(cli: &Cli) -> FlockResult<SimulationParams> {
    let mut params = match &cli.config {
        Some(path) => SimulationParams::load(path)?,
        None => SimulationParams::default(),
    };

    if let Some(boids) = cli.boids {
        params.num_boids = boids;
    }
    if let Some(preset) = cli.preset {
        params.preset = preset;
    }
    if cli.seed.is_some() {
        params.seed = cli.seed;
    }
    if cli.sequential {
        params.enable_parallel = false;
    }

    params.validate()?;
    Ok(params)
}

fn run(cli: &Cli) -> FlockResult<()> {
    let params = load_params(cli)?;
    let mut simulation = Simulation::new(&params)?;
    let dt = params.fixed_dt();
    let switch_at = cli.ticks / 2;

    let mut saturated = 0;
    let mut regroupings = 0;
    for tick in 0..cli.ticks {
        if tick == switch_at {
            if let Some(preset) = cli.switch_to {
                simulation.set_preset_all(preset);
            }
        }

        let report = simulation.step(dt)?;
        saturated += report.saturated;
        if report.groups_changed == Some(true) {
            regroupings += 1;
            info!(tick = report.tick.0, flocks = simulation.groups().len(), "flocks changed");
        }
    }

    simulation.regroup()?;
    let groups = simulation.groups();
    let mut sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));

    info!(
        ticks = cli.ticks,
        boids = simulation.len(),
        flocks = groups.len(),
        regroupings,
        saturated,
        "run finished"
    );
    println!("flocks: {}", groups.len());
    println!("sizes: {sizes:?}");
    Ok(())
}
