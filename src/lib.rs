/*
 * Boid Flocking - Module Definitions
 *
 * This file defines the module structure of the flocking crate.
 * The core (settings, forces, steering, boid, grouping, physics) has no
 * rendering dependencies; the nannou viewer lives behind the `viewer`
 * feature.
 */

// Re-export key components for easier access
pub use boid::{Boid, TickId};
pub use error::{FlockError, FlockResult};
pub use grouping::{ChangePolicy, FlockGrouping, Group};
pub use obstacle::Obstacle;
pub use params::SimulationParams;
pub use physics::{Simulation, StepReport};
pub use settings::{BoidSettings, LayerMask, Preset, SettingsOverrides};
pub use spatial_grid::{Neighbor, NeighborBuffer, SpatialGrid, SpatialQuery};
pub use waypoints::{WaypointCycle, WaypointSource};

// Define modules
pub mod boid;
pub mod error;
pub mod forces;
pub mod grouping;
pub mod obstacle;
pub mod params;
pub mod physics;
pub mod settings;
pub mod spatial_grid;
pub mod steering;
pub mod waypoints;

#[cfg(feature = "viewer")]
pub mod app;
#[cfg(feature = "viewer")]
pub mod camera;
#[cfg(feature = "viewer")]
pub mod debug;
#[cfg(feature = "viewer")]
pub mod input;
#[cfg(feature = "viewer")]
pub mod renderer;
#[cfg(feature = "viewer")]
pub mod ui;

// Log filter used when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

// Install the fmt subscriber; RUST_LOG overrides the default filter
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // A second call (tests, embedding hosts) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
