/*
 * Physics Module
 *
 * This module owns the simulation context: the boids, their physics bodies
 * (positions), the obstacles, the waypoint cycle and the flock grouping.
 *
 * One step runs the whole population through a fixed tick:
 * 1. Rebuild the spatial grid from the committed positions
 * 2. Read phase: every boid plans its next velocity from the previous
 *    tick's snapshot (optionally in parallel)
 * 3. Write phase: commit velocities and integrate positions
 * 4. Advance the waypoint cycle once any boid reached it
 * 5. Regroup flocks when the group interval has elapsed
 *
 * Optimized for performance by:
 * - Using spatial partitioning for efficient neighbor lookups
 * - Reusing neighbor buffers (one per worker thread in parallel mode)
 * - Adaptive cell sizing based on sensing radii
 */

use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::boid::{Boid, BoidUpdate, PopulationSnapshot, TickContext, TickId};
use crate::error::{FlockError, FlockResult};
use crate::grouping::{FlockGrouping, Group};
use crate::obstacle::Obstacle;
use crate::params::SimulationParams;
use crate::settings::{BoidSettings, Preset};
use crate::spatial_grid::{NeighborBuffer, SpatialGrid};
use crate::waypoints::{WaypointCycle, WaypointSource};

// Upper bound on fixed steps run for one frame before dropping the backlog
pub const MAX_STEPS_PER_ADVANCE: usize = 8;

// Grid is rebuilt from scratch when the largest sensing radius drifts this much
const CELL_SIZE_TOLERANCE: f32 = 1e-3;

// What happened during one fixed step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    pub tick: TickId,
    pub updated: usize,
    pub skipped: usize,
    pub saturated: usize,
    pub coincident: usize,
    pub waypoint_advanced: bool,
    // Some(changed) when a grouping pass ran during this step
    pub groups_changed: Option<bool>,
}

pub struct Simulation {
    boids: Vec<Boid>,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    obstacles: Vec<Obstacle>,
    waypoints: WaypointCycle,
    grid: SpatialGrid,
    grouping: FlockGrouping,
    buffer: NeighborBuffer,
    tick: TickId,
    fixed_dt: f32,
    accumulator: f32,
    group_interval: f32,
    group_timer: f32,
    enable_parallel: bool,
    buffer_capacity: usize,
    last_report: Option<StepReport>,
}

impl Simulation {
    pub fn new(params: &SimulationParams) -> FlockResult<Self> {
        params.validate()?;
        let settings = params.boid_settings()?;

        let mut simulation = Self {
            boids: Vec::with_capacity(params.num_boids),
            positions: Vec::with_capacity(params.num_boids),
            velocities: Vec::with_capacity(params.num_boids),
            obstacles: params.obstacles.clone(),
            waypoints: WaypointCycle::from_positions(params.waypoints.iter().copied(), params.waypoint_trigger_radius),
            grid: SpatialGrid::new(settings.sensing_radius()),
            grouping: FlockGrouping::new(params.change_policy),
            buffer: NeighborBuffer::with_capacity(params.neighbor_buffer_capacity),
            tick: TickId::default(),
            fixed_dt: params.fixed_dt(),
            accumulator: 0.0,
            group_interval: params.group_interval,
            group_timer: 0.0,
            enable_parallel: params.enable_parallel,
            buffer_capacity: params.neighbor_buffer_capacity,
            last_report: None,
        };
        simulation.grid.set_obstacles(&simulation.obstacles);

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        for _ in 0..params.num_boids {
            let position = params.spawn_center + random_in_unit_sphere(&mut rng) * params.spawn_radius;
            simulation.spawn_boid_with_settings(position, settings.clone());
        }

        info!(
            boids = simulation.boids.len(),
            preset = ?params.preset,
            obstacles = simulation.obstacles.len(),
            waypoints = simulation.waypoints.len(),
            "simulation created"
        );
        Ok(simulation)
    }

    // Returns the index of the new boid; indices are never reused
    pub fn spawn_boid(&mut self, position: Vec3, preset: Preset) -> usize {
        self.spawn_boid_with_settings(position, BoidSettings::from_preset(preset))
    }

    pub fn spawn_boid_with_settings(&mut self, position: Vec3, settings: BoidSettings) -> usize {
        let index = self.boids.len();
        let mut boid = Boid::with_preset(index, settings.preset());
        *boid.settings_mut() = settings;
        self.boids.push(boid);
        self.positions.push(position);
        index
    }

    // Global preset toggle; each boid's settings are overwritten as a whole
    pub fn set_preset_all(&mut self, preset: Preset) {
        for boid in &mut self.boids {
            boid.set_preset(preset);
        }
        info!(?preset, boids = self.boids.len(), "preset applied to all boids");
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
        self.grid.set_obstacles(&self.obstacles);
    }

    pub fn step(&mut self, dt: f32) -> FlockResult<StepReport> {
        let tick = self.tick.next();
        self.step_tick(tick, dt)
    }

    // Runs one fixed tick under an explicit generation number. Boids already
    // current for `tick` are left untouched, so a repeated call is a no-op.
    pub fn step_tick(&mut self, tick: TickId, dt: f32) -> FlockResult<StepReport> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(FlockError::InvalidSetting {
                field: "dt",
                reason: format!("{dt} must be finite and > 0"),
            });
        }
        self.tick = self.tick.max(tick);

        self.refresh_grid();
        self.velocities.clear();
        self.velocities.extend(self.boids.iter().map(Boid::velocity));

        let ctx = TickContext {
            dt,
            snapshot: PopulationSnapshot {
                positions: &self.positions,
                velocities: &self.velocities,
            },
            query: &self.grid,
            waypoint: self.waypoints.current(),
        };

        // Read phase: nothing is written until every boid has planned
        let updates: Vec<Option<BoidUpdate>> = if self.enable_parallel {
            let capacity = self.buffer_capacity;
            self.boids
                .par_iter()
                .zip(self.positions.par_iter())
                .map_init(
                    || NeighborBuffer::with_capacity(capacity),
                    |buffer, (boid, &position)| {
                        if boid.is_current(tick) {
                            Ok(None)
                        } else {
                            boid.plan(position, &ctx, buffer).map(Some)
                        }
                    },
                )
                .collect::<FlockResult<Vec<_>>>()?
        } else {
            let mut updates = Vec::with_capacity(self.boids.len());
            for (boid, &position) in self.boids.iter().zip(&self.positions) {
                if boid.is_current(tick) {
                    updates.push(None);
                } else {
                    updates.push(Some(boid.plan(position, &ctx, &mut self.buffer)?));
                }
            }
            updates
        };

        // Write phase
        let mut report = StepReport { tick, ..Default::default() };
        for ((boid, position), update) in self.boids.iter_mut().zip(self.positions.iter_mut()).zip(updates) {
            let Some(update) = update else {
                report.skipped += 1;
                continue;
            };
            report.saturated += usize::from(update.saturated);
            report.coincident += update.coincident_neighbors;
            boid.commit(tick, update);
            *position += boid.velocity() * dt;
            report.updated += 1;
        }

        if report.saturated > 0 {
            warn!(
                tick = tick.0,
                boids = report.saturated,
                capacity = self.buffer_capacity,
                "neighbor buffer saturated, extra neighbors were ignored"
            );
        }
        if report.coincident > 0 {
            debug!(tick = tick.0, pairs = report.coincident, "coincident neighbors skipped by separation");
        }

        if report.updated == 0 {
            return Ok(report);
        }

        if self.positions.iter().any(|&p| self.waypoints.is_reached_by(p)) {
            self.waypoints.advance();
            report.waypoint_advanced = true;
        }

        if self.group_interval > 0.0 {
            self.group_timer += dt;
            if self.group_timer >= self.group_interval {
                self.group_timer %= self.group_interval;
                report.groups_changed = Some(self.grouping.update(&self.boids)?);
            }
        }

        debug!(
            tick = tick.0,
            updated = report.updated,
            skipped = report.skipped,
            groups = self.grouping.groups().len(),
            "simulation step"
        );
        Ok(report)
    }

    // Fixed-timestep accumulator; returns how many steps ran
    pub fn advance(&mut self, frame_time: Duration) -> FlockResult<usize> {
        self.accumulator += frame_time.as_secs_f32();
        let mut steps = 0;

        while self.accumulator >= self.fixed_dt {
            if steps == MAX_STEPS_PER_ADVANCE {
                warn!(
                    backlog = self.accumulator,
                    "simulation is falling behind, dropping accumulated time"
                );
                self.accumulator = 0.0;
                break;
            }
            let report = self.step(self.fixed_dt)?;
            self.last_report = Some(report);
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }

        Ok(steps)
    }

    // Grouping of the current neighbor lists, without publishing it
    pub fn compute_groups(&mut self) -> FlockResult<Vec<Group>> {
        self.grouping.compute(&self.boids)
    }

    // Recompute and publish now; returns whether the published grouping changed
    pub fn regroup(&mut self) -> FlockResult<bool> {
        self.group_timer = 0.0;
        self.grouping.update(&self.boids)
    }

    pub fn groups(&self) -> &[Group] {
        self.grouping.groups()
    }

    // Largest sensing radius in the population sets the cell size
    fn refresh_grid(&mut self) {
        let max_radius = self
            .boids
            .iter()
            .map(|b| b.settings().sensing_radius())
            .fold(0.0_f32, f32::max);

        if max_radius > 0.0 && (max_radius - self.grid.cell_size).abs() > CELL_SIZE_TOLERANCE {
            debug!(from = self.grid.cell_size, to = max_radius, "resizing spatial grid cells");
            self.grid = SpatialGrid::new(max_radius);
            self.grid.set_obstacles(&self.obstacles);
        }
        self.grid.rebuild(&self.positions);
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn boid(&self, index: usize) -> FlockResult<&Boid> {
        let population = self.boids.len();
        self.boids.get(index).ok_or(FlockError::UnknownAgent { index, population })
    }

    pub fn boid_mut(&mut self, index: usize) -> FlockResult<&mut Boid> {
        let population = self.boids.len();
        self.boids.get_mut(index).ok_or(FlockError::UnknownAgent { index, population })
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn set_position(&mut self, index: usize, position: Vec3) -> FlockResult<()> {
        let population = self.positions.len();
        let slot = self.positions.get_mut(index).ok_or(FlockError::UnknownAgent { index, population })?;
        *slot = position;
        Ok(())
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn waypoints(&self) -> &WaypointCycle {
        &self.waypoints
    }

    pub fn waypoints_mut(&mut self) -> &mut WaypointCycle {
        &mut self.waypoints
    }

    // Report of the last step run by `advance`
    pub fn last_report(&self) -> Option<StepReport> {
        self.last_report
    }

    pub fn tick(&self) -> TickId {
        self.tick
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    pub fn group_interval(&self) -> f32 {
        self.group_interval
    }

    pub fn set_group_interval(&mut self, seconds: f32) {
        self.group_interval = seconds.max(0.0);
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.enable_parallel = enabled;
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }
}

fn random_in_unit_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return candidate;
        }
    }
}
