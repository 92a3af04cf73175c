/*
 * Boid Module
 *
 * This module defines the Boid struct and its per-tick behavior.
 * Each tick a boid:
 * 1. Queries its neighborhood within its sensing radius
 * 2. Accumulates separation, cohesion and alignment from other boids and
 *    collision avoidance from obstacles
 * 3. Adds the waypoint attraction and blends the result with its previous
 *    velocity (inertness)
 * 4. Runs the turn-limited steering to get its new velocity and rotation
 *
 * The tick is split into a read phase (`plan`) that only looks at the
 * previous tick's committed state of the whole population, and a write
 * phase (`commit`). The position lives in the physics bodies owned by the
 * simulation, not here.
 */

use glam::{Quat, Vec3};

use crate::error::{FlockError, FlockResult};
use crate::forces::{attraction_force, collision_avoidance_force, separation_force};
use crate::grouping::NeighborList;
use crate::settings::{BoidSettings, Preset};
use crate::spatial_grid::{Neighbor, NeighborBuffer, SpatialQuery};
use crate::steering::{look_rotation, steer};

// Neighbors closer than this are treated as coincident and skipped by separation
const COINCIDENT_DISTANCE_SQ: f32 = 1e-12;

// Generation number of a fixed simulation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TickId(pub u64);

impl TickId {
    pub fn next(self) -> TickId {
        TickId(self.0 + 1)
    }
}

// Committed state of every boid at the end of the previous tick
#[derive(Debug, Clone, Copy)]
pub struct PopulationSnapshot<'a> {
    pub positions: &'a [Vec3],
    pub velocities: &'a [Vec3],
}

impl<'a> PopulationSnapshot<'a> {
    pub fn agent(&self, index: usize) -> FlockResult<(Vec3, Vec3)> {
        match (self.positions.get(index), self.velocities.get(index)) {
            (Some(&position), Some(&velocity)) => Ok((position, velocity)),
            _ => Err(FlockError::UnknownAgent {
                index,
                population: self.positions.len().min(self.velocities.len()),
            }),
        }
    }
}

// Everything a boid reads during its tick besides its own state
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub dt: f32,
    pub snapshot: PopulationSnapshot<'a>,
    pub query: &'a (dyn SpatialQuery + Sync),
    pub waypoint: Option<Vec3>,
}

// Result of the read phase, applied by `Boid::commit`
#[derive(Debug, Clone, PartialEq)]
pub struct BoidUpdate {
    pub velocity: Vec3,
    pub rotation: Quat,
    pub neighbors: Vec<usize>,
    pub coincident_neighbors: usize,
    pub saturated: bool,
}

#[derive(Debug, Clone)]
pub struct Boid {
    index: usize,
    velocity: Vec3,
    rotation: Quat,
    settings: BoidSettings,
    neighbors: Vec<usize>,
    last_tick: Option<TickId>,
}

impl Boid {
    pub fn new(index: usize) -> Self {
        Self::with_preset(index, Preset::default())
    }

    pub fn with_preset(index: usize, preset: Preset) -> Self {
        Self {
            index,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            settings: BoidSettings::from_preset(preset),
            neighbors: Vec::new(),
            last_tick: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn neighbor_indices(&self) -> &[usize] {
        &self.neighbors
    }

    pub fn settings(&self) -> &BoidSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut BoidSettings {
        &mut self.settings
    }

    pub fn preset(&self) -> Preset {
        self.settings.preset()
    }

    pub fn set_preset(&mut self, preset: Preset) {
        self.settings.apply_preset(preset);
    }

    pub fn last_tick(&self) -> Option<TickId> {
        self.last_tick
    }

    // Generations only move forward; a replayed or older one is already done
    pub fn is_current(&self, tick: TickId) -> bool {
        self.last_tick.is_some_and(|last| last >= tick)
    }

    // Read phase: compute the next velocity without mutating anything
    pub fn plan(&self, position: Vec3, ctx: &TickContext<'_>, buffer: &mut NeighborBuffer) -> FlockResult<BoidUpdate> {
        let settings = &self.settings;
        let direction = self.velocity.normalize_or_zero();

        ctx.query
            .query_neighbors(position, settings.sensing_radius(), settings.interaction_mask(), buffer);

        // Geometric center of visible boids
        let mut centroid = Vec3::ZERO;
        let mut collision_avoidance = Vec3::ZERO;
        let mut average_velocity = Vec3::ZERO;
        let mut neighbors = Vec::with_capacity(buffer.len());
        let mut coincident_neighbors = 0;

        for neighbor in buffer.as_slice() {
            match *neighbor {
                Neighbor::Agent { index } => {
                    if index == self.index {
                        continue;
                    }
                    let (neighbor_position, neighbor_velocity) = ctx.snapshot.agent(index)?;

                    if position.distance_squared(neighbor_position) > COINCIDENT_DISTANCE_SQ {
                        collision_avoidance += separation_force(position, neighbor_position, settings);
                    } else {
                        coincident_neighbors += 1;
                    }

                    neighbors.push(index);
                    centroid += neighbor_position;
                    average_velocity += neighbor_velocity;
                }
                Neighbor::Obstacle { surface_point, reference } => {
                    collision_avoidance +=
                        collision_avoidance_force(position, direction, surface_point, reference, settings);
                }
            }
        }

        if !neighbors.is_empty() {
            let count = neighbors.len() as f32;
            centroid = centroid / count - position;
            // A spherical flock looks unnatural, spread it horizontally
            centroid.y *= settings.vertical_priority();
            average_velocity = average_velocity / count - self.velocity;
        }

        let alignment_weight = settings.alignment_weight();
        let position_force =
            (1.0 - alignment_weight) * settings.speed_multiplier() * (centroid + collision_avoidance);
        let alignment_force = alignment_weight * average_velocity / ctx.dt;
        let attraction = attraction_force(position, direction, ctx.waypoint, settings);
        let total_force = settings.total_force_multiplier() * (position_force + alignment_force + attraction);

        let inertness = settings.inertness();
        let desired_velocity = (1.0 - inertness) * total_force * ctx.dt + inertness * self.velocity;

        let velocity = steer(self.velocity, desired_velocity, direction, settings.min_speed());

        Ok(BoidUpdate {
            velocity,
            rotation: look_rotation(velocity),
            neighbors,
            coincident_neighbors,
            saturated: buffer.is_saturated(),
        })
    }

    // Write phase
    pub fn commit(&mut self, tick: TickId, update: BoidUpdate) {
        self.velocity = update.velocity;
        self.rotation = update.rotation;
        self.neighbors = update.neighbors;
        self.last_tick = Some(tick);
    }

    // Plan and commit in one go; a second call for the same or an older tick is a no-op
    pub fn tick(
        &mut self,
        tick: TickId,
        position: Vec3,
        ctx: &TickContext<'_>,
        buffer: &mut NeighborBuffer,
    ) -> FlockResult<bool> {
        if self.is_current(tick) {
            return Ok(false);
        }
        let update = self.plan(position, ctx, buffer)?;
        self.commit(tick, update);
        Ok(true)
    }
}

impl NeighborList for Boid {
    fn neighbor_indices(&self) -> &[usize] {
        &self.neighbors
    }
}
