/*
 * Spatial Grid Module
 *
 * This module defines the neighbor query a boid runs every tick and a
 * uniform 3D hash grid that answers it. Space is divided into cubic cells;
 * a query only scans the cells overlapping its sphere instead of the whole
 * population. Obstacles are few and static, so they are tested directly.
 *
 * Optimized for performance by:
 * - Writing results into a caller-owned, fixed-capacity buffer
 * - Reusing cell vectors between rebuilds
 * - Comparing squared distances
 */

use std::collections::HashMap;

use glam::{IVec3, Vec3};

use crate::obstacle::Obstacle;
use crate::settings::LayerMask;

// Worst-case neighbor count for the reference population of 150 boids
pub const NEIGHBOR_BUFFER_CAPACITY: usize = 200;

// One hit of a neighborhood query, tagged by what it is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Neighbor {
    Agent { index: usize },
    Obstacle { surface_point: Vec3, reference: Vec3 },
}

// Bounded result buffer; never grows past the capacity it was created with
#[derive(Debug, Clone)]
pub struct NeighborBuffer {
    entries: Vec<Neighbor>,
    capacity: usize,
    saturated: bool,
}

impl Default for NeighborBuffer {
    fn default() -> Self {
        Self::with_capacity(NEIGHBOR_BUFFER_CAPACITY)
    }
}

impl NeighborBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            saturated: false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.saturated = false;
    }

    // Returns false (and drops the entry) once the buffer is full
    #[inline]
    pub fn push(&mut self, neighbor: Neighbor) -> bool {
        if self.entries.len() == self.capacity {
            self.saturated = true;
            return false;
        }
        self.entries.push(neighbor);
        true
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Neighbor] {
        &self.entries
    }
}

// "Find every entity within `radius`", filtered by layer
pub trait SpatialQuery {
    fn query_neighbors(&self, position: Vec3, radius: f32, mask: LayerMask, out: &mut NeighborBuffer);
}

pub struct SpatialGrid {
    pub cell_size: f32,
    cells: HashMap<IVec3, Vec<usize>>,
    positions: Vec<Vec3>,
    obstacles: Vec<Obstacle>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
            positions: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    // Convert world coordinates to a cell coordinate
    #[inline]
    pub fn cell_of(&self, position: Vec3) -> IVec3 {
        (position / self.cell_size).floor().as_ivec3()
    }

    pub fn set_obstacles(&mut self, obstacles: &[Obstacle]) {
        self.obstacles.clear();
        self.obstacles.extend_from_slice(obstacles);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    // Re-insert all boids from their committed positions
    pub fn rebuild(&mut self, positions: &[Vec3]) {
        // Drop cells that stayed empty for a whole tick, keep the rest allocated
        self.cells.retain(|_, cell| !cell.is_empty());
        for cell in self.cells.values_mut() {
            cell.clear();
        }

        self.positions.clear();
        self.positions.extend_from_slice(positions);

        for (index, &position) in positions.iter().enumerate() {
            let cell = self.cell_of(position);
            self.cells.entry(cell).or_default().push(index);
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl SpatialQuery for SpatialGrid {
    fn query_neighbors(&self, position: Vec3, radius: f32, mask: LayerMask, out: &mut NeighborBuffer) {
        out.clear();
        let radius_sq = radius * radius;

        if mask.intersects(LayerMask::BOIDS) {
            let reach = (radius / self.cell_size).ceil() as i32;
            let center = self.cell_of(position);

            for dz in -reach..=reach {
                for dy in -reach..=reach {
                    for dx in -reach..=reach {
                        let Some(cell) = self.cells.get(&(center + IVec3::new(dx, dy, dz))) else {
                            continue;
                        };
                        for &index in cell {
                            if self.positions[index].distance_squared(position) <= radius_sq
                                && !out.push(Neighbor::Agent { index })
                            {
                                return;
                            }
                        }
                    }
                }
            }
        }

        if mask.intersects(LayerMask::BOID_OBSTACLES) {
            for obstacle in &self.obstacles {
                let surface_point = obstacle.closest_point(position);
                if surface_point.distance_squared(position) <= radius_sq
                    && !out.push(Neighbor::Obstacle {
                        surface_point,
                        reference: obstacle.reference_position(),
                    })
                {
                    return;
                }
            }
        }
    }
}
