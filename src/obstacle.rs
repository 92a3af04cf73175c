/*
 * Obstacle Module
 *
 * Static shapes boids steer around. Only two questions are ever asked of an
 * obstacle: the closest point on its surface to a query position and a
 * reference point (its center) used when a boid sits exactly on the surface.
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Obstacle {
    Sphere { center: Vec3, radius: f32 },
    Box { center: Vec3, half_extents: Vec3 },
}

impl Obstacle {
    // Points inside the volume are their own closest point, like an engine collider
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        match *self {
            Obstacle::Sphere { center, radius } => {
                let offset = point - center;
                let distance = offset.length();
                if distance <= radius {
                    point
                } else {
                    center + offset * (radius / distance)
                }
            }
            Obstacle::Box { center, half_extents } => {
                center + (point - center).clamp(-half_extents, half_extents)
            }
        }
    }

    pub fn reference_position(&self) -> Vec3 {
        match *self {
            Obstacle::Sphere { center, .. } | Obstacle::Box { center, .. } => center,
        }
    }
}
