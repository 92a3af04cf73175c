/*
 * Force Model Module
 *
 * Pure functions computing the forces acting on a single boid:
 * 1. Separation: inverse-square repulsion from a neighboring boid
 * 2. Collision avoidance: repulsion from the closest point of an obstacle
 * 3. Attraction: a pull toward the current waypoint that only bends the
 *    heading and adds no speed when the boid is already on course
 *
 * Nothing here holds state; the boid tick accumulates the results.
 */

use glam::Vec3;

use crate::settings::BoidSettings;

// Map the angle between two unit vectors from [0, π] onto [0, 1]
#[inline]
pub fn angle_to_factor(a: Vec3, b: Vec3) -> f32 {
    (1.0 - a.dot(b).clamp(-1.0, 1.0)) * 0.5
}

// Repulsion from one neighbor. Grows without bound as the distance shrinks.
//
// Precondition: the two positions must not coincide; callers skip such
// neighbors instead of dividing by a zero squared distance.
#[inline]
pub fn separation_force(position: Vec3, neighbor_position: Vec3, settings: &BoidSettings) -> Vec3 {
    let away = position - neighbor_position;
    let squared_distance = away.length_squared();
    debug_assert!(squared_distance > 0.0, "separation_force called with coincident positions");
    away * settings.separation_factor() / squared_distance
}

// Repulsion from an obstacle, given its closest surface point.
//
// Between an obstacle and a boid at the collision optimal distance there is
// the same force as between two boids at that distance. The force is scaled
// by how much the boid is heading toward the obstacle, so a boid already
// moving away barely feels it.
pub fn collision_avoidance_force(
    position: Vec3,
    direction: Vec3,
    surface_point: Vec3,
    reference_position: Vec3,
    settings: &BoidSettings,
) -> Vec3 {
    let mut away = position - surface_point;
    let mut distance = away.length();

    if distance <= f32::EPSILON {
        // Standing on the surface: push outward from the obstacle itself
        away = (surface_point - reference_position).normalize_or_zero();
        distance = 0.1 * settings.collision_optimal_distance();
    } else {
        away /= distance;
    }

    let k2 = settings.collision_k2();
    away * (k2 * (k2 / distance - 1.0) * angle_to_factor(away, direction))
}

// Pull toward the current waypoint; zero without one
pub fn attraction_force(
    position: Vec3,
    direction: Vec3,
    waypoint: Option<Vec3>,
    settings: &BoidSettings,
) -> Vec3 {
    let Some(target) = waypoint else {
        return Vec3::ZERO;
    };

    let to_target = (target - position).normalize_or_zero();
    let factor = settings.attraction_strength()
        * settings.speed_multiplier()
        * angle_to_factor(to_target, direction);

    to_target * factor
}
