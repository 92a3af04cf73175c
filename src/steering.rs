/*
 * Steering Module
 *
 * Turns a desired velocity into the velocity a boid can actually reach this
 * tick. A boid cannot change direction instantly: the desired velocity is
 * spent first on rotating toward the new heading and only what remains
 * changes the speed. Sharp corrections therefore turn the boid without
 * accelerating it, gentle ones let most of the force become speed.
 */

use glam::{Mat3, Quat, Vec3};

// Used when neither the current velocity nor the default direction can be normalized
pub const FALLBACK_DIRECTION: Vec3 = Vec3::Z;

pub fn steer(current_velocity: Vec3, desired_velocity: Vec3, default_direction: Vec3, min_speed: f32) -> Vec3 {
    let mut current_magnitude = current_velocity.length();
    let mut heading = if current_magnitude > f32::EPSILON {
        current_velocity / current_magnitude
    } else {
        current_magnitude = 1.0;
        default_direction.try_normalize().unwrap_or(FALLBACK_DIRECTION)
    };

    let desired_magnitude = desired_velocity.length();
    let mut result_magnitude = min_speed;

    if desired_magnitude > f32::EPSILON {
        let desired_heading = desired_velocity / desired_magnitude;

        // Twice the current speed in desired magnitude buys any rotation
        let rotation_budget = 2.0 * current_magnitude * crate::forces::angle_to_factor(desired_heading, heading);
        let speed_rest = desired_magnitude - rotation_budget;

        if speed_rest > 0.0 {
            heading = desired_heading;
            result_magnitude = speed_rest;
        } else {
            heading = slerp_direction(heading, desired_heading, desired_magnitude / rotation_budget);
        }

        if result_magnitude < min_speed {
            result_magnitude = min_speed;
        }
    }

    heading * result_magnitude
}

// Spherical interpolation between two unit directions
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let arc = Quat::from_rotation_arc(from, to);
    let partial = Quat::IDENTITY.slerp(arc, t.clamp(0.0, 1.0));
    (partial * from).try_normalize().unwrap_or(from)
}

// Rotation turning local +Z onto the velocity, keeping local +Y close to world up
pub fn look_rotation(velocity: Vec3) -> Quat {
    let Some(forward) = velocity.try_normalize() else {
        return Quat::IDENTITY;
    };

    let up_hint = if forward.cross(Vec3::Y).length_squared() > 1e-6 { Vec3::Y } else { Vec3::Z };
    let right = up_hint.cross(forward).normalize();
    let up = forward.cross(right);

    Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-4;
    const MIN_SPEED: f32 = 0.3;

    #[test]
    fn aligned_desire_passes_through_unchanged() {
        let current = Vec3::new(1.0, 0.5, -2.0);
        let result = steer(current, current, current.normalize(), MIN_SPEED);
        assert!((result - current).length() < TOLERANCE);
    }

    #[test]
    fn zero_desire_floors_at_min_speed_in_current_direction() {
        let current = Vec3::new(0.0, 0.0, 4.0);
        let result = steer(current, Vec3::ZERO, Vec3::Z, MIN_SPEED);
        assert!((result - Vec3::new(0.0, 0.0, MIN_SPEED)).length() < TOLERANCE);
    }

    #[test]
    fn speed_never_drops_below_floor() {
        let velocities = [
            Vec3::ZERO,
            Vec3::X * 1e-9,
            Vec3::new(2.0, -1.0, 0.5),
            Vec3::new(-0.01, 0.0, 0.02),
            Vec3::Y * 50.0,
        ];
        let defaults = [Vec3::ZERO, Vec3::X, Vec3::new(0.0, 1.0, 1.0)];

        for &current in &velocities {
            for &desired in &velocities {
                for &default in &defaults {
                    let result = steer(current, desired, default, MIN_SPEED);
                    assert!(result.is_finite());
                    assert!(result.length() >= MIN_SPEED - TOLERANCE, "{current} -> {desired}: {result}");
                }
            }
        }
    }

    #[test]
    fn sharp_turn_rotates_without_gaining_speed() {
        let current = Vec3::X * 2.0;
        // Perpendicular desire: angle factor 0.5, budget 2.0 > 1.0
        let desired = Vec3::Z * 1.0;
        let result = steer(current, desired, Vec3::X, MIN_SPEED);

        assert!((result.length() - MIN_SPEED).abs() < TOLERANCE);
        let heading = result.normalize();
        // Half of a 90 degree turn
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!((heading - expected).length() < TOLERANCE);
    }

    #[test]
    fn gentle_turn_snaps_and_keeps_leftover_speed() {
        let current = Vec3::X;
        let desired = Vec3::Z * 3.0;
        // Budget = 2 * 1 * 0.5 = 1, leftover 2
        let result = steer(current, desired, Vec3::X, MIN_SPEED);
        assert!((result - Vec3::Z * 2.0).length() < TOLERANCE);
    }

    #[test]
    fn zero_velocity_uses_default_direction_with_unit_magnitude() {
        let result = steer(Vec3::ZERO, Vec3::ZERO, Vec3::NEG_X, MIN_SPEED);
        assert!((result - Vec3::NEG_X * MIN_SPEED).length() < TOLERANCE);

        let result = steer(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, MIN_SPEED);
        assert!((result - FALLBACK_DIRECTION * MIN_SPEED).length() < TOLERANCE);
    }

    #[test]
    fn look_rotation_faces_velocity() {
        assert_eq!(look_rotation(Vec3::ZERO), Quat::IDENTITY);

        for v in [Vec3::X, Vec3::new(1.0, 2.0, 3.0), Vec3::Y * 4.0, Vec3::NEG_Y, Vec3::NEG_Z] {
            let rotation = look_rotation(v);
            let forward = rotation * Vec3::Z;
            assert!((forward - v.normalize()).length() < TOLERANCE, "{v}: {forward}");
        }

        let level = look_rotation(Vec3::X);
        assert!(((level * Vec3::Y) - Vec3::Y).length() < TOLERANCE);
    }
}
