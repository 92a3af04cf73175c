/*
 * Waypoints Module
 *
 * An ordered cycle of positions the flock is weakly attracted to. Only the
 * current waypoint matters to the boids; once any boid reaches it the cycle
 * moves on to the next one, wrapping around at the end.
 */

use glam::Vec3;
use tracing::info;

use crate::error::{FlockError, FlockResult};

// Radius of the trigger around the current waypoint
pub const DEFAULT_TRIGGER_RADIUS: f32 = 0.5;

// What the force model needs to know about waypoints
pub trait WaypointSource {
    fn is_empty(&self) -> bool;
    fn current_waypoint_position(&self) -> FlockResult<Vec3>;

    fn current(&self) -> Option<Vec3> {
        self.current_waypoint_position().ok()
    }
}

#[derive(Debug, Clone)]
pub struct WaypointCycle {
    waypoints: Vec<Vec3>,
    current: usize,
    pub trigger_radius: f32,
}

impl Default for WaypointCycle {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_RADIUS)
    }
}

impl WaypointCycle {
    pub fn new(trigger_radius: f32) -> Self {
        Self {
            waypoints: Vec::new(),
            current: 0,
            trigger_radius,
        }
    }

    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>, trigger_radius: f32) -> Self {
        let mut cycle = Self::new(trigger_radius);
        for position in positions {
            cycle.add(position);
        }
        cycle
    }

    pub fn add(&mut self, position: Vec3) -> usize {
        self.waypoints.push(position);
        self.waypoints.len() - 1
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.current = 0;
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.waypoints
    }

    // A single waypoint stays current forever
    pub fn advance(&mut self) {
        if self.waypoints.len() <= 1 {
            return;
        }
        self.current = (self.current + 1) % self.waypoints.len();
        info!(waypoint = self.current, "moved to next waypoint");
    }

    pub fn is_reached_by(&self, position: Vec3) -> bool {
        match self.current() {
            Some(target) => target.distance_squared(position) <= self.trigger_radius * self.trigger_radius,
            None => false,
        }
    }
}

impl WaypointSource for WaypointCycle {
    fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    fn current_waypoint_position(&self) -> FlockResult<Vec3> {
        self.waypoints.get(self.current).copied().ok_or(FlockError::NoWaypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cycle_has_no_current() {
        let cycle = WaypointCycle::default();
        assert!(cycle.is_empty());
        assert!(cycle.current().is_none());
        assert!(matches!(cycle.current_waypoint_position(), Err(FlockError::NoWaypoints)));
        assert!(!cycle.is_reached_by(Vec3::ZERO));
    }

    #[test]
    fn advance_wraps_around() {
        let mut cycle = WaypointCycle::from_positions([Vec3::X, Vec3::Y, Vec3::Z], 0.5);
        assert_eq!(cycle.current(), Some(Vec3::X));
        cycle.advance();
        cycle.advance();
        assert_eq!(cycle.current(), Some(Vec3::Z));
        cycle.advance();
        assert_eq!(cycle.current_index(), 0);
    }

    #[test]
    fn single_waypoint_never_advances() {
        let mut cycle = WaypointCycle::from_positions([Vec3::X], 0.5);
        cycle.advance();
        assert_eq!(cycle.current_index(), 0);
    }

    #[test]
    fn clear_resets_index() {
        let mut cycle = WaypointCycle::from_positions([Vec3::X, Vec3::Y], 0.5);
        cycle.advance();
        cycle.clear();
        assert_eq!(cycle.current_index(), 0);
        assert_eq!(cycle.len(), 0);
        cycle.add(Vec3::Z);
        assert_eq!(cycle.current(), Some(Vec3::Z));
    }

    #[test]
    fn reach_uses_trigger_radius() {
        let cycle = WaypointCycle::from_positions([Vec3::ZERO], 0.5);
        assert!(cycle.is_reached_by(Vec3::new(0.3, 0.3, 0.0)));
        assert!(!cycle.is_reached_by(Vec3::new(0.4, 0.4, 0.0)));
    }
}
