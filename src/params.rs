/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct holding everything needed
 * to set up a simulation: population size and preset, where boids spawn,
 * the fixed timestep, how often flocks are regrouped, waypoints and
 * obstacles. Parameters are read from TOML files and validated before a
 * simulation is built from them.
 */

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{FlockError, FlockResult};
use crate::grouping::ChangePolicy;
use crate::obstacle::Obstacle;
use crate::settings::{BoidSettings, Preset, SettingsOverrides};
use crate::spatial_grid::NEIGHBOR_BUFFER_CAPACITY;
use crate::waypoints::DEFAULT_TRIGGER_RADIUS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationParams {
    pub num_boids: usize,
    pub preset: Preset,
    pub settings: SettingsOverrides,
    pub spawn_center: Vec3,
    pub spawn_radius: f32,
    pub fixed_physics_fps: f32,
    // Seconds between two flock regroupings; 0 disables automatic regrouping
    pub group_interval: f32,
    pub change_policy: ChangePolicy,
    pub enable_parallel: bool,
    pub neighbor_buffer_capacity: usize,
    pub waypoint_trigger_radius: f32,
    pub waypoints: Vec<Vec3>,
    pub obstacles: Vec<Obstacle>,
    pub seed: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_boids: 150,
            preset: Preset::Fish,
            settings: SettingsOverrides::default(),
            spawn_center: Vec3::ZERO,
            spawn_radius: 0.3,
            fixed_physics_fps: 50.0,
            group_interval: 0.5,
            change_policy: ChangePolicy::CompareSets,
            enable_parallel: true,
            neighbor_buffer_capacity: NEIGHBOR_BUFFER_CAPACITY,
            waypoint_trigger_radius: DEFAULT_TRIGGER_RADIUS,
            waypoints: Vec::new(),
            obstacles: Vec::new(),
            seed: None,
        }
    }
}

impl SimulationParams {
    pub fn from_toml_str(source: &str) -> FlockResult<Self> {
        let params: SimulationParams = toml::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: impl AsRef<Path>) -> FlockResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> FlockResult<()> {
        if !(self.fixed_physics_fps.is_finite() && self.fixed_physics_fps > 0.0) {
            return Err(invalid("fixed_physics_fps", self.fixed_physics_fps, "must be finite and > 0"));
        }
        if !(self.group_interval.is_finite() && self.group_interval >= 0.0) {
            return Err(invalid("group_interval", self.group_interval, "must be finite and >= 0"));
        }
        if !(self.spawn_radius.is_finite() && self.spawn_radius >= 0.0) {
            return Err(invalid("spawn_radius", self.spawn_radius, "must be finite and >= 0"));
        }
        if !(self.waypoint_trigger_radius.is_finite() && self.waypoint_trigger_radius > 0.0) {
            return Err(invalid("waypoint_trigger_radius", self.waypoint_trigger_radius, "must be finite and > 0"));
        }
        if self.neighbor_buffer_capacity == 0 {
            return Err(FlockError::InvalidSetting {
                field: "neighbor_buffer_capacity",
                reason: "must hold at least one entry".to_string(),
            });
        }
        self.boid_settings().map(|_| ())
    }

    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.fixed_physics_fps
    }

    // Preset with the configured overrides applied
    pub fn boid_settings(&self) -> FlockResult<BoidSettings> {
        let mut settings = BoidSettings::from_preset(self.preset);
        self.settings.apply(&mut settings)?;
        Ok(settings)
    }

    // Get parameter range for the UI slider
    pub fn get_group_interval_range() -> std::ops::RangeInclusive<f32> {
        0.0..=5.0
    }
}

fn invalid(field: &'static str, value: f32, reason: &str) -> FlockError {
    FlockError::InvalidSetting { field, reason: format!("{value} {reason}") }
}
