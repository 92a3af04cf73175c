/*
 * Boid Settings Module
 *
 * This module defines the per-agent tunables (BoidSettings) together with the
 * constants derived from them. Setters validate their input before touching
 * any field and recompute every derived value in the same call, so a reader
 * never observes a stale factor. Two presets (fish-like and bird-like) reset
 * every field at once.
 */

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlockError, FlockResult};

// Tunables shared by both presets
const ALIGNMENT_WEIGHT: f32 = 0.0002;
const TOTAL_FORCE_MULTIPLIER: f32 = 1.0;
const INERTNESS: f32 = 0.5;
const VERTICAL_PRIORITY: f32 = 1.22;
const SENSING_RADIUS: f32 = 0.6;
const SEPARATION_OPTIMAL_DISTANCE: f32 = 0.3;
const COLLISION_OPTIMAL_DISTANCE: f32 = 0.2;

// Bit mask of the layers a boid interacts with (its own kind and obstacles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(u32);

impl LayerMask {
    pub const BOIDS_LAYER: u32 = 13;
    pub const BOID_OBSTACLES_LAYER: u32 = 15;

    pub const NONE: LayerMask = LayerMask(0);
    pub const BOIDS: LayerMask = LayerMask(1 << Self::BOIDS_LAYER);
    pub const BOID_OBSTACLES: LayerMask = LayerMask(1 << Self::BOID_OBSTACLES_LAYER);

    pub fn from_layers(layers: &[u32]) -> Self {
        let mut mask = 0;
        // Layers past the mask width have no bit and are ignored
        for &layer in layers {
            mask |= 1u32.checked_shl(layer).unwrap_or(0);
        }
        LayerMask(mask)
    }

    pub const fn union(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 | other.0)
    }

    pub const fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::BOIDS.union(LayerMask::BOID_OBSTACLES)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Fish,
    Bird,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoidSettings {
    preset: Preset,
    speed_multiplier: f32,
    // Max distance at which a boid sees (and takes into account) others
    sensing_radius: f32,
    separation_optimal_distance: f32,
    separation_factor: f32,
    collision_optimal_distance: f32,
    collision_force_at_optimal_distance: f32,
    alignment_weight: f32,
    total_force_multiplier: f32,
    inertness: f32,
    vertical_priority: f32,
    attraction_strength: f32,
    collision_k1: f32,
    collision_k2: f32,
    interaction_mask: LayerMask,
}

impl Default for BoidSettings {
    fn default() -> Self {
        Self::from_preset(Preset::Fish)
    }
}

impl BoidSettings {
    pub fn from_preset(preset: Preset) -> Self {
        let (speed_multiplier, attraction_strength) = match preset {
            Preset::Fish => (3.0, 0.25),
            Preset::Bird => (9.0, 0.15),
        };

        let mut settings = Self {
            preset,
            speed_multiplier,
            sensing_radius: SENSING_RADIUS,
            separation_optimal_distance: SEPARATION_OPTIMAL_DISTANCE,
            separation_factor: 0.0,
            collision_optimal_distance: COLLISION_OPTIMAL_DISTANCE,
            collision_force_at_optimal_distance: 0.0,
            alignment_weight: ALIGNMENT_WEIGHT,
            total_force_multiplier: TOTAL_FORCE_MULTIPLIER,
            inertness: INERTNESS,
            vertical_priority: VERTICAL_PRIORITY,
            attraction_strength,
            collision_k1: 0.0,
            collision_k2: 0.0,
            interaction_mask: LayerMask::default(),
        };
        settings.recompute_derived();
        settings
    }

    // Overwrite every field with the preset's values (no partial merge)
    pub fn apply_preset(&mut self, preset: Preset) {
        *self = Self::from_preset(preset);
        debug!(?preset, "boid settings reset to preset");
    }

    fn recompute_derived(&mut self) {
        self.separation_factor =
            self.separation_optimal_distance * self.separation_optimal_distance * 0.5;
        self.collision_force_at_optimal_distance = self.collision_optimal_distance * 0.5;
        self.collision_k1 = self.sensing_radius;
        self.collision_k2 = -2.0
            * self.speed_multiplier
            * self.collision_force_at_optimal_distance
            * self.collision_optimal_distance
            / (self.collision_optimal_distance - self.sensing_radius);
    }

    fn check(&self) -> FlockResult<()> {
        positive("speed_multiplier", self.speed_multiplier)?;
        positive("sensing_radius", self.sensing_radius)?;
        positive("separation_optimal_distance", self.separation_optimal_distance)?;
        positive("collision_optimal_distance", self.collision_optimal_distance)?;
        non_negative("attraction_strength", self.attraction_strength)?;
        non_negative("vertical_priority", self.vertical_priority)?;
        unit_interval("alignment_weight", self.alignment_weight)?;
        unit_interval("inertness", self.inertness)?;
        if !self.total_force_multiplier.is_finite() {
            return Err(FlockError::InvalidSetting {
                field: "total_force_multiplier",
                reason: format!("{} is not finite", self.total_force_multiplier),
            });
        }
        if (self.collision_optimal_distance - self.sensing_radius).abs() < f32::EPSILON {
            return Err(FlockError::DegenerateCollisionRange {
                distance: self.collision_optimal_distance,
                radius: self.sensing_radius,
            });
        }
        Ok(())
    }

    // Validate a modified copy, then swap it in whole
    fn update(&mut self, change: impl FnOnce(&mut Self)) -> FlockResult<()> {
        let mut candidate = self.clone();
        change(&mut candidate);
        candidate.check()?;
        candidate.recompute_derived();
        *self = candidate;
        Ok(())
    }

    pub fn set_speed_multiplier(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.speed_multiplier = value)
    }

    pub fn set_sensing_radius(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.sensing_radius = value)
    }

    pub fn set_separation_optimal_distance(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.separation_optimal_distance = value)
    }

    pub fn set_collision_optimal_distance(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.collision_optimal_distance = value)
    }

    pub fn set_alignment_weight(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.alignment_weight = value)
    }

    pub fn set_inertness(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.inertness = value)
    }

    pub fn set_vertical_priority(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.vertical_priority = value)
    }

    pub fn set_attraction_strength(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.attraction_strength = value)
    }

    pub fn set_total_force_multiplier(&mut self, value: f32) -> FlockResult<()> {
        self.update(|s| s.total_force_multiplier = value)
    }

    pub fn set_interaction_mask(&mut self, mask: LayerMask) {
        self.interaction_mask = mask;
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn sensing_radius(&self) -> f32 {
        self.sensing_radius
    }

    pub fn separation_optimal_distance(&self) -> f32 {
        self.separation_optimal_distance
    }

    // separation_optimal_distance² · 0.5
    pub fn separation_factor(&self) -> f32 {
        self.separation_factor
    }

    pub fn collision_optimal_distance(&self) -> f32 {
        self.collision_optimal_distance
    }

    // collision_optimal_distance · 0.5
    pub fn collision_force_at_optimal_distance(&self) -> f32 {
        self.collision_force_at_optimal_distance
    }

    pub fn min_speed(&self) -> f32 {
        0.1 * self.speed_multiplier
    }

    pub fn alignment_weight(&self) -> f32 {
        self.alignment_weight
    }

    pub fn total_force_multiplier(&self) -> f32 {
        self.total_force_multiplier
    }

    pub fn inertness(&self) -> f32 {
        self.inertness
    }

    pub fn vertical_priority(&self) -> f32 {
        self.vertical_priority
    }

    pub fn attraction_strength(&self) -> f32 {
        self.attraction_strength
    }

    pub fn collision_k1(&self) -> f32 {
        self.collision_k1
    }

    pub fn collision_k2(&self) -> f32 {
        self.collision_k2
    }

    pub fn interaction_mask(&self) -> LayerMask {
        self.interaction_mask
    }
}

fn positive(field: &'static str, value: f32) -> FlockResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FlockError::InvalidSetting { field, reason: format!("{value} must be finite and > 0") })
    }
}

fn non_negative(field: &'static str, value: f32) -> FlockResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FlockError::InvalidSetting { field, reason: format!("{value} must be finite and >= 0") })
    }
}

fn unit_interval(field: &'static str, value: f32) -> FlockResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FlockError::InvalidSetting { field, reason: format!("{value} must lie in [0, 1]") })
    }
}

// Per-field overrides read from a config file, applied on top of a preset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsOverrides {
    pub speed_multiplier: Option<f32>,
    pub sensing_radius: Option<f32>,
    pub separation_optimal_distance: Option<f32>,
    pub collision_optimal_distance: Option<f32>,
    pub attraction_strength: Option<f32>,
}

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        *self == SettingsOverrides::default()
    }

    // All overrides land together or not at all
    pub fn apply(&self, settings: &mut BoidSettings) -> FlockResult<()> {
        settings.update(|s| {
            if let Some(v) = self.speed_multiplier {
                s.speed_multiplier = v;
            }
            if let Some(v) = self.sensing_radius {
                s.sensing_radius = v;
            }
            if let Some(v) = self.separation_optimal_distance {
                s.separation_optimal_distance = v;
            }
            if let Some(v) = self.collision_optimal_distance {
                s.collision_optimal_distance = v;
            }
            if let Some(v) = self.attraction_strength {
                s.attraction_strength = v;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn default_is_fish_preset() {
        let settings = BoidSettings::default();
        assert_eq!(settings.preset(), Preset::Fish);
        assert!(close(settings.speed_multiplier(), 3.0));
        assert!(close(settings.attraction_strength(), 0.25));
        assert!(close(settings.min_speed(), 0.3));
        assert_eq!(settings.interaction_mask(), LayerMask::default());
    }

    #[test]
    fn derived_factors_follow_optimal_distances() {
        let mut settings = BoidSettings::default();
        assert!(close(settings.separation_factor(), 0.3 * 0.3 * 0.5));
        assert!(close(settings.collision_force_at_optimal_distance(), 0.1));

        settings.set_separation_optimal_distance(0.5).unwrap();
        assert!(close(settings.separation_factor(), 0.125));

        settings.set_collision_optimal_distance(0.4).unwrap();
        assert!(close(settings.collision_force_at_optimal_distance(), 0.2));
        // k2 = -2 * 3 * 0.2 * 0.4 / (0.4 - 0.6)
        assert!(close(settings.collision_k2(), 2.4));
        assert!(close(settings.collision_k1(), 0.6));
    }

    #[test]
    fn speed_multiplier_moves_min_speed_and_k2() {
        let mut settings = BoidSettings::default();
        let k2_before = settings.collision_k2();
        settings.set_speed_multiplier(6.0).unwrap();
        assert!(close(settings.min_speed(), 0.6));
        assert!(close(settings.collision_k2(), k2_before * 2.0));
    }

    #[test]
    fn degenerate_collision_range_is_rejected_without_mutation() {
        let mut settings = BoidSettings::default();
        let before = settings.clone();

        let err = settings.set_collision_optimal_distance(0.6).unwrap_err();
        assert!(matches!(err, FlockError::DegenerateCollisionRange { .. }));
        assert_eq!(settings, before);

        let err = settings.set_sensing_radius(0.2).unwrap_err();
        assert!(matches!(err, FlockError::DegenerateCollisionRange { .. }));
        assert_eq!(settings, before);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut settings = BoidSettings::default();
        assert!(settings.set_inertness(1.5).is_err());
        assert!(settings.set_alignment_weight(-0.1).is_err());
        assert!(settings.set_speed_multiplier(0.0).is_err());
        assert!(settings.set_sensing_radius(f32::NAN).is_err());
        assert!(settings.set_attraction_strength(-1.0).is_err());
        assert_eq!(settings, BoidSettings::default());
    }

    #[test]
    fn preset_switch_overwrites_every_field() {
        let mut settings = BoidSettings::default();
        settings.set_sensing_radius(1.5).unwrap();
        settings.set_inertness(0.9).unwrap();
        settings.set_interaction_mask(LayerMask::BOIDS);

        settings.apply_preset(Preset::Bird);
        assert_eq!(settings, BoidSettings::from_preset(Preset::Bird));
        assert!(close(settings.min_speed(), 0.9));
        assert!(close(settings.sensing_radius(), 0.6));
        assert!(close(settings.inertness(), 0.5));
        assert_eq!(settings.interaction_mask(), LayerMask::default());
    }

    #[test]
    fn overrides_apply_atomically() {
        let mut settings = BoidSettings::default();
        let overrides = SettingsOverrides {
            sensing_radius: Some(0.2),
            collision_optimal_distance: Some(0.1),
            ..Default::default()
        };
        // Swapping both at once is fine even though radius alone would collide
        overrides.apply(&mut settings).unwrap();
        assert!(close(settings.sensing_radius(), 0.2));
        assert!(close(settings.collision_force_at_optimal_distance(), 0.05));

        let bad = SettingsOverrides { sensing_radius: Some(0.1), ..Default::default() };
        let before = settings.clone();
        assert!(bad.apply(&mut settings).is_err());
        assert_eq!(settings, before);
    }

    #[test]
    fn layer_mask_from_layers() {
        let mask = LayerMask::from_layers(&[LayerMask::BOIDS_LAYER, LayerMask::BOID_OBSTACLES_LAYER]);
        assert_eq!(mask, LayerMask::default());
        assert_eq!(mask.bits(), (1 << 13) | (1 << 15));
        assert!(mask.intersects(LayerMask::BOIDS));
        assert!(!LayerMask::BOIDS.intersects(LayerMask::BOID_OBSTACLES));
        assert!(!LayerMask::NONE.intersects(mask));
    }

    #[test]
    fn layer_mask_ignores_layers_past_width() {
        assert_eq!(LayerMask::from_layers(&[32, 200]), LayerMask::NONE);
        let mask = LayerMask::from_layers(&[31, 32, LayerMask::BOIDS_LAYER]);
        assert_eq!(mask.bits(), (1 << 31) | (1 << 13));
    }
}
