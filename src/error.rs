/*
 * Error Module
 *
 * Errors surfaced by the flocking core. The control loop itself corrects
 * numerical edge cases internally; what remains here are configuration
 * mistakes and population bookkeeping bugs in the caller.
 */

use thiserror::Error;

pub type FlockResult<T> = Result<T, FlockError>;

#[derive(Debug, Error)]
pub enum FlockError {
    #[error("invalid value for {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    // k2 = ... / (collision_distance - sensing_radius) has a zero denominator
    #[error("collision optimal distance ({distance}) must differ from sensing radius ({radius})")]
    DegenerateCollisionRange { distance: f32, radius: f32 },

    #[error("neighbor list references agent {index}, but population has {population} agents")]
    UnknownAgent { index: usize, population: usize },

    #[error("waypoint cycle is empty")]
    NoWaypoints,

    #[error("failed to parse simulation config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read simulation config: {0}")]
    Io(#[from] std::io::Error),
}
