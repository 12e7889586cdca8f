//! Ricochet - payload-driven trajectory simulation and shot replication
//!
//! Core modules:
//! - `sim`: Deterministic shot simulation (geometry, segments, executor)
//! - `net`: Wire messages, broadcasting and the replica inbox
//! - `replay`: Re-draw a finished shot without touching the scene
//! - `persistence`: Versioned JSON envelope for stored shots
//! - `history`: Bounded list of recently stored shots
//! - `config`: Engine-level tuning

pub mod config;
pub mod error;
pub mod history;
pub mod net;
pub mod persistence;
pub mod replay;
pub mod serde_point;
pub mod sim;

pub use config::EngineConfig;
pub use error::EngineError;
pub use history::ShotHistory;
pub use sim::{
    BallisticExecutor, Collision, CollisionKind, ExecutorBuilder, FireRequest, ObstacleQuery,
    ObstacleSnapshot, Payload, RaySegment, SegmentSpec, ShotResult, flatten_hits,
    flatten_segments,
};

use glam::DVec2;

/// Engine constants
pub mod consts {
    /// Determinant below which two segments are treated as parallel
    pub const PARALLEL_TOLERANCE: f64 = 1e-10;
    /// Slack (px) when a ray runs parallel to a rectangle slab
    pub const RECT_CONTAINMENT_TOLERANCE: f64 = 0.5;
    /// Collisions closer than this (px) to a bounced ray's start are ignored
    pub const MIN_RECOLLISION_DISTANCE: f64 = 5.0;
    /// Distance (px) a bounced ray restarts from the impact point
    pub const RICOCHET_RESTART_OFFSET: f64 = 5.0;

    /// Default cap on the length of any single ray
    pub const DEFAULT_MAX_RAY_DISTANCE: f64 = 5000.0;
    /// Default sub-step length for `LineUntilCollision`
    pub const DEFAULT_FIRE_SEGMENT_LENGTH: f64 = 50.0;
    /// Default global per-shot ray cap
    pub const DEFAULT_MAX_FIRE_SEGMENTS: u32 = 50;
    /// Default bounce budget when a segment doesn't set one
    pub const DEFAULT_MAX_RICOCHETS: u32 = 3;
    /// Default replay delay between drawn segments (ms)
    pub const DEFAULT_STEP_DELAY_MS: u64 = 50;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Unit vector for a direction in degrees (0° = +x, 90° = +y, clockwise on screen)
#[inline]
pub fn direction_to_vector(degrees: f64) -> DVec2 {
    let rad = degrees.to_radians();
    DVec2::new(rad.cos(), rad.sin())
}

/// Direction in degrees for a vector, normalized to [0, 360)
#[inline]
pub fn vector_to_direction(v: DVec2) -> f64 {
    normalize_degrees(v.y.atan2(v.x).to_degrees())
}
