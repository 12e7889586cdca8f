//! Deterministic shot simulation
//!
//! Everything that decides where a shot goes lives here. It must stay pure
//! and deterministic:
//! - No RNG in geometry or stepping (only shot ids are random, and seeded)
//! - Collision lists have a total order
//! - No rendering or transport dependencies

pub mod executor;
pub mod geometry;
pub mod obstacles;
pub mod payload;
pub mod ray;
pub mod segment;
pub mod shot;

pub use executor::{BallisticExecutor, ExecutorBuilder, FireRequest};
pub use geometry::{
    Rect, barrier_normal, intersect_segment_rect, intersect_segments, reflect, reflect_direction,
};
pub use obstacles::{
    Area, Barrier, Body, Collision, CollisionKind, Edge, ObstacleQuery, ObstacleSnapshot,
};
pub use payload::{BranchSpec, Payload, RicochetSpec, SegmentKind, SegmentSpec};
pub use ray::RaySegment;
pub use segment::{Segment, SegmentShape, StepContext, StepResult, Tracer};
pub use shot::{HitRecord, RicochetInfo, SegmentRecord, ShotResult, flatten_hits, flatten_segments};
