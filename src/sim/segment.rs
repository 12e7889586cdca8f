//! Executable trajectory segments
//!
//! A `Segment` is a resolved `SegmentSpec`. Executing it casts one or more
//! rays from the current position, bouncing off barriers while its bounce
//! budget lasts, and reports where the next segment should pick up.

use glam::DVec2;

use super::geometry::{point_along, reflect_direction};
use super::obstacles::{Collision, CollisionKind, ObstacleQuery};
use super::payload::BranchSpec;
use super::ray::RaySegment;
use crate::consts::{MIN_RECOLLISION_DISTANCE, RICOCHET_RESTART_OFFSET};

/// Lengths below this are treated as fully travelled
const LENGTH_EPSILON: f64 = 1e-9;

/// Path shape of a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentShape {
    /// One ray of fixed length
    Line { length: f64 },
    /// Rays of `step` length until something is hit or `max_iterations` rays are cast
    LineUntilCollision { step: f64, max_iterations: u32 },
}

impl SegmentShape {
    pub fn label(&self) -> &'static str {
        match self {
            SegmentShape::Line { .. } => "line",
            SegmentShape::LineUntilCollision { .. } => "lineUntilCollision",
        }
    }
}

/// A validated segment ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub shape: SegmentShape,
    /// Bounces allowed off barriers (0 = ricochet disabled)
    pub max_bounces: u32,
    pub children: Vec<BranchSpec>,
}

/// Where and how a segment starts
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub position: DVec2,
    /// Degrees
    pub direction: f64,
    /// Index the first ray of this step will get
    pub segment_index: u32,
    /// Rays left in the shot's global budget
    pub budget: u32,
    /// Collisions closer than this to the first ray's start are ignored
    pub min_first_distance: f64,
}

/// A ray cast by a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracedRay {
    pub ray: RaySegment,
    pub segment_index: u32,
    /// Bounce that produced this ray; 0 for a direct ray
    pub bounce_number: u32,
}

impl TracedRay {
    pub fn is_ricochet(&self) -> bool {
        self.bounce_number > 0
    }
}

/// A collision recorded on one of the step's rays
#[derive(Debug, Clone, PartialEq)]
pub struct StepHit {
    pub segment_index: u32,
    pub collision: Collision,
}

/// Outcome of executing one segment
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub rays: Vec<TracedRay>,
    pub collisions: Vec<StepHit>,
    pub next_position: DVec2,
    pub next_direction: f64,
    /// Direction of travel at the terminal point (branches fan out from it)
    pub terminal_direction: f64,
    /// False when a collision ended the shot
    pub should_continue: bool,
    /// True when the shot's ray budget ran out mid-step
    pub capped: bool,
}

/// Engine-side ray caster shared by every segment of one shot
///
/// Owns the collision filtering rules: shooter self-hits on the first rays
/// and near re-collisions right after a bounce.
pub struct Tracer<'a> {
    obstacles: &'a dyn ObstacleQuery,
    shooter_ref: &'a str,
    ignore_shooter_rays: u32,
}

impl<'a> Tracer<'a> {
    pub fn new(obstacles: &'a dyn ObstacleQuery, shooter_ref: &'a str, ignore_shooter_rays: u32) -> Self {
        Self {
            obstacles,
            shooter_ref,
            ignore_shooter_rays,
        }
    }

    /// First collision that should stop or deflect `ray`
    pub fn first_stop(&self, ray: &RaySegment, segment_index: u32, min_distance: f64) -> Option<Collision> {
        let ignore_shooter = segment_index < self.ignore_shooter_rays;
        self.obstacles
            .query_collisions(ray)
            .into_iter()
            .filter(|c| c.distance >= min_distance)
            .find(|c| {
                !(ignore_shooter && c.kind == CollisionKind::Body && c.object_ref == self.shooter_ref)
            })
    }
}

enum Cast {
    /// Ray ran its full length
    Clear,
    /// Ray stopped on an obstacle
    Stopped,
    /// Ray bounced after travelling `traveled` px
    Bounced { traveled: f64 },
    /// Shot budget exhausted, nothing cast
    Capped,
}

/// Mutable walk state for one `execute` call
struct Walk<'t, 'a> {
    tracer: &'t Tracer<'a>,
    budget: u32,
    max_bounces: u32,
    position: DVec2,
    direction: f64,
    next_index: u32,
    min_distance: f64,
    bounces: u32,
    pending_bounce: u32,
    rays: Vec<TracedRay>,
    collisions: Vec<StepHit>,
    stopped: bool,
    capped: bool,
}

impl<'t, 'a> Walk<'t, 'a> {
    fn new(ctx: &StepContext, tracer: &'t Tracer<'a>, max_bounces: u32) -> Self {
        Self {
            tracer,
            budget: ctx.budget,
            max_bounces,
            position: ctx.position,
            direction: ctx.direction,
            next_index: ctx.segment_index,
            min_distance: ctx.min_first_distance,
            bounces: 0,
            pending_bounce: 0,
            rays: Vec::new(),
            collisions: Vec::new(),
            stopped: false,
            capped: false,
        }
    }

    fn cast(&mut self, length: f64) -> Cast {
        if self.rays.len() as u32 >= self.budget {
            self.capped = true;
            return Cast::Capped;
        }

        let ray = RaySegment::cast(self.position, self.direction, length);
        let segment_index = self.next_index;
        self.next_index += 1;
        let bounce_number = std::mem::take(&mut self.pending_bounce);
        let hit = self.tracer.first_stop(&ray, segment_index, self.min_distance);
        self.min_distance = 0.0;

        let Some(collision) = hit else {
            self.rays.push(TracedRay {
                ray,
                segment_index,
                bounce_number,
            });
            self.position = ray.end;
            return Cast::Clear;
        };

        self.rays.push(TracedRay {
            ray: ray.truncated(collision.point),
            segment_index,
            bounce_number,
        });
        let point = collision.point;
        let traveled = collision.distance;
        let edge = collision.edge;
        let kind = collision.kind;
        self.collisions.push(StepHit {
            segment_index,
            collision,
        });

        match (kind, edge) {
            (CollisionKind::Barrier, Some(edge)) if self.bounces < self.max_bounces => {
                self.bounces += 1;
                self.direction = reflect_direction(self.direction, edge.a, edge.b);
                self.position = point_along(point, self.direction, RICOCHET_RESTART_OFFSET);
                self.min_distance = MIN_RECOLLISION_DISTANCE;
                self.pending_bounce = self.bounces;
                log::debug!(
                    "ricochet #{} off '{}' at ({:.1}, {:.1}) -> {:.1}°",
                    self.bounces,
                    self.collisions[self.collisions.len() - 1].collision.object_ref,
                    point.x,
                    point.y,
                    self.direction
                );
                Cast::Bounced { traveled }
            }
            _ => {
                self.position = point;
                self.stopped = true;
                Cast::Stopped
            }
        }
    }

    fn finish(self) -> StepResult {
        StepResult {
            rays: self.rays,
            collisions: self.collisions,
            next_position: self.position,
            next_direction: self.direction,
            terminal_direction: self.direction,
            should_continue: !(self.stopped || self.capped),
            capped: self.capped,
        }
    }
}

impl Segment {
    /// Cast this segment's rays starting from `ctx`
    pub fn execute(&self, ctx: &StepContext, tracer: &Tracer<'_>) -> StepResult {
        let mut walk = Walk::new(ctx, tracer, self.max_bounces);

        match self.shape {
            SegmentShape::Line { length } => {
                let mut remaining = length;
                loop {
                    match walk.cast(remaining) {
                        Cast::Clear | Cast::Stopped | Cast::Capped => break,
                        Cast::Bounced { traveled } => {
                            remaining -= traveled;
                            if remaining <= LENGTH_EPSILON {
                                break;
                            }
                        }
                    }
                }
            }
            SegmentShape::LineUntilCollision {
                step,
                max_iterations,
            } => {
                for _ in 0..max_iterations {
                    match walk.cast(step) {
                        Cast::Clear | Cast::Bounced { .. } => {}
                        Cast::Stopped | Cast::Capped => break,
                    }
                }
            }
        }

        walk.finish()
    }
}
