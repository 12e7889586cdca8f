//! Ballistic executor
//!
//! Walks a payload's trajectory, threading position and direction from one
//! segment to the next, spawns branch shots and records everything in a
//! `ShotResult`. `fire` never panics or errors: faults are written onto the
//! (partial) result.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::obstacles::ObstacleQuery;
use super::payload::Payload;
use super::ray::RaySegment;
use super::segment::{StepContext, Tracer};
use super::shot::ShotResult;
use crate::config::EngineConfig;
use crate::consts::MIN_RECOLLISION_DISTANCE;
use crate::error::EngineError;
use crate::normalize_degrees;

/// Length of generated shot ids
const SHOT_ID_LEN: usize = 16;
const SHOT_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Leading rays that ignore the shooter when the payload doesn't say
const DEFAULT_IGNORE_SHOOTER_SEGMENTS: u32 = 1;

/// Everything needed to fire one shot
#[derive(Debug, Clone)]
pub struct FireRequest {
    pub source: DVec2,
    /// Degrees
    pub direction: f64,
    pub payload: Payload,
    pub shooter_ref: String,
    /// Unix ms; defaults to now
    pub timestamp: Option<u64>,
    /// Seed for shot ids; defaults to a hash of timestamp and shooter
    pub seed: Option<u64>,
}

impl FireRequest {
    pub fn new(source: DVec2, direction: f64, payload: Payload, shooter_ref: impl Into<String>) -> Self {
        Self {
            source,
            direction,
            payload,
            shooter_ref: shooter_ref.into(),
            timestamp: None,
            seed: None,
        }
    }

    pub fn at_time(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Builds a `BallisticExecutor`; fails if no obstacle query was supplied
#[derive(Default)]
pub struct ExecutorBuilder {
    config: Option<EngineConfig>,
    obstacles: Option<Arc<dyn ObstacleQuery + Send + Sync>>,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn obstacles(mut self, obstacles: Arc<dyn ObstacleQuery + Send + Sync>) -> Self {
        self.obstacles = Some(obstacles);
        self
    }

    pub fn build(self) -> Result<BallisticExecutor, EngineError> {
        let obstacles = self.obstacles.ok_or(EngineError::MissingObstacleQuery)?;
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(BallisticExecutor { config, obstacles })
    }
}

/// Fires payloads against a read-only obstacle query
///
/// Holds no per-shot state, so one executor can fire from many threads.
pub struct BallisticExecutor {
    config: EngineConfig,
    obstacles: Arc<dyn ObstacleQuery + Send + Sync>,
}

impl BallisticExecutor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fire one shot and return its finished record
    ///
    /// A record is `completed` only when every segment of the payload
    /// resolves, including segments never reached because an earlier one
    /// stopped. A non-finite source or direction yields an empty, incomplete
    /// record.
    pub fn fire(&self, request: FireRequest) -> ShotResult {
        let timestamp = request.timestamp.unwrap_or_else(now_ms);
        let seed = request
            .seed
            .unwrap_or_else(|| derive_seed(timestamp, &request.shooter_ref));
        let mut rng = Pcg32::seed_from_u64(seed);

        if !request.direction.is_finite() || !request.source.is_finite() {
            let e = EngineError::InvalidRequest(format!(
                "non-finite origin ({}, {}) or direction {}",
                request.source.x, request.source.y, request.direction
            ));
            log::error!("Shot by {} rejected: {}", request.shooter_ref, e);
            // Record a finite origin so the rejected shot still serializes
            let mut shot = ShotResult::start(
                generate_id(&mut rng),
                timestamp,
                &request.shooter_ref,
                DVec2::ZERO,
                0.0,
                request.payload,
            );
            shot.error = Some(e.to_string());
            return shot;
        }

        let shot = self.fire_shot(
            &request.payload,
            request.source,
            normalize_degrees(request.direction),
            &request.shooter_ref,
            timestamp,
            &mut rng,
            false,
        );

        let segments = shot.iter_shots().map(|s| s.segments().len()).sum::<usize>();
        let hits = shot.iter_shots().map(|s| s.hits().len()).sum::<usize>();
        log::info!(
            "Shot {} '{}' by {}: {} segments, {} hits, {:.2}ms{}",
            shot.id(),
            request.payload.name,
            request.shooter_ref,
            segments,
            hits,
            shot.execution_time(),
            if shot.completed() { "" } else { " (aborted)" }
        );
        shot
    }

    /// Cast a single aiming ray capped at `max_ray_distance`, cut at the first obstacle
    pub fn preview_ray(&self, source: DVec2, direction: f64, shooter_ref: &str) -> RaySegment {
        let ray = RaySegment::cast(source, normalize_degrees(direction), self.config.max_ray_distance);
        let tracer = Tracer::new(self.obstacles.as_ref(), shooter_ref, DEFAULT_IGNORE_SHOOTER_SEGMENTS);
        match tracer.first_stop(&ray, 0, 0.0) {
            Some(hit) => ray.truncated(hit.point),
            None => ray,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fire_shot(
        &self,
        payload: &Payload,
        source: DVec2,
        direction: f64,
        shooter_ref: &str,
        timestamp: u64,
        rng: &mut Pcg32,
        is_branch: bool,
    ) -> ShotResult {
        let started = Instant::now();
        let mut shot = ShotResult::start(
            generate_id(rng),
            timestamp,
            shooter_ref,
            source,
            direction,
            payload.clone(),
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run(&mut shot, payload, rng, is_branch)
        }));

        match outcome {
            Ok(Ok(())) => shot.completed = true,
            Ok(Err(e)) => {
                log::error!("Shot {} aborted: {}", shot.id, e);
                shot.error = Some(e.to_string());
            }
            Err(panic) => {
                let e = EngineError::ObstacleQueryFailed(panic_message(panic.as_ref()));
                log::error!("Shot {} aborted: {}", shot.id, e);
                shot.error = Some(e.to_string());
            }
        }

        shot.execution_time = started.elapsed().as_secs_f64() * 1000.0;
        shot
    }

    fn run(
        &self,
        shot: &mut ShotResult,
        payload: &Payload,
        rng: &mut Pcg32,
        is_branch: bool,
    ) -> Result<(), EngineError> {
        let ignore_shooter = payload
            .ignore_shooter_segments
            .unwrap_or(DEFAULT_IGNORE_SHOOTER_SEGMENTS);
        let shooter_ref = shot.shooter_ref.clone();
        let tracer = Tracer::new(self.obstacles.as_ref(), &shooter_ref, ignore_shooter);

        let max_segments = self.config.max_fire_segments;
        let mut position = shot.source;
        let mut direction = shot.direction;
        // Branches start on whatever their parent hit
        let mut min_first_distance = if is_branch { MIN_RECOLLISION_DISTANCE } else { 0.0 };

        let mut reached = 0;
        for (index, spec) in payload.trajectory.iter().enumerate() {
            reached = index;
            let used = shot.segments.len() as u32;
            if used >= max_segments {
                log::warn!(
                    "Shot {} hit the {}-segment cap before segment {}",
                    shot.id,
                    max_segments,
                    index
                );
                break;
            }

            let segment = spec.resolve(index, &self.config)?;
            reached = index + 1;
            let ctx = StepContext {
                position,
                direction,
                segment_index: used,
                budget: max_segments - used,
                min_first_distance,
            };
            let step = segment.execute(&ctx, &tracer);
            log::debug!(
                "Shot {} segment {} ({}): {} rays, {} hits",
                shot.id,
                index,
                segment.shape.label(),
                step.rays.len(),
                step.collisions.len()
            );

            shot.absorb(segment.shape.label(), &step, is_branch);
            position = step.next_position;
            direction = step.next_direction;
            min_first_distance = 0.0;

            if !step.rays.is_empty() {
                for branch in &segment.children {
                    let child_payload = Payload::single_line(
                        format!("{}#split", payload.name),
                        branch.length.min(self.config.max_ray_distance),
                    );
                    let child = self.fire_shot(
                        &child_payload,
                        step.next_position,
                        normalize_degrees(step.terminal_direction + branch.offset_angle),
                        &shooter_ref,
                        shot.timestamp,
                        rng,
                        true,
                    );
                    shot.split_shots.push(child);
                }
            }

            if step.capped {
                log::warn!(
                    "Shot {} hit the {}-segment cap in segment {}",
                    shot.id,
                    max_segments,
                    index
                );
                break;
            }
            if !step.should_continue {
                break;
            }
        }

        // Segments cut off by a stop or the cap must still be valid
        for (index, spec) in payload.trajectory.iter().enumerate().skip(reached) {
            spec.resolve(index, &self.config)?;
        }

        Ok(())
    }
}

fn generate_id(rng: &mut Pcg32) -> String {
    (0..SHOT_ID_LEN)
        .map(|_| SHOT_ID_ALPHABET[rng.random_range(0..SHOT_ID_ALPHABET.len())] as char)
        .collect()
}

/// FNV-1a over the shooter ref, mixed with the timestamp
fn derive_seed(timestamp: u64, shooter_ref: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in shooter_ref.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash ^ timestamp
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
