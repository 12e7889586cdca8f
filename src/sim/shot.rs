//! Shot results
//!
//! A `ShotResult` is the engine's only output. Fields are private: the
//! executor fills one in during a single `fire` call and hands it out
//! read-only, so a finished record can be persisted and replayed as-is.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::obstacles::Collision;
use super::payload::Payload;
use super::ray::RaySegment;
use super::segment::StepResult;

/// Ricochet marker of a recorded segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RicochetInfo {
    pub is_ricochet: bool,
    pub bounce_number: u32,
}

/// A render-ready segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRecord {
    pub seg_type: String,
    pub ray: RaySegment,
    pub segment_index: u32,
    pub ricochet: RicochetInfo,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A collision that ended or deflected one of the shot's segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitRecord {
    #[serde(flatten)]
    pub collision: Collision,
    pub segment_type: String,
    pub segment_index: u32,
}

/// Complete, serializable outcome of one fired shot (branches nested)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotResult {
    pub(crate) id: String,
    /// Unix time in ms
    pub(crate) timestamp: u64,
    pub(crate) shooter_ref: String,
    #[serde(with = "crate::serde_point")]
    pub(crate) source: DVec2,
    pub(crate) direction: f64,
    pub(crate) payload: Payload,
    pub(crate) segments: Vec<SegmentRecord>,
    pub(crate) hits: Vec<HitRecord>,
    pub(crate) split_shots: Vec<ShotResult>,
    pub(crate) total_distance: f64,
    /// Wall-clock ms spent in `fire`
    pub(crate) execution_time: f64,
    pub(crate) completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl ShotResult {
    pub(crate) fn start(
        id: String,
        timestamp: u64,
        shooter_ref: &str,
        source: DVec2,
        direction: f64,
        payload: Payload,
    ) -> Self {
        Self {
            id,
            timestamp,
            shooter_ref: shooter_ref.to_string(),
            source,
            direction,
            payload,
            segments: Vec::new(),
            hits: Vec::new(),
            split_shots: Vec::new(),
            total_distance: 0.0,
            execution_time: 0.0,
            completed: false,
            error: None,
        }
    }

    /// Append one step's rays and hits
    pub(crate) fn absorb(&mut self, seg_type: &str, step: &StepResult, is_branch: bool) {
        for traced in &step.rays {
            let mut tags = vec![seg_type.to_string()];
            if traced.is_ricochet() {
                tags.push("ricochet".to_string());
            }
            if is_branch {
                tags.push("branch".to_string());
            }
            self.total_distance += traced.ray.length();
            self.segments.push(SegmentRecord {
                seg_type: seg_type.to_string(),
                ray: traced.ray,
                segment_index: traced.segment_index,
                ricochet: RicochetInfo {
                    is_ricochet: traced.is_ricochet(),
                    bounce_number: traced.bounce_number,
                },
                tags,
            });
        }
        for hit in &step.collisions {
            self.hits.push(HitRecord {
                collision: hit.collision.clone(),
                segment_type: seg_type.to_string(),
                segment_index: hit.segment_index,
            });
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn shooter_ref(&self) -> &str {
        &self.shooter_ref
    }

    pub fn source(&self) -> DVec2 {
        self.source
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn segments(&self) -> &[SegmentRecord] {
        &self.segments
    }

    pub fn hits(&self) -> &[HitRecord] {
        &self.hits
    }

    pub fn split_shots(&self) -> &[ShotResult] {
        &self.split_shots
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn execution_time(&self) -> f64 {
        self.execution_time
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Depth-first walk over this shot and every nested split shot
    ///
    /// Parents come before their children; children keep their spawn order.
    pub fn iter_shots(&self) -> ShotIter<'_> {
        ShotIter { stack: vec![self] }
    }

    pub fn to_json(&self) -> Result<String, crate::EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, crate::EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Iterator returned by `ShotResult::iter_shots`
pub struct ShotIter<'a> {
    stack: Vec<&'a ShotResult>,
}

impl<'a> Iterator for ShotIter<'a> {
    type Item = &'a ShotResult;

    fn next(&mut self) -> Option<Self::Item> {
        let shot = self.stack.pop()?;
        self.stack.extend(shot.split_shots.iter().rev());
        Some(shot)
    }
}

/// Every segment in the shot tree, depth-first
pub fn flatten_segments(result: &ShotResult) -> Vec<&SegmentRecord> {
    result.iter_shots().flat_map(|s| s.segments.iter()).collect()
}

/// Every hit in the shot tree, depth-first
pub fn flatten_hits(result: &ShotResult) -> Vec<&HitRecord> {
    result.iter_shots().flat_map(|s| s.hits.iter()).collect()
}
