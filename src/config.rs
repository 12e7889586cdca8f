//! Engine configuration
//!
//! Loaded from camelCase JSON; missing keys fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::EngineError;

/// Engine-level tuning shared by every shot an executor fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Hard cap on the length of any single ray
    pub max_ray_distance: f64,
    /// Sub-step length for `LineUntilCollision` when the segment doesn't set one
    pub fire_segment_length: f64,
    /// Global ray cap per shot (branches get their own)
    pub max_fire_segments: u32,
    /// Global ricochet gate; when false no segment bounces
    pub allow_ricochet: bool,
    /// Bounce budget for segments that enable ricochet without `maxBounces`
    pub max_ricochets: u32,
    /// Replay delay between drawn segments (ms)
    pub step_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_ray_distance: DEFAULT_MAX_RAY_DISTANCE,
            fire_segment_length: DEFAULT_FIRE_SEGMENT_LENGTH,
            max_fire_segments: DEFAULT_MAX_FIRE_SEGMENTS,
            allow_ricochet: true,
            max_ricochets: DEFAULT_MAX_RICOCHETS,
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
        }
    }
}

impl EngineConfig {
    /// Reject values that would make stepping meaningless
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.max_ray_distance.is_finite() && self.max_ray_distance > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "maxRayDistance must be positive, got {}",
                self.max_ray_distance
            )));
        }
        if !(self.fire_segment_length.is_finite() && self.fire_segment_length > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "fireSegmentLength must be positive, got {}",
                self.fire_segment_length
            )));
        }
        if self.max_fire_segments == 0 {
            return Err(EngineError::InvalidConfig(
                "maxFireSegments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, or defaults when the file doesn't exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Engine config saved");
        Ok(())
    }

    /// Bounce budget for a segment that enabled ricochet, honoring the global gate
    pub fn effective_bounces(&self, enabled: bool, max_bounces: Option<u32>) -> u32 {
        if !(self.allow_ricochet && enabled) {
            0
        } else {
            max_bounces.unwrap_or(self.max_ricochets)
        }
    }
}
