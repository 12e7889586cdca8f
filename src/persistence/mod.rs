//! Stored shot records
//!
//! A finished `ShotResult` is wrapped in a versioned JSON envelope together
//! with free-form metadata (speaker, scene, ...). Stores treat the whole
//! thing as opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::sim::shot::ShotResult;

/// Envelope format version written by this build
pub const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotEnvelope {
    pub version: u32,
    /// Unix ms when the envelope was written
    pub saved_at: u64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub shot: ShotResult,
}

impl ShotEnvelope {
    pub fn new(shot: ShotResult, saved_at: u64) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            saved_at,
            metadata: Map::new(),
            shot,
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn shot_id(&self) -> &str {
        self.shot.id()
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an envelope, rejecting versions this build can't read
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let envelope: Self = serde_json::from_str(json)?;
        envelope.check_version()?;
        Ok(envelope)
    }

    pub(crate) fn check_version(&self) -> Result<(), EngineError> {
        if self.version != ENVELOPE_VERSION {
            return Err(EngineError::UnsupportedVersion {
                found: self.version,
                expected: ENVELOPE_VERSION,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::DVec2;

    use super::*;
    use crate::sim::{BallisticExecutor, FireRequest, ObstacleSnapshot, Payload, SegmentSpec};

    fn shot() -> ShotResult {
        let exec = BallisticExecutor::builder()
            .obstacles(Arc::new(ObstacleSnapshot::new()))
            .build()
            .unwrap();
        exec.fire(FireRequest::new(
            DVec2::new(5.0, 5.0),
            30.0,
            Payload::new("Bolt", vec![SegmentSpec::line(75.0)]),
            "hero",
        ))
    }

    #[test]
    fn test_envelope_roundtrip_with_metadata() {
        let envelope = ShotEnvelope::new(shot(), 1234).with_meta("speaker", "Aria");
        let json = envelope.to_json().unwrap();
        let back = ShotEnvelope::from_json_str(&json).unwrap();
        assert_eq!(back, envelope);
        assert_eq!(back.metadata["speaker"], "Aria");
    }

    #[test]
    fn test_future_version_rejected() {
        let mut envelope = ShotEnvelope::new(shot(), 1);
        envelope.version = ENVELOPE_VERSION + 1;
        let json = serde_json::to_string(&envelope).unwrap();
        let err = ShotEnvelope::from_json_str(&json).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedVersion { .. }));
    }
}
