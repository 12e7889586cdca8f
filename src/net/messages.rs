//! Wire messages
//!
//! JSON objects tagged by `"type"`. `shotRecord` carries the authoritative
//! result; the other four form the optional progressive-preview stream.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::sim::obstacles::CollisionKind;
use crate::sim::shot::{SegmentRecord, ShotResult, flatten_hits, flatten_segments};

/// Segment as sent in the preview stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSegment {
    #[serde(with = "crate::serde_point")]
    pub start: DVec2,
    #[serde(with = "crate::serde_point")]
    pub end: DVec2,
    pub is_ricochet: bool,
    pub bounce_number: u32,
}

impl From<&SegmentRecord> for WireSegment {
    fn from(record: &SegmentRecord) -> Self {
        Self {
            start: record.ray.start,
            end: record.ray.end,
            is_ricochet: record.ricochet.is_ricochet,
            bounce_number: record.ricochet.bounce_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireMessage {
    #[serde(rename_all = "camelCase")]
    FireShot {
        shooter_ref: String,
        direction: f64,
        #[serde(with = "crate::serde_point")]
        source: DVec2,
        timestamp: u64,
        weapon_label: String,
    },
    #[serde(rename_all = "camelCase")]
    ShotSegment {
        shooter_ref: String,
        segment_index: u32,
        segment: WireSegment,
        ricochet_count: u32,
    },
    #[serde(rename_all = "camelCase")]
    ShotHit {
        shooter_ref: String,
        hit_kind: CollisionKind,
        #[serde(with = "crate::serde_point")]
        hit_point: DVec2,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_ref: Option<String>,
        distance: f64,
    },
    #[serde(rename_all = "camelCase")]
    ShotComplete {
        shooter_ref: String,
        total_segments: u32,
        total_hits: u32,
        segments: Vec<WireSegment>,
    },
    /// The complete result; the only message consumers may resolve hits from
    #[serde(rename_all = "camelCase")]
    ShotRecord { record: Box<ShotResult> },
}

impl WireMessage {
    pub fn shooter_ref(&self) -> &str {
        match self {
            WireMessage::FireShot { shooter_ref, .. }
            | WireMessage::ShotSegment { shooter_ref, .. }
            | WireMessage::ShotHit { shooter_ref, .. }
            | WireMessage::ShotComplete { shooter_ref, .. } => shooter_ref,
            WireMessage::ShotRecord { record } => record.shooter_ref(),
        }
    }

    /// True for the authoritative `shotRecord`
    pub fn is_authoritative(&self) -> bool {
        matches!(self, WireMessage::ShotRecord { .. })
    }

    pub fn record(result: &ShotResult) -> Self {
        WireMessage::ShotRecord {
            record: Box::new(result.clone()),
        }
    }
}

pub fn encode(message: &WireMessage) -> Result<String, EngineError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode(json: &str) -> Result<WireMessage, EngineError> {
    Ok(serde_json::from_str(json)?)
}

/// Preview stream for a finished shot: fire, segments, hits, complete
///
/// Segment indices are positions in the depth-first flattened tree, so they
/// stay unique across split shots.
pub fn preview_stream(result: &ShotResult) -> Vec<WireMessage> {
    let shooter_ref = result.shooter_ref().to_string();
    let segments = flatten_segments(result);
    let hits = flatten_hits(result);
    let mut messages = Vec::with_capacity(segments.len() + hits.len() + 2);

    messages.push(WireMessage::FireShot {
        shooter_ref: shooter_ref.clone(),
        direction: result.direction(),
        source: result.source(),
        timestamp: result.timestamp(),
        weapon_label: result.payload().name.clone(),
    });

    let mut ricochet_count = 0;
    for (index, record) in segments.iter().enumerate() {
        if record.ricochet.is_ricochet {
            ricochet_count += 1;
        }
        messages.push(WireMessage::ShotSegment {
            shooter_ref: shooter_ref.clone(),
            segment_index: index as u32,
            segment: WireSegment::from(*record),
            ricochet_count,
        });
    }

    for hit in &hits {
        let target_ref = match hit.collision.kind {
            CollisionKind::Body => Some(hit.collision.object_ref.clone()),
            CollisionKind::Barrier | CollisionKind::Area => None,
        };
        messages.push(WireMessage::ShotHit {
            shooter_ref: shooter_ref.clone(),
            hit_kind: hit.collision.kind,
            hit_point: hit.collision.point,
            target_ref,
            distance: hit.collision.distance,
        });
    }

    messages.push(WireMessage::ShotComplete {
        shooter_ref,
        total_segments: segments.len() as u32,
        total_hits: hits.len() as u32,
        segments: segments.iter().map(|s| WireSegment::from(*s)).collect(),
    });

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_shot_wire_shape() {
        let msg = WireMessage::FireShot {
            shooter_ref: "hero".to_string(),
            direction: 45.0,
            source: DVec2::new(1.0, 2.0),
            timestamp: 99,
            weapon_label: "Bolt".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&encode(&msg).unwrap()).unwrap();
        assert_eq!(value["type"], "fireShot");
        assert_eq!(value["shooterRef"], "hero");
        assert_eq!(value["weaponLabel"], "Bolt");
        assert_eq!(value["source"]["y"], 2.0);
    }

    #[test]
    fn test_hit_without_target_omits_field() {
        let msg = WireMessage::ShotHit {
            shooter_ref: "hero".to_string(),
            hit_kind: CollisionKind::Barrier,
            hit_point: DVec2::new(3.0, 4.0),
            target_ref: None,
            distance: 5.0,
        };
        let json = encode(&msg).unwrap();
        assert!(json.contains(r#""type":"shotHit""#));
        assert!(json.contains(r#""hitKind":"barrier""#));
        assert!(!json.contains("targetRef"));
        assert_eq!(decode(&json).unwrap(), msg);
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(decode(r#"{ "type": "shotTeleport", "shooterRef": "x" }"#).is_err());
    }
}
