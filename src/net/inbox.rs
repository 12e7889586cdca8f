//! Replica-side message intake
//!
//! Messages may arrive in any order, twice, or not at all. Authoritative
//! records are stored by shot id. Preview messages are assembled per shooter
//! purely for animation; nothing here resolves hits from them.

use std::collections::BTreeMap;

use glam::DVec2;

use super::messages::{WireMessage, WireSegment, decode};
use crate::error::EngineError;
use crate::sim::obstacles::CollisionKind;
use crate::sim::shot::ShotResult;

/// Visual hit marker from the preview stream
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewHit {
    pub kind: CollisionKind,
    pub point: DVec2,
    pub target_ref: Option<String>,
}

/// Partially received preview of one shooter's latest shot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preview {
    /// Fire timestamp, once `fireShot` has arrived
    pub timestamp: Option<u64>,
    pub weapon_label: Option<String>,
    pub source: Option<DVec2>,
    pub direction: Option<f64>,
    pub segments: BTreeMap<u32, WireSegment>,
    pub hits: Vec<PreviewHit>,
    /// Set once `shotComplete` arrives
    pub expected_segments: Option<u32>,
}

impl Preview {
    pub fn is_complete(&self) -> bool {
        self.expected_segments
            .is_some_and(|n| self.segments.len() as u32 >= n)
    }

    /// Segments in index order (gaps skipped)
    pub fn ordered_segments(&self) -> impl Iterator<Item = &WireSegment> {
        self.segments.values()
    }

    /// Indices announced by `shotComplete` but never received
    pub fn missing_indices(&self) -> Vec<u32> {
        let Some(expected) = self.expected_segments else {
            return Vec::new();
        };
        (0..expected)
            .filter(|i| !self.segments.contains_key(i))
            .collect()
    }
}

/// What `ShotInbox::receive` did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    RecordStored(String),
    DuplicateRecord(String),
    PreviewUpdated(String),
}

#[derive(Debug, Default)]
pub struct ShotInbox {
    records: BTreeMap<String, ShotResult>,
    previews: BTreeMap<String, Preview>,
}

impl ShotInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and receive one raw payload
    pub fn receive_json(&mut self, json: &str) -> Result<Received, EngineError> {
        Ok(self.receive(decode(json)?))
    }

    pub fn receive(&mut self, message: WireMessage) -> Received {
        match message {
            WireMessage::ShotRecord { record } => {
                let id = record.id().to_string();
                if self.records.contains_key(&id) {
                    log::debug!("Ignoring duplicate record {}", id);
                    return Received::DuplicateRecord(id);
                }
                log::debug!("Stored record {} from {}", id, record.shooter_ref());
                self.records.insert(id.clone(), *record);
                Received::RecordStored(id)
            }
            WireMessage::FireShot {
                shooter_ref,
                direction,
                source,
                timestamp,
                weapon_label,
            } => {
                // Segments may already be here if fireShot arrived late;
                // only a different shot from the same shooter resets the preview
                let preview = self.previews.entry(shooter_ref.clone()).or_default();
                if preview.timestamp.is_some_and(|t| t != timestamp) {
                    *preview = Preview::default();
                }
                preview.timestamp = Some(timestamp);
                preview.weapon_label = Some(weapon_label);
                preview.source = Some(source);
                preview.direction = Some(direction);
                Received::PreviewUpdated(shooter_ref)
            }
            WireMessage::ShotSegment {
                shooter_ref,
                segment_index,
                segment,
                ..
            } => {
                self.previews
                    .entry(shooter_ref.clone())
                    .or_default()
                    .segments
                    .entry(segment_index)
                    .or_insert(segment);
                Received::PreviewUpdated(shooter_ref)
            }
            WireMessage::ShotHit {
                shooter_ref,
                hit_kind,
                hit_point,
                target_ref,
                ..
            } => {
                let hit = PreviewHit {
                    kind: hit_kind,
                    point: hit_point,
                    target_ref,
                };
                let hits = &mut self.previews.entry(shooter_ref.clone()).or_default().hits;
                if !hits.contains(&hit) {
                    hits.push(hit);
                }
                Received::PreviewUpdated(shooter_ref)
            }
            WireMessage::ShotComplete {
                shooter_ref,
                total_segments,
                segments,
                ..
            } => {
                let preview = self.previews.entry(shooter_ref.clone()).or_default();
                for (index, segment) in segments.into_iter().enumerate() {
                    preview.segments.entry(index as u32).or_insert(segment);
                }
                preview.expected_segments = Some(total_segments);
                Received::PreviewUpdated(shooter_ref)
            }
        }
    }

    pub fn record(&self, id: &str) -> Option<&ShotResult> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ShotResult> {
        self.records.values()
    }

    pub fn preview(&self, shooter_ref: &str) -> Option<&Preview> {
        self.previews.get(shooter_ref)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::net::messages::{encode, preview_stream};
    use crate::sim::geometry::Rect;
    use crate::sim::{BallisticExecutor, FireRequest, ObstacleSnapshot, Payload, SegmentSpec};

    fn shot() -> ShotResult {
        let scene = ObstacleSnapshot::new().with_body("orc", Rect::new(130.0, -10.0, 20.0, 20.0));
        let exec = BallisticExecutor::builder()
            .obstacles(Arc::new(scene))
            .build()
            .unwrap();
        let payload = Payload::new("Seeker", vec![SegmentSpec::line_until_collision(40.0, 10)]);
        exec.fire(FireRequest::new(DVec2::ZERO, 0.0, payload, "hero").with_seed(9))
    }

    #[test]
    fn test_duplicate_record_ignored() {
        let result = shot();
        let mut inbox = ShotInbox::new();
        let json = encode(&WireMessage::record(&result)).unwrap();
        assert_eq!(
            inbox.receive_json(&json).unwrap(),
            Received::RecordStored(result.id().to_string())
        );
        assert_eq!(
            inbox.receive_json(&json).unwrap(),
            Received::DuplicateRecord(result.id().to_string())
        );
        assert_eq!(inbox.records().count(), 1);
        assert_eq!(inbox.record(result.id()), Some(&result));
    }

    #[test]
    fn test_preview_out_of_order() {
        let result = shot();
        let mut stream = preview_stream(&result);
        stream.reverse();
        let mut inbox = ShotInbox::new();
        for message in stream {
            inbox.receive(message);
        }
        let preview = inbox.preview("hero").unwrap();
        assert_eq!(preview.segments.len(), 4);
        assert!(preview.is_complete());
        assert_eq!(preview.hits.len(), 1);
        assert_eq!(preview.hits[0].target_ref.as_deref(), Some("orc"));
        assert_eq!(preview.weapon_label.as_deref(), Some("Seeker"));
    }

    #[test]
    fn test_duplicated_stream_shows_one_marker_per_hit() {
        let result = shot();
        let stream = preview_stream(&result);
        let mut inbox = ShotInbox::new();
        for message in stream.iter().chain(stream.iter()) {
            inbox.receive(message.clone());
        }
        let preview = inbox.preview("hero").unwrap();
        assert_eq!(preview.segments.len(), 4);
        assert_eq!(preview.hits.len(), 1);
    }

    #[test]
    fn test_new_shot_resets_preview() {
        let result = shot();
        let mut inbox = ShotInbox::new();
        for message in preview_stream(&result) {
            inbox.receive(message);
        }
        inbox.receive(WireMessage::FireShot {
            shooter_ref: "hero".to_string(),
            direction: 90.0,
            source: DVec2::ZERO,
            timestamp: result.timestamp() + 1000,
            weapon_label: "Bolt".to_string(),
        });
        let preview = inbox.preview("hero").unwrap();
        assert!(preview.segments.is_empty());
        assert_eq!(preview.weapon_label.as_deref(), Some("Bolt"));
    }

    #[test]
    fn test_lost_segments_filled_by_complete() {
        let result = shot();
        let stream: Vec<WireMessage> = preview_stream(&result)
            .into_iter()
            .filter(|m| !matches!(m, WireMessage::ShotSegment { segment_index: 1 | 2, .. }))
            .collect();
        let mut inbox = ShotInbox::new();
        for message in stream {
            inbox.receive(message);
        }
        let preview = inbox.preview("hero").unwrap();
        assert!(preview.missing_indices().is_empty());
        assert_eq!(preview.ordered_segments().count(), 4);
    }

    #[test]
    fn test_partial_preview_reports_gaps() {
        let result = shot();
        let stream: Vec<WireMessage> = preview_stream(&result)
            .into_iter()
            .filter(|m| !matches!(m, WireMessage::ShotSegment { segment_index: 2, .. }))
            .collect();
        let mut inbox = ShotInbox::new();
        // Drop the final shotComplete too
        for message in stream.into_iter().filter(|m| !matches!(m, WireMessage::ShotComplete { .. })) {
            inbox.receive(message);
        }
        let preview = inbox.preview("hero").unwrap();
        assert!(!preview.is_complete());
        assert_eq!(preview.segments.len(), 3);
        assert!(preview.missing_indices().is_empty());
        assert!(!preview.segments.contains_key(&2));
    }
}
