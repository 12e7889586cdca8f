//! Replaying finished shots
//!
//! Replay reads only the `ShotResult`; the scene is never queried again.
//! Pacing is returned as per-frame delays so the caller can animate with
//! whatever non-blocking timer it already has.

use crate::sim::shot::{HitRecord, SegmentRecord, ShotResult};

/// Drawing surface consumed by replay
pub trait Renderer {
    /// Called once per shot in the tree before its segments
    fn begin_shot(&mut self, _shot: &ShotResult) {}
    fn draw_segment(&mut self, shot: &ShotResult, segment: &SegmentRecord);
    fn draw_hit(&mut self, shot: &ShotResult, hit: &HitRecord);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplayEvent<'a> {
    BeginShot,
    Segment(&'a SegmentRecord),
    Hit(&'a HitRecord),
}

/// One replay step and how long to wait before showing it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayFrame<'a> {
    pub delay_ms: u64,
    pub shot: &'a ShotResult,
    pub event: ReplayEvent<'a>,
}

/// Ordered replay frames for a whole shot tree
///
/// Depth-first like `flatten_segments`; each hit follows the segment it
/// belongs to.
#[derive(Debug, Clone)]
pub struct ReplaySchedule<'a> {
    frames: Vec<ReplayFrame<'a>>,
}

impl<'a> ReplaySchedule<'a> {
    pub fn new(result: &'a ShotResult, step_delay_ms: u64) -> Self {
        let mut frames = Vec::new();
        let mut first_segment = true;

        for shot in result.iter_shots() {
            frames.push(ReplayFrame {
                delay_ms: 0,
                shot,
                event: ReplayEvent::BeginShot,
            });
            for segment in shot.segments() {
                frames.push(ReplayFrame {
                    delay_ms: if first_segment { 0 } else { step_delay_ms },
                    shot,
                    event: ReplayEvent::Segment(segment),
                });
                first_segment = false;
                frames.extend(
                    shot.hits()
                        .iter()
                        .filter(|h| h.segment_index == segment.segment_index)
                        .map(|hit| ReplayFrame {
                            delay_ms: 0,
                            shot,
                            event: ReplayEvent::Hit(hit),
                        }),
                );
            }
        }

        Self { frames }
    }

    pub fn frames(&self) -> &[ReplayFrame<'a>] {
        &self.frames
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| f.delay_ms).sum()
    }

    /// Push every frame into `renderer`, ignoring delays
    pub fn play_into(&self, renderer: &mut dyn Renderer) {
        for frame in &self.frames {
            match frame.event {
                ReplayEvent::BeginShot => renderer.begin_shot(frame.shot),
                ReplayEvent::Segment(segment) => renderer.draw_segment(frame.shot, segment),
                ReplayEvent::Hit(hit) => renderer.draw_hit(frame.shot, hit),
            }
        }
    }
}

/// Draw a whole shot tree at once
pub fn replay(result: &ShotResult, renderer: &mut dyn Renderer) {
    ReplaySchedule::new(result, 0).play_into(renderer);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use glam::DVec2;

    use super::*;
    use crate::sim::{
        BallisticExecutor, Collision, FireRequest, ObstacleQuery, ObstacleSnapshot, Payload,
        RaySegment, SegmentSpec, flatten_hits, flatten_segments,
    };

    struct CountingQuery {
        inner: ObstacleSnapshot,
        calls: AtomicUsize,
    }

    impl ObstacleQuery for CountingQuery {
        fn query_collisions(&self, ray: &RaySegment) -> Vec<Collision> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.query_collisions(ray)
        }
    }

    #[derive(Default)]
    struct Recorder {
        shots: usize,
        segments: Vec<u32>,
        hits: usize,
    }

    impl Renderer for Recorder {
        fn begin_shot(&mut self, _shot: &ShotResult) {
            self.shots += 1;
        }

        fn draw_segment(&mut self, _shot: &ShotResult, segment: &SegmentRecord) {
            self.segments.push(segment.segment_index);
        }

        fn draw_hit(&mut self, _shot: &ShotResult, _hit: &HitRecord) {
            self.hits += 1;
        }
    }

    fn fired() -> (Arc<CountingQuery>, ShotResult) {
        let query = Arc::new(CountingQuery {
            inner: ObstacleSnapshot::new().with_barrier("wall", DVec2::new(60.0, -80.0), DVec2::new(60.0, 80.0)),
            calls: AtomicUsize::new(0),
        });
        let exec = BallisticExecutor::builder()
            .obstacles(query.clone())
            .build()
            .unwrap();
        let payload = Payload::new(
            "Fork",
            vec![SegmentSpec::line(100.0).with_ricochet(1).with_child(-30.0, 20.0).with_child(30.0, 20.0)],
        );
        let result = exec.fire(FireRequest::new(DVec2::ZERO, 0.0, payload, "hero").with_seed(11));
        (query, result)
    }

    #[test]
    fn test_replay_from_json_never_queries() {
        let (query, result) = fired();
        let calls = query.calls.load(Ordering::SeqCst);

        let stored = result.to_json().unwrap();
        let restored = ShotResult::from_json_str(&stored).unwrap();
        assert_eq!(restored, result);

        let mut recorder = Recorder::default();
        replay(&restored, &mut recorder);
        assert_eq!(query.calls.load(Ordering::SeqCst), calls);
        assert_eq!(recorder.shots, 3);
        assert_eq!(recorder.segments.len(), flatten_segments(&result).len());
        assert_eq!(recorder.hits, flatten_hits(&result).len());
    }

    #[test]
    fn test_schedule_pacing() {
        let (_, result) = fired();
        let schedule = ReplaySchedule::new(&result, 40);
        let segments = flatten_segments(&result).len() as u64;
        assert_eq!(schedule.total_duration_ms(), (segments - 1) * 40);

        // Hit frames come straight after their segment
        let frames = schedule.frames();
        for (i, frame) in frames.iter().enumerate() {
            if let ReplayEvent::Hit(hit) = frame.event {
                match frames[i - 1].event {
                    ReplayEvent::Segment(seg) => assert_eq!(seg.segment_index, hit.segment_index),
                    ReplayEvent::Hit(prev) => assert_eq!(prev.segment_index, hit.segment_index),
                    ReplayEvent::BeginShot => panic!("hit before any segment"),
                }
                assert_eq!(frame.delay_ms, 0);
            }
        }
    }
}
