//! Obstacle query seam and the in-memory scene snapshot
//!
//! The executor only ever talks to `ObstacleQuery`. `ObstacleSnapshot` is a
//! read-only reference implementation: token-like bodies and areas as
//! rectangles, walls as line edges.

use std::cmp::Ordering;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Rect, barrier_normal, intersect_segment_rect, intersect_segments};
use super::ray::RaySegment;

/// Kind of obstacle a ray ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionKind {
    /// Blocking mobile entity
    Body,
    /// Blocking line edge (the only kind a shot can ricochet off)
    Barrier,
    /// Blocking region
    Area,
}

impl CollisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionKind::Body => "body",
            CollisionKind::Barrier => "barrier",
            CollisionKind::Area => "area",
        }
    }
}

/// Endpoints of a barrier edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(with = "crate::serde_point")]
    pub a: DVec2,
    #[serde(with = "crate::serde_point")]
    pub b: DVec2,
}

impl Edge {
    pub fn normal(&self) -> DVec2 {
        barrier_normal(self.a, self.b)
    }
}

/// One obstacle crossed by a ray
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collision {
    pub kind: CollisionKind,
    #[serde(with = "crate::serde_point")]
    pub point: DVec2,
    /// Distance from the ray's start to `point`
    pub distance: f64,
    pub object_ref: String,
    /// Blocking edge, present for barriers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<Edge>,
}

/// Ascending by distance; ties broken by kind then object ref so the order is total
pub fn sort_collisions(collisions: &mut [Collision]) {
    collisions.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
            .then(a.kind.cmp(&b.kind))
            .then_with(|| a.object_ref.cmp(&b.object_ref))
    });
}

/// Scene lookup consumed by the executor
///
/// Implementations must return collisions sorted ascending by distance and may
/// return an empty list for a clean miss.
pub trait ObstacleQuery {
    fn query_collisions(&self, ray: &RaySegment) -> Vec<Collision>;
}

/// A blocking entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: String,
    pub rect: Rect,
}

/// A blocking wall edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barrier {
    pub id: String,
    #[serde(with = "crate::serde_point")]
    pub a: DVec2,
    #[serde(with = "crate::serde_point")]
    pub b: DVec2,
}

/// A blocking region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub rect: Rect,
}

/// Immutable obstacle set for one or more shots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    #[serde(default)]
    pub bodies: Vec<Body>,
    #[serde(default)]
    pub barriers: Vec<Barrier>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

impl ObstacleSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, id: impl Into<String>, rect: Rect) -> Self {
        self.bodies.push(Body { id: id.into(), rect });
        self
    }

    pub fn with_barrier(mut self, id: impl Into<String>, a: DVec2, b: DVec2) -> Self {
        self.barriers.push(Barrier { id: id.into(), a, b });
        self
    }

    pub fn with_area(mut self, id: impl Into<String>, rect: Rect) -> Self {
        self.areas.push(Area { id: id.into(), rect });
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, crate::EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.barriers.is_empty() && self.areas.is_empty()
    }
}

impl ObstacleQuery for ObstacleSnapshot {
    fn query_collisions(&self, ray: &RaySegment) -> Vec<Collision> {
        let mut hits = Vec::new();

        for body in &self.bodies {
            if let Some(point) = intersect_segment_rect(ray.start, ray.end, &body.rect) {
                hits.push(Collision {
                    kind: CollisionKind::Body,
                    point,
                    distance: ray.start.distance(point),
                    object_ref: body.id.clone(),
                    edge: None,
                });
            }
        }

        for barrier in &self.barriers {
            if let Some(point) = intersect_segments(ray.start, ray.end, barrier.a, barrier.b) {
                hits.push(Collision {
                    kind: CollisionKind::Barrier,
                    point,
                    distance: ray.start.distance(point),
                    object_ref: barrier.id.clone(),
                    edge: Some(Edge {
                        a: barrier.a,
                        b: barrier.b,
                    }),
                });
            }
        }

        for area in &self.areas {
            if let Some(point) = intersect_segment_rect(ray.start, ray.end, &area.rect) {
                hits.push(Collision {
                    kind: CollisionKind::Area,
                    point,
                    distance: ray.start.distance(point),
                    object_ref: area.id.clone(),
                    edge: None,
                });
            }
        }

        sort_collisions(&mut hits);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> ObstacleSnapshot {
        ObstacleSnapshot::new()
            .with_body("goblin", Rect::centered(DVec2::new(300.0, 0.0), 40.0, 40.0))
            .with_barrier("wall", DVec2::new(100.0, -50.0), DVec2::new(100.0, 50.0))
            .with_area("pit", Rect::new(200.0, -20.0, 20.0, 40.0))
    }

    #[test]
    fn test_query_sorted_by_distance() {
        let ray = RaySegment::cast(DVec2::ZERO, 0.0, 400.0);
        let hits = scene().query_collisions(&ray);
        let kinds: Vec<_> = hits.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![CollisionKind::Barrier, CollisionKind::Area, CollisionKind::Body]
        );
        assert!((hits[0].distance - 100.0).abs() < 1e-9);
        assert!((hits[1].distance - 200.0).abs() < 1e-9);
        assert!((hits[2].distance - 280.0).abs() < 1e-9);
        assert!(hits[0].edge.is_some());
        assert!(hits[2].edge.is_none());
    }

    #[test]
    fn test_query_clean_miss() {
        let ray = RaySegment::cast(DVec2::ZERO, 180.0, 400.0);
        assert!(scene().query_collisions(&ray).is_empty());
    }

    #[test]
    fn test_tie_break_is_stable() {
        let mut hits = vec![
            Collision {
                kind: CollisionKind::Area,
                point: DVec2::ZERO,
                distance: 5.0,
                object_ref: "b".into(),
                edge: None,
            },
            Collision {
                kind: CollisionKind::Body,
                point: DVec2::ZERO,
                distance: 5.0,
                object_ref: "z".into(),
                edge: None,
            },
        ];
        sort_collisions(&mut hits);
        assert_eq!(hits[0].kind, CollisionKind::Body);
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "bodies": [{ "id": "t1", "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } }],
            "barriers": [{ "id": "w1", "a": { "x": 0, "y": 0 }, "b": { "x": 5, "y": 5 } }]
        }"#;
        let snapshot = ObstacleSnapshot::from_json_str(json).unwrap();
        assert_eq!(snapshot.bodies.len(), 1);
        assert_eq!(snapshot.barriers.len(), 1);
        assert!(snapshot.areas.is_empty());
    }
}
