//! Geometry kernel
//!
//! Segment/segment and segment/rectangle intersection plus mirror reflection.
//! All floating-point tolerances used by the engine live here or in `consts`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{PARALLEL_TOLERANCE, RECT_CONTAINMENT_TOLERANCE};
use crate::{direction_to_vector, vector_to_direction};

/// Axis-aligned rectangle (top-left corner plus size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on a point
    pub fn centered(center: DVec2, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    #[inline]
    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> DVec2 {
        (self.min() + self.max()) * 0.5
    }
}

/// Intersection point of segments `a0→a1` and `b0→b1`
///
/// Parallel (or collinear) segments never intersect.
pub fn intersect_segments(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> Option<DVec2> {
    let r = a1 - a0;
    let s = b1 - b0;
    let det = r.perp_dot(s);
    if det.abs() < PARALLEL_TOLERANCE {
        return None;
    }

    let qp = b0 - a0;
    let t = qp.perp_dot(s) / det;
    let u = qp.perp_dot(r) / det;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    Some(a0 + r * t)
}

/// Entry point of segment `start→end` into `rect` (slab method)
///
/// The parametric window starts as [0, 1] and is narrowed per axis, so a
/// segment starting inside the rectangle reports its own start point.
pub fn intersect_segment_rect(start: DVec2, end: DVec2, rect: &Rect) -> Option<DVec2> {
    let d = end - start;
    let min = rect.min();
    let max = rect.max();

    let mut t_min: f64 = 0.0;
    let mut t_max: f64 = 1.0;

    for axis in 0..2 {
        let (origin, delta, lo, hi) = if axis == 0 {
            (start.x, d.x, min.x, max.x)
        } else {
            (start.y, d.y, min.y, max.y)
        };

        if delta.abs() < PARALLEL_TOLERANCE {
            // Parallel to this slab: must already be inside it
            if origin < lo - RECT_CONTAINMENT_TOLERANCE || origin > hi + RECT_CONTAINMENT_TOLERANCE
            {
                return None;
            }
            continue;
        }

        let mut t1 = (lo - origin) / delta;
        let mut t2 = (hi - origin) / delta;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }

    Some(start + d * t_min)
}

/// Unit normal of the edge `a→b` (edge rotated 90°)
///
/// Sign is arbitrary; `reflect` gives the same result for either.
#[inline]
pub fn barrier_normal(a: DVec2, b: DVec2) -> DVec2 {
    let edge = b - a;
    DVec2::new(-edge.y, edge.x).normalize_or_zero()
}

/// Mirror reflection: R = I - 2(I·N)N
#[inline]
pub fn reflect(incident: DVec2, normal: DVec2) -> DVec2 {
    let n = normal.normalize_or_zero();
    incident - 2.0 * incident.dot(n) * n
}

/// Direction (degrees) after bouncing off the edge `a→b`
pub fn reflect_direction(direction: f64, a: DVec2, b: DVec2) -> f64 {
    let reflected = reflect(direction_to_vector(direction), barrier_normal(a, b));
    vector_to_direction(reflected)
}

/// Point `length` px from `origin` along `direction` (degrees)
#[inline]
pub fn point_along(origin: DVec2, direction: f64, length: f64) -> DVec2 {
    origin + direction_to_vector(direction) * length
}
