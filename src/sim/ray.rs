//! A single straight ray cast during a shot

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::point_along;

/// One contiguous straight segment of a shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaySegment {
    #[serde(with = "crate::serde_point")]
    pub start: DVec2,
    #[serde(with = "crate::serde_point")]
    pub end: DVec2,
    /// Direction of travel in degrees
    pub direction: f64,
}

impl RaySegment {
    /// Ray of `length` px from `start` along `direction`
    pub fn cast(start: DVec2, direction: f64, length: f64) -> Self {
        Self {
            start,
            end: point_along(start, direction, length),
            direction,
        }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Same ray cut short at `point`
    pub fn truncated(&self, point: DVec2) -> Self {
        Self {
            start: self.start,
            end: point,
            direction: self.direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_length() {
        let ray = RaySegment::cast(DVec2::new(10.0, 10.0), 90.0, 40.0);
        assert!((ray.end - DVec2::new(10.0, 50.0)).length() < 1e-9);
        assert!((ray.length() - 40.0).abs() < 1e-9);
        let short = ray.truncated(DVec2::new(10.0, 20.0));
        assert!((short.length() - 10.0).abs() < 1e-9);
        assert_eq!(short.direction, 90.0);
    }
}
