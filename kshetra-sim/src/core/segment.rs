//! Line-segment obstacle features and intersection tests.
//!
//! All intersection tests use the cross-product determinant form:
//!
//! ```text
//! origin + t·dir = p1 + s·(p2 - p1)
//! t = cross(p1 - origin, seg) / cross(dir, seg)
//! s = cross(p1 - origin, dir) / cross(dir, seg)
//! ```
//!
//! A determinant that is zero relative to the segment length means the ray is
//! parallel (or collinear) and is reported as a miss.

use super::vector::Vec2;
use serde::{Deserialize, Serialize};

/// Relative tolerance for treating a ray and a segment as parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

/// One static obstacle edge from `p1` to `p2`.
///
/// Scenes reject degenerate segments (`p1 == p2`) at load time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegmentFeature {
    /// First endpoint
    pub p1: Vec2,
    /// Second endpoint
    pub p2: Vec2,
}

impl LineSegmentFeature {
    /// Create a segment from two endpoints
    #[inline]
    pub const fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    /// Create a segment from raw coordinates
    #[inline]
    pub const fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Vec2::new(x1, y1), Vec2::new(x2, y2))
    }

    /// Direction vector from `p1` to `p2` (not normalized)
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.p2.minus(self.p1)
    }

    /// Segment length
    #[inline]
    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    /// Midpoint
    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        self.p1.plus(self.p2).scale(0.5)
    }

    /// Endpoints coincide
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.p1 == self.p2
    }

    /// Parametric distance along a ray to this segment.
    ///
    /// `direction` should be a unit vector so that the returned `t` is a
    /// distance. Returns the non-negative `t` where the ray meets the
    /// segment, or `None` when the ray is parallel, points away, or passes
    /// outside the segment's endpoints.
    pub fn ray_intersection(&self, origin: Vec2, direction: Vec2) -> Option<f64> {
        let seg = self.direction();
        let denom = direction.cross(seg);

        let scale = direction.length() * seg.length();
        if denom.abs() <= PARALLEL_EPSILON * scale || scale == 0.0 {
            return None;
        }

        let origin_to_p1 = self.p1.minus(origin);
        let t = origin_to_p1.cross(seg) / denom;
        let s = origin_to_p1.cross(direction) / denom;

        if t >= 0.0 && (0.0..=1.0).contains(&s) {
            Some(t)
        } else {
            None
        }
    }

    /// Intersection point with another segment, if the two cross.
    ///
    /// Parallel and collinear segments report no intersection.
    pub fn intersection(&self, other: &LineSegmentFeature) -> Option<Vec2> {
        let d1 = self.direction();
        let d2 = other.direction();
        let denom = d1.cross(d2);

        let scale = d1.length() * d2.length();
        if denom.abs() <= PARALLEL_EPSILON * scale || scale == 0.0 {
            return None;
        }

        let diff = other.p1.minus(self.p1);
        let t = diff.cross(d2) / denom;
        let s = diff.cross(d1) / denom;

        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&s) {
            Some(self.p1.plus(d1.scale(t)))
        } else {
            None
        }
    }

    /// Crossing point of the infinite lines through both segments.
    ///
    /// Lines whose angle has a sine at or below `tolerance` count as parallel
    /// and report none.
    pub fn line_intersection(&self, other: &LineSegmentFeature, tolerance: f64) -> Option<Vec2> {
        let d1 = self.direction();
        let d2 = other.direction();
        let denom = d1.cross(d2);

        let scale = d1.length() * d2.length();
        if denom.abs() <= tolerance * scale || scale == 0.0 {
            return None;
        }

        let t = other.p1.minus(self.p1).cross(d2) / denom;
        Some(self.p1.plus(d1.scale(t)))
    }

    /// Perpendicular distance from `point` to the infinite line through the
    /// segment. Degenerate segments measure to `p1`.
    pub fn distance_to_line(&self, point: Vec2) -> f64 {
        let dir = self.direction();
        let len = dir.length();
        if len == 0.0 {
            return point.distance(self.p1);
        }
        dir.cross(point.minus(self.p1)).abs() / len
    }
}
