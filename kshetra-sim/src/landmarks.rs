//! Line and landmark extraction from laser scans.
//!
//! [`RansacExtractor`] turns one scan into observed wall lines and point
//! landmarks:
//!
//! 1. Project hits into the world frame and split them into runs wherever a
//!    beam has no return or the range jumps by more than
//!    `discontinuity_threshold`.
//! 2. In each run, repeatedly fit the line with the most inliers by RANSAC.
//!    A line needs more than `min_inliers` points; its endpoints come from a
//!    total least squares fit over the inliers.
//! 3. Loose ends: at a range jump the nearer point is a landmark, and at a
//!    hit next to a no-return the hit is a landmark.
//! 4. Corners: each pair of non-parallel lines is intersected and the scan
//!    point nearest the crossing becomes a landmark when it lies within
//!    `intersection_margin` of the crossing and of both lines' extents.
//!
//! ```text
//!  scan ──▶ partition ──▶ RANSAC + TLS ──▶ lines ──▶ corners ─┐
//!    │                                                        ▼
//!    └────────────▶ loose ends ──────────────────────────▶ landmarks
//! ```

use crate::core::{LineSegmentFeature, Vec2, Vec3};
use crate::laser::{BeamReading, LaserScanData};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Sine of the angle below which two lines are treated as parallel
const LINE_PARALLEL_TOLERANCE: f64 = 1e-6;

/// RANSAC landmark extraction parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Candidate lines sampled per fitted line
    pub iterations: usize,

    /// Perpendicular distance for a point to support a line
    pub inlier_threshold: f64,

    /// A line needs strictly more inliers than this
    pub min_inliers: usize,

    /// Range jump between adjacent beams that separates surfaces
    pub discontinuity_threshold: f64,

    /// How far a corner landmark may lie from the line crossing
    pub intersection_margin: f64,

    /// Random seed for sampling (0 = random each run)
    pub seed: u64,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            inlier_threshold: 4.0,
            min_inliers: 15,
            discontinuity_threshold: 60.0,
            intersection_margin: 30.0,
            seed: 0,
        }
    }
}

impl LandmarkConfig {
    /// Builder-style setter for iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builder-style setter for inlier threshold.
    pub fn with_inlier_threshold(mut self, threshold: f64) -> Self {
        self.inlier_threshold = threshold;
        self
    }

    /// Builder-style setter for minimum inliers.
    pub fn with_min_inliers(mut self, min_inliers: usize) -> Self {
        self.min_inliers = min_inliers;
        self
    }

    /// Builder-style setter for random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("inlier_threshold", self.inlier_threshold),
            ("discontinuity_threshold", self.discontinuity_threshold),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{} must be positive, got {}", name, value));
            }
        }
        if !(self.intersection_margin.is_finite() && self.intersection_margin >= 0.0) {
            return Err(format!(
                "intersection_margin must be finite and non-negative, got {}",
                self.intersection_margin
            ));
        }
        Ok(())
    }
}

/// Lines and landmarks seen in one scan, in the world frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    /// Fitted wall lines
    pub lines: Vec<LineSegmentFeature>,
    /// Loose ends first, then corners; no duplicates
    pub landmarks: Vec<Vec2>,
}

/// Turns a laser scan into observed lines and landmarks.
pub trait LandmarkExtractor: Send {
    /// Extract from `scan`, taken by a robot at `pose`.
    fn extract(&mut self, scan: &LaserScanData, pose: Vec3) -> Observation;
}

/// RANSAC line fitting with loose-end and corner landmarks
#[derive(Debug, Clone)]
pub struct RansacExtractor {
    config: LandmarkConfig,
    rng: SmallRng,
}

impl RansacExtractor {
    /// Create an extractor; seed 0 draws from entropy.
    pub fn new(config: LandmarkConfig) -> Self {
        let rng = if config.seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(config.seed)
        };
        Self { config, rng }
    }

    /// Configuration in use
    pub fn config(&self) -> &LandmarkConfig {
        &self.config
    }

    /// Fit lines to an unordered point set.
    ///
    /// Returns the lines in the order found; each consumes its inliers.
    pub fn fit_lines(&mut self, points: &[Vec2]) -> Vec<LineSegmentFeature> {
        let mut lines = Vec::new();
        let mut remaining = points.to_vec();

        while remaining.len() >= self.config.min_inliers + 2 {
            let Some(line) = self.best_candidate(&remaining) else {
                break;
            };

            let threshold = self.config.inlier_threshold;
            let (inliers, outliers): (Vec<Vec2>, Vec<Vec2>) = remaining
                .iter()
                .copied()
                .partition(|&p| line.distance_to_line(p) < threshold);
            if inliers.len() <= self.config.min_inliers {
                break;
            }

            match fit_line(&inliers) {
                Some(fitted) => lines.push(fitted),
                None => break,
            }
            remaining = outliers;
        }

        lines
    }

    /// Sampled line with the most inliers, if any sample was usable
    fn best_candidate(&mut self, points: &[Vec2]) -> Option<LineSegmentFeature> {
        let n = points.len();
        if n < 2 {
            return None;
        }

        let mut best: Option<(LineSegmentFeature, usize)> = None;
        for _ in 0..self.config.iterations {
            let idx1 = self.rng.gen_range(0..n);
            let idx2 = self.rng.gen_range(0..n);
            if idx1 == idx2 || points[idx1] == points[idx2] {
                continue;
            }

            let candidate = LineSegmentFeature::new(points[idx1], points[idx2]);
            let count = points
                .iter()
                .filter(|&&p| candidate.distance_to_line(p) < self.config.inlier_threshold)
                .count();
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((candidate, count));
            }
        }

        best.map(|(line, _)| line)
    }

    /// Landmarks where pairs of lines cross near an observed point
    pub fn corner_landmarks(&self, lines: &[LineSegmentFeature], points: &[Vec2]) -> Vec<Vec2> {
        let margin = self.config.intersection_margin;
        let mut corners = Vec::new();

        for (i, l1) in lines.iter().enumerate() {
            for l2 in &lines[i + 1..] {
                let Some(crossing) = l1.line_intersection(l2, LINE_PARALLEL_TOLERANCE) else {
                    continue;
                };
                let nearest = points
                    .iter()
                    .copied()
                    .min_by(|a, b| a.distance(crossing).total_cmp(&b.distance(crossing)));
                if let Some(p) = nearest
                    && p.distance(crossing) < margin
                    && within_extent(p, l1, margin)
                    && within_extent(p, l2, margin)
                {
                    corners.push(p);
                }
            }
        }

        corners
    }
}

impl LandmarkExtractor for RansacExtractor {
    fn extract(&mut self, scan: &LaserScanData, pose: Vec3) -> Observation {
        let beam_points = scan.beam_points(pose);
        let readings = scan.readings();

        let mut lines = Vec::new();
        for run in partition(readings, &beam_points, self.config.discontinuity_threshold) {
            lines.extend(self.fit_lines(&run));
        }

        let mut landmarks = Vec::new();
        let loose = loose_ends(readings, &beam_points, self.config.discontinuity_threshold);
        let hits: Vec<Vec2> = beam_points.iter().flatten().copied().collect();
        for p in loose
            .into_iter()
            .chain(self.corner_landmarks(&lines, &hits))
        {
            if !landmarks.contains(&p) {
                landmarks.push(p);
            }
        }

        log::debug!(
            "Extracted {} lines and {} landmarks from {} hits",
            lines.len(),
            landmarks.len(),
            hits.len()
        );
        Observation { lines, landmarks }
    }
}

/// Runs of consecutive hits with no range jump above `threshold`
fn partition(readings: &[BeamReading], points: &[Option<Vec2>], threshold: f64) -> Vec<Vec<Vec2>> {
    let mut runs = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    let mut last_range: Option<f64> = None;

    for (reading, point) in readings.iter().zip(points) {
        match (reading.distance(), point) {
            (Some(range), Some(p)) => {
                if last_range.is_some_and(|last| (range - last).abs() > threshold) {
                    runs.push(std::mem::take(&mut current));
                }
                current.push(*p);
                last_range = Some(range);
            }
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                last_range = None;
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Surface ends: the nearer side of a range jump, or a hit beside a no-return
fn loose_ends(readings: &[BeamReading], points: &[Option<Vec2>], threshold: f64) -> Vec<Vec2> {
    let mut ends = Vec::new();

    for i in 1..readings.len().min(points.len()) {
        let end = match (readings[i - 1].distance(), readings[i].distance()) {
            (Some(prev), Some(cur)) if cur - prev > threshold => points[i - 1],
            (Some(prev), Some(cur)) if prev - cur > threshold => points[i],
            (Some(_), None) => points[i - 1],
            (None, Some(_)) => points[i],
            _ => None,
        };
        ends.extend(end);
    }

    ends
}

/// Point inside the segment's bounding box grown by `margin`
fn within_extent(p: Vec2, line: &LineSegmentFeature, margin: f64) -> bool {
    let (min_x, max_x) = (line.p1.x.min(line.p2.x), line.p1.x.max(line.p2.x));
    let (min_y, max_y) = (line.p1.y.min(line.p2.y), line.p1.y.max(line.p2.y));
    p.x > min_x - margin && p.x < max_x + margin && p.y > min_y - margin && p.y < max_y + margin
}

/// Total least squares fit, endpoints at the extent of `points` along the
/// principal direction.
pub fn fit_line(points: &[Vec2]) -> Option<LineSegmentFeature> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let centroid = points
        .iter()
        .fold(Vec2::zero(), |acc, &p| acc.plus(p))
        .scale(1.0 / n);

    let (mut cxx, mut cyy, mut cxy) = (0.0, 0.0, 0.0);
    for p in points {
        let d = p.minus(centroid);
        cxx += d.x * d.x;
        cyy += d.y * d.y;
        cxy += d.x * d.y;
    }

    if cxx + cyy <= f64::EPSILON {
        return None;
    }

    let direction = Vec2::from_angle(0.5 * (2.0 * cxy).atan2(cxx - cyy));

    let (mut t_min, mut t_max) = (f64::MAX, f64::MIN);
    for p in points {
        let t = p.minus(centroid).dot(direction);
        t_min = t_min.min(t);
        t_max = t_max.max(t);
    }

    Some(LineSegmentFeature::new(
        centroid.plus(direction.scale(t_min)),
        centroid.plus(direction.scale(t_max)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laser::LaserModel;
    use crate::scene::{LaserGeometry, RobotGeometry, Scene};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn scan_of(segments: Vec<LineSegmentFeature>, pose: Vec3) -> LaserScanData {
        let laser = LaserGeometry::new(181, -FRAC_PI_2, FRAC_PI_2, 500.0).with_mount_offset(0.0);
        let scene = Scene::new(segments, RobotGeometry::default(), laser).unwrap();
        LaserModel::new().scan(pose, &scene)
    }

    fn room() -> Vec<LineSegmentFeature> {
        vec![
            LineSegmentFeature::from_coords(-100.0, -100.0, 100.0, -100.0),
            LineSegmentFeature::from_coords(100.0, -100.0, 100.0, 100.0),
            LineSegmentFeature::from_coords(100.0, 100.0, -100.0, 100.0),
            LineSegmentFeature::from_coords(-100.0, 100.0, -100.0, -100.0),
        ]
    }

    fn extractor() -> RansacExtractor {
        RansacExtractor::new(LandmarkConfig::default().with_seed(42))
    }

    fn near(points: &[Vec2], target: Vec2, tolerance: f64) -> bool {
        points.iter().any(|p| p.distance(target) <= tolerance)
    }

    #[test]
    fn test_fit_line_horizontal() {
        let points: Vec<Vec2> = (0..10)
            .map(|i| Vec2::new(i as f64, if i % 2 == 0 { 0.1 } else { -0.1 }))
            .collect();
        let line = fit_line(&points).unwrap();
        assert!(line.direction().normalized().y.abs() < 0.01);
        assert_relative_eq!(line.length(), 9.0, epsilon = 0.01);
    }

    #[test]
    fn test_fit_line_degenerate() {
        assert!(fit_line(&[Vec2::new(1.0, 1.0)]).is_none());
        assert!(fit_line(&[Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)]).is_none());
    }

    #[test]
    fn test_room_corners() {
        let scan = scan_of(room(), Vec3::zero());
        let obs = extractor().extract(&scan, Vec3::zero());

        assert_eq!(obs.lines.len(), 3);
        assert_eq!(obs.landmarks.len(), 2);
        assert!(near(&obs.landmarks, Vec2::new(100.0, 100.0), 1.0));
        assert!(near(&obs.landmarks, Vec2::new(100.0, -100.0), 1.0));
    }

    #[test]
    fn test_room_corners_from_moved_robot() {
        let pose = Vec3::new(-20.0, 10.0, FRAC_PI_2);
        let scan = scan_of(room(), pose);
        let obs = extractor().extract(&scan, pose);

        // Nearest beams land within a couple of units of each corner
        assert!(near(&obs.landmarks, Vec2::new(100.0, 100.0), 2.0));
        assert!(near(&obs.landmarks, Vec2::new(-100.0, 100.0), 2.0));
        for line in &obs.lines {
            let mid = line.midpoint();
            assert!(mid.x.abs() > 95.0 || mid.y.abs() > 95.0);
        }
    }

    #[test]
    fn test_partial_wall_loose_ends() {
        let wall = LineSegmentFeature::from_coords(50.0, -20.0, 50.0, 20.0);
        let scan = scan_of(vec![wall], Vec3::zero());
        let obs = extractor().extract(&scan, Vec3::zero());

        assert_eq!(obs.lines.len(), 1);
        assert_eq!(obs.landmarks.len(), 2);
        for p in &obs.landmarks {
            assert_relative_eq!(p.x, 50.0, epsilon = 1e-9);
            assert!(p.y.abs() > 18.0 && p.y.abs() <= 20.0);
        }
    }

    #[test]
    fn test_range_jump_marks_near_side() {
        let near_wall = LineSegmentFeature::from_coords(30.0, -10.0, 30.0, 10.0);
        let far_wall = LineSegmentFeature::from_coords(150.0, -100.0, 150.0, 100.0);
        let scan = scan_of(vec![near_wall, far_wall], Vec3::zero());
        let obs = extractor().extract(&scan, Vec3::zero());

        // Both ends of the near wall, both ends of the visible far wall
        assert_eq!(obs.landmarks.len(), 4);
        let near_ends = obs
            .landmarks
            .iter()
            .filter(|p| (p.x - 30.0).abs() < 1e-9)
            .count();
        assert_eq!(near_ends, 2);
    }

    #[test]
    fn test_parallel_lines_have_no_corner() {
        let lines = [
            LineSegmentFeature::from_coords(0.0, 0.0, 100.0, 0.0),
            LineSegmentFeature::from_coords(0.0, 10.0, 100.0, 10.0 + 1e-6),
        ];
        let points = [Vec2::new(50.0, 0.0), Vec2::new(50.0, 10.0)];
        assert!(extractor().corner_landmarks(&lines, &points).is_empty());
    }

    #[test]
    fn test_corner_needs_nearby_point() {
        let lines = [
            LineSegmentFeature::from_coords(0.0, 0.0, 50.0, 0.0),
            LineSegmentFeature::from_coords(60.0, 10.0, 60.0, 50.0),
        ];
        let far = [Vec2::new(0.0, 0.0), Vec2::new(60.0, 50.0)];
        assert!(extractor().corner_landmarks(&lines, &far).is_empty());

        let close = [Vec2::new(58.0, 1.0)];
        assert_eq!(extractor().corner_landmarks(&lines, &close), close.to_vec());
    }

    #[test]
    fn test_too_few_points_for_a_line() {
        let points: Vec<Vec2> = (0..16).map(|i| Vec2::new(i as f64, 0.0)).collect();
        assert!(extractor().fit_lines(&points).is_empty());

        let points: Vec<Vec2> = (0..17).map(|i| Vec2::new(i as f64, 0.0)).collect();
        assert_eq!(extractor().fit_lines(&points).len(), 1);
    }

    #[test]
    fn test_empty_scan() {
        let scan = LaserScanData::empty(LaserGeometry::default());
        assert_eq!(extractor().extract(&scan, Vec3::zero()), Observation::default());
    }

    #[test]
    fn test_same_seed_same_observation() {
        let pose = Vec3::new(5.0, -5.0, 0.3);
        let scan = scan_of(room(), pose);
        assert_eq!(
            extractor().extract(&scan, pose),
            extractor().extract(&scan, pose)
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(LandmarkConfig::default().validate().is_ok());
        assert!(
            LandmarkConfig::default()
                .with_inlier_threshold(0.0)
                .validate()
                .is_err()
        );
        let config = LandmarkConfig {
            intersection_margin: f64::NAN,
            ..LandmarkConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
