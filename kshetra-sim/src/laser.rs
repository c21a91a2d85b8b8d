//! Laser range finder simulation by ray-casting against scene segments.
//!
//! For each beam of the fan a ray is cast from the laser origin (robot
//! position plus the mount offset along the heading) and the nearest
//! intersection over all segments is recorded. Cost is
//! O(beams × segments) per scan.
//!
//! Readings are kept as [`BeamReading`] internally; the sentinel-float form
//! only appears through [`LaserScanData::lengths`].

use crate::config::LaserNoiseConfig;
use crate::core::{LineSegmentFeature, Vec2, Vec3};
use crate::noise::{NoNoise, NoiseGenerator, NoiseModel};
use crate::scene::{LaserGeometry, Scene};

/// One beam's measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeamReading {
    /// Obstacle at this range
    Hit(f64),
    /// Nothing within max range
    NoReturn,
}

impl BeamReading {
    /// Range if the beam hit something
    #[inline]
    pub fn distance(self) -> Option<f64> {
        match self {
            BeamReading::Hit(d) => Some(d),
            BeamReading::NoReturn => None,
        }
    }

    /// Range, or `sentinel` for no return
    #[inline]
    pub fn to_range(self, sentinel: f64) -> f64 {
        self.distance().unwrap_or(sentinel)
    }

    /// Beam hit something
    #[inline]
    pub fn is_hit(self) -> bool {
        matches!(self, BeamReading::Hit(_))
    }
}

/// One laser scan.
///
/// Holds either one reading per beam in beam order, or nothing (no scan
/// taken yet).
#[derive(Debug, Clone, PartialEq)]
pub struct LaserScanData {
    readings: Vec<BeamReading>,
    lengths: Vec<f64>,
    laser: LaserGeometry,
}

impl LaserScanData {
    /// Scan with no readings
    pub fn empty(laser: LaserGeometry) -> Self {
        Self {
            readings: Vec::new(),
            lengths: Vec::new(),
            laser,
        }
    }

    fn from_readings(readings: Vec<BeamReading>, laser: LaserGeometry) -> Self {
        let lengths = readings
            .iter()
            .map(|r| r.to_range(laser.no_return_value))
            .collect();
        Self {
            readings,
            lengths,
            laser,
        }
    }

    /// Ranges in beam order; beams with no return carry the sentinel
    /// (`no_return_value` of the laser geometry).
    #[inline]
    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    /// Tagged readings in beam order
    #[inline]
    pub fn readings(&self) -> &[BeamReading] {
        &self.readings
    }

    /// Number of readings (0 or beam count)
    #[inline]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// No scan available
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Number of beams that hit something
    pub fn hit_count(&self) -> usize {
        self.readings.iter().filter(|r| r.is_hit()).count()
    }

    /// Closest hit, if any
    pub fn nearest(&self) -> Option<f64> {
        self.readings
            .iter()
            .filter_map(|r| r.distance())
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Nominal beam angle relative to the heading
    #[inline]
    pub fn beam_angle(&self, index: usize) -> f64 {
        self.laser.beam_angle(index)
    }

    /// Geometry the scan was taken with
    #[inline]
    pub fn laser(&self) -> &LaserGeometry {
        &self.laser
    }

    /// World-frame hit point per beam for a robot at `pose`, `None` for
    /// no-returns. Uses nominal beam angles.
    pub fn beam_points(&self, pose: Vec3) -> Vec<Option<Vec2>> {
        let origin = self.laser.origin(pose);
        let heading = pose.heading();
        self.readings
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r.distance().map(|d| {
                    let dir = heading.rotated(self.laser.beam_angle(i));
                    origin.plus(dir.scale(d))
                })
            })
            .collect()
    }

    /// World-frame hit points for a robot at `pose`, skipping no-returns.
    pub fn endpoints(&self, pose: Vec3) -> Vec<Vec2> {
        self.beam_points(pose).into_iter().flatten().collect()
    }
}

/// Nearest hit along a ray, if within `max_range`
pub fn cast_ray(
    origin: Vec2,
    direction: Vec2,
    max_range: f64,
    segments: &[LineSegmentFeature],
) -> BeamReading {
    let nearest = segments
        .iter()
        .filter_map(|seg| seg.ray_intersection(origin, direction))
        .filter(|&t| t <= max_range)
        .min_by(|a, b| a.total_cmp(b));

    match nearest {
        Some(t) => BeamReading::Hit(t),
        None => BeamReading::NoReturn,
    }
}

/// Laser simulator
pub struct LaserModel {
    range_noise: Box<dyn NoiseModel>,
    angle_noise: Box<dyn NoiseModel>,
}

impl LaserModel {
    /// Noise-free laser
    pub fn new() -> Self {
        Self {
            range_noise: Box::new(NoNoise),
            angle_noise: Box::new(NoNoise),
        }
    }

    /// Build from configuration, forking noise channels off `generator`
    pub fn from_config(config: &LaserNoiseConfig, generator: &mut NoiseGenerator) -> Self {
        Self {
            range_noise: config.range_noise.build(generator),
            angle_noise: config.angle_noise.build(generator),
        }
    }

    /// Perturb each hit's range
    pub fn with_range_noise(mut self, noise: impl NoiseModel + 'static) -> Self {
        self.range_noise = Box::new(noise);
        self
    }

    /// Perturb each beam's angle (radians) before casting
    pub fn with_angle_noise(mut self, noise: impl NoiseModel + 'static) -> Self {
        self.angle_noise = Box::new(noise);
        self
    }

    /// Scan the scene from `pose`.
    ///
    /// Noisy hit ranges are clamped to `[0, max_range]` (a NaN perturbation
    /// keeps the exact range); no-returns are never perturbed.
    pub fn scan(&mut self, pose: Vec3, scene: &Scene) -> LaserScanData {
        let laser = *scene.laser();
        let origin = laser.origin(pose);

        let readings = (0..laser.count)
            .map(|i| {
                let angle = self.angle_noise.perturb(pose.theta + laser.beam_angle(i));
                let direction = Vec2::from_angle(angle);
                match cast_ray(origin, direction, laser.max_range, scene.features()) {
                    BeamReading::Hit(d) => {
                        let noisy = self.range_noise.perturb(d);
                        let range = if noisy.is_nan() { d } else { noisy };
                        BeamReading::Hit(range.clamp(0.0, laser.max_range))
                    }
                    BeamReading::NoReturn => BeamReading::NoReturn,
                }
            })
            .collect();

        let scan = LaserScanData::from_readings(readings, laser);
        log::trace!(
            "Laser scan at ({:.3}, {:.3}, {:.3}): {}/{} hits",
            pose.x,
            pose.y,
            pose.theta,
            scan.hit_count(),
            scan.len()
        );
        scan
    }
}

impl Default for LaserModel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LaserModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaserModel").finish_non_exhaustive()
    }
}
