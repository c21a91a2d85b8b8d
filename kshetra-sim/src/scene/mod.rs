//! Static scene: line-segment obstacles plus robot and laser constants.
//!
//! A [`Scene`] is loaded once and never mutated afterwards. Simulators hold
//! it behind an `Arc` so one scene can outlive and serve many simulators.
//!
//! # Loading
//!
//! ```rust,no_run
//! use kshetra_sim::scene::Scene;
//!
//! let scene = Scene::load("scenes/simple_rectangle.yaml")?;
//! println!("{} walls, {} beams", scene.features().len(), scene.laser().count);
//! # Ok::<(), kshetra_sim::SceneFormatError>(())
//! ```
//!
//! See [`format`] for the file schema.

pub mod format;

use crate::core::{LineSegmentFeature, Vec2, Vec3};
use crate::error::SceneFormatError;
use format::SceneFile;
use std::f64::consts::FRAC_PI_2;
use std::path::Path;

/// Default number of beams in the laser fan
pub const NUM_LASERS: usize = 181;

/// Default angle of the first beam relative to the heading (radians)
pub const MIN_THETA: f64 = -FRAC_PI_2;

/// Default angle of the last beam relative to the heading (radians)
pub const MAX_THETA: f64 = FRAC_PI_2;

/// Default maximum laser range
pub const DEFAULT_MAX_RANGE: f64 = 500.0;

/// Default reported range for a beam with no return
pub const LASER_DIST_OVER_DIST_VAL: f64 = DEFAULT_MAX_RANGE + 1.0;

/// Default robot length
pub const DEFAULT_ROBOT_LENGTH: f64 = 20.0;

/// Robot geometry and initial placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotGeometry {
    /// Robot length along the heading
    pub length: f64,
    /// Initial true pose
    pub start: Vec3,
}

impl Default for RobotGeometry {
    fn default() -> Self {
        Self {
            length: DEFAULT_ROBOT_LENGTH,
            start: Vec3::zero(),
        }
    }
}

/// Laser fan geometry.
///
/// Beam `i` of `count` points at
/// `min_theta + (max_theta - min_theta) * i / (count - 1)` relative to the
/// robot heading. A single-beam fan points at `min_theta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserGeometry {
    /// Number of beams
    pub count: usize,
    /// Angle of beam 0 (radians, relative to heading)
    pub min_theta: f64,
    /// Angle of the last beam (radians, relative to heading)
    pub max_theta: f64,
    /// Hits farther than this are reported as no return
    pub max_range: f64,
    /// Laser origin offset from the robot center along the heading
    pub mount_offset: f64,
    /// Range reported for beams with no return
    pub no_return_value: f64,
}

impl Default for LaserGeometry {
    fn default() -> Self {
        Self {
            count: NUM_LASERS,
            min_theta: MIN_THETA,
            max_theta: MAX_THETA,
            max_range: DEFAULT_MAX_RANGE,
            mount_offset: DEFAULT_ROBOT_LENGTH * 0.5,
            no_return_value: LASER_DIST_OVER_DIST_VAL,
        }
    }
}

impl LaserGeometry {
    /// Fan of `count` beams between `min_theta` and `max_theta`.
    ///
    /// The no-return value follows `max_range` (`max_range + 1`).
    pub fn new(count: usize, min_theta: f64, max_theta: f64, max_range: f64) -> Self {
        Self {
            count,
            min_theta,
            max_theta,
            max_range,
            no_return_value: max_range + 1.0,
            ..Self::default()
        }
    }

    /// Set the laser mount offset
    pub fn with_mount_offset(mut self, offset: f64) -> Self {
        self.mount_offset = offset;
        self
    }

    /// Set the no-return sentinel
    pub fn with_no_return_value(mut self, value: f64) -> Self {
        self.no_return_value = value;
        self
    }

    /// Beam angle relative to the robot heading.
    #[inline]
    pub fn beam_angle(&self, index: usize) -> f64 {
        if self.count <= 1 {
            return self.min_theta;
        }
        let fraction = index as f64 / (self.count - 1) as f64;
        self.min_theta + (self.max_theta - self.min_theta) * fraction
    }

    /// Nominal angular spacing between adjacent beams (0 for a single beam)
    #[inline]
    pub fn angular_resolution(&self) -> f64 {
        if self.count <= 1 {
            0.0
        } else {
            (self.max_theta - self.min_theta) / (self.count - 1) as f64
        }
    }

    /// Laser origin in world frame for a robot at `pose`
    #[inline]
    pub fn origin(&self, pose: Vec3) -> Vec2 {
        pose.position().plus(pose.heading().scale(self.mount_offset))
    }

    fn validate(&self) -> Result<(), SceneFormatError> {
        if self.count == 0 {
            return Err(invalid("laser count must be at least 1"));
        }
        let finite = [
            self.min_theta,
            self.max_theta,
            self.max_range,
            self.mount_offset,
            self.no_return_value,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(invalid("laser parameters must be finite"));
        }
        if self.min_theta > self.max_theta {
            return Err(invalid(format!(
                "laser min_theta ({}) exceeds max_theta ({})",
                self.min_theta, self.max_theta
            )));
        }
        if self.max_range <= 0.0 {
            return Err(invalid(format!(
                "laser max_range must be positive, got {}",
                self.max_range
            )));
        }
        if (0.0..=self.max_range).contains(&self.no_return_value) {
            return Err(invalid(format!(
                "no_return_value {} is a valid range (0..={})",
                self.no_return_value, self.max_range
            )));
        }
        Ok(())
    }
}

/// Immutable obstacle map with robot and laser constants
#[derive(Debug, Clone)]
pub struct Scene {
    features: Vec<LineSegmentFeature>,
    robot: RobotGeometry,
    laser: LaserGeometry,
}

impl Scene {
    /// Build a scene from parts, validating every constraint.
    pub fn new(
        features: Vec<LineSegmentFeature>,
        robot: RobotGeometry,
        laser: LaserGeometry,
    ) -> Result<Self, SceneFormatError> {
        for (idx, seg) in features.iter().enumerate() {
            if !seg.p1.is_finite() || !seg.p2.is_finite() {
                return Err(invalid(format!("segment {} has non-finite endpoints", idx)));
            }
            if seg.is_degenerate() {
                return Err(invalid(format!(
                    "segment {} is degenerate: ({}, {}) to itself",
                    idx, seg.p1.x, seg.p1.y
                )));
            }
        }
        if !robot.length.is_finite() || robot.length < 0.0 {
            return Err(invalid(format!(
                "robot length must be finite and non-negative, got {}",
                robot.length
            )));
        }
        if !robot.start.is_finite() {
            return Err(invalid("robot start pose must be finite"));
        }
        laser.validate()?;

        Ok(Self {
            features,
            robot,
            laser,
        })
    }

    /// Load a scene from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneFormatError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let scene = Self::from_yaml_str(&contents)?;
        log::info!(
            "Loaded scene {}: {} segments, robot length {}, {} beams",
            path.display(),
            scene.features.len(),
            scene.robot.length,
            scene.laser.count
        );
        Ok(scene)
    }

    /// Parse a scene from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SceneFormatError> {
        let file: SceneFile = serde_yaml::from_str(yaml)?;

        let features = file
            .segments
            .iter()
            .map(|&[x1, y1, x2, y2]| LineSegmentFeature::from_coords(x1, y1, x2, y2))
            .collect();

        let [sx, sy, stheta] = file.robot.start;
        let robot = RobotGeometry {
            length: file.robot.length,
            start: Vec3::new(sx, sy, stheta),
        };

        let laser = LaserGeometry {
            count: file.laser.count,
            min_theta: file.laser.min_theta,
            max_theta: file.laser.max_theta,
            max_range: file.laser.max_range,
            mount_offset: file.laser.mount_offset.unwrap_or(robot.length * 0.5),
            no_return_value: file
                .laser
                .no_return_value
                .unwrap_or(file.laser.max_range + 1.0),
        };

        Self::new(features, robot, laser)
    }

    /// Obstacle segments in load order
    #[inline]
    pub fn features(&self) -> &[LineSegmentFeature] {
        &self.features
    }

    /// Robot geometry
    #[inline]
    pub fn robot(&self) -> &RobotGeometry {
        &self.robot
    }

    /// Robot length
    #[inline]
    pub fn robot_length(&self) -> f64 {
        self.robot.length
    }

    /// Laser fan geometry
    #[inline]
    pub fn laser(&self) -> &LaserGeometry {
        &self.laser
    }

    /// Initial true pose
    #[inline]
    pub fn start_pose(&self) -> Vec3 {
        self.robot.start
    }
}

fn invalid(msg: impl Into<String>) -> SceneFormatError {
    SceneFormatError::Invalid(msg.into())
}
