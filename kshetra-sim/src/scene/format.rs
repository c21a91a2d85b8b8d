//! YAML scene file schema.
//!
//! ```yaml
//! robot:
//!   length: 20.0
//!   start: [400.0, 400.0, 0.0]
//! laser:
//!   count: 181
//!   min_theta: -1.5707963267948966
//!   max_theta: 1.5707963267948966
//!   max_range: 500.0
//! segments:
//!   - [100.0, 100.0, 700.0, 100.0]
//!   - [700.0, 100.0, 700.0, 700.0]
//! ```
//!
//! Only `segments` is required. Missing sections fall back to the default
//! robot and laser constants.

use super::{DEFAULT_MAX_RANGE, DEFAULT_ROBOT_LENGTH, MAX_THETA, MIN_THETA, NUM_LASERS};
use serde::Deserialize;

/// Root of a scene file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SceneFile {
    #[serde(default)]
    pub robot: RobotSection,

    #[serde(default)]
    pub laser: LaserSection,

    /// `[x1, y1, x2, y2]` per obstacle edge, in file order
    pub segments: Vec<[f64; 4]>,
}

/// Robot geometry
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RobotSection {
    #[serde(default = "default_robot_length")]
    pub length: f64,

    /// Initial pose `[x, y, theta]`
    #[serde(default)]
    pub start: [f64; 3],
}

fn default_robot_length() -> f64 {
    DEFAULT_ROBOT_LENGTH
}

impl Default for RobotSection {
    fn default() -> Self {
        Self {
            length: default_robot_length(),
            start: [0.0; 3],
        }
    }
}

/// Laser fan geometry
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LaserSection {
    #[serde(default = "default_count")]
    pub count: usize,

    #[serde(default = "default_min_theta")]
    pub min_theta: f64,

    #[serde(default = "default_max_theta")]
    pub max_theta: f64,

    #[serde(default = "default_max_range")]
    pub max_range: f64,

    /// Distance from the robot center to the laser along the heading.
    /// Defaults to half the robot length.
    #[serde(default)]
    pub mount_offset: Option<f64>,

    /// Reported range for beams with no return. Defaults to `max_range + 1`.
    #[serde(default)]
    pub no_return_value: Option<f64>,
}

fn default_count() -> usize {
    NUM_LASERS
}
fn default_min_theta() -> f64 {
    MIN_THETA
}
fn default_max_theta() -> f64 {
    MAX_THETA
}
fn default_max_range() -> f64 {
    DEFAULT_MAX_RANGE
}

impl Default for LaserSection {
    fn default() -> Self {
        Self {
            count: default_count(),
            min_theta: default_min_theta(),
            max_theta: default_max_theta(),
            max_range: default_max_range(),
            mount_offset: None,
            no_return_value: None,
        }
    }
}
