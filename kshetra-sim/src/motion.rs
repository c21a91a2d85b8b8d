//! Unicycle motion model.
//!
//! Turns a velocity command `(v, ω)` held for `dt` seconds into a new true
//! pose and an odometry report.
//!
//! # Integration
//!
//! The commanded displacement is `d = v·dt` and rotation `φ = ω·dt`.
//!
//! - [`Integration::Arc`] (default): exact constant-curvature arc,
//!   ```text
//!   x' = x + d/φ · (sin(θ+φ) - sin θ)
//!   y' = y + d/φ · (cos θ - cos(θ+φ))
//!   θ' = θ + φ
//!   ```
//!   falling back to a straight line when |φ| is negligible.
//! - [`Integration::Euler`]: translate along the previous heading, then
//!   rotate.
//!
//! # Noise
//!
//! Process noise perturbs `d` and `φ` of the true pose update only. The
//! odometry report carries the commanded `d` and `φ`, optionally perturbed by
//! its own independent noise models. A robot that is not commanded to move
//! does not drift.

use crate::config::{MotionConfig, OdometryConfig};
use crate::core::math::is_normalized;
use crate::core::{LineSegmentFeature, Vec2, Vec3};
use crate::error::InvalidControlError;
use crate::noise::{NoNoise, NoiseGenerator, NoiseModel};
use serde::{Deserialize, Serialize};

/// Rotation below which arc integration degenerates to a straight line
const STRAIGHT_LINE_EPSILON: f64 = 1e-9;

/// Pose integration scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integration {
    /// Translate along the previous heading, then rotate
    Euler,
    /// Exact constant-curvature arc
    #[default]
    Arc,
}

/// Collision handling against scene segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    /// Pass through obstacles
    #[default]
    Passthrough,
    /// Hold position when the path crosses a segment; rotation still applies
    Stop,
}

/// Reported motion for one tick.
///
/// Same shape as the control command (translation, rotation) but integrated
/// over the tick: `translation = v·dt`, `rotation = ω·dt`, plus any odometry
/// noise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OdometryData {
    /// Forward displacement
    pub translation: f64,
    /// Heading change (radians)
    pub rotation: f64,
    /// Tick duration (seconds)
    pub dt: f64,
}

impl OdometryData {
    /// (translation, rotation) as a vector
    #[inline]
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.translation, self.rotation)
    }
}

/// Outcome of one motion step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionStep {
    /// New true pose
    pub pose: Vec3,
    /// Odometry report
    pub odometry: OdometryData,
    /// The path crossed a segment and the position was held
    pub collided: bool,
}

/// Unicycle motion model with optional noise, limits and collisions
pub struct MotionModel {
    integration: Integration,
    collision: CollisionMode,
    max_linear_speed: Option<f64>,
    max_angular_speed: Option<f64>,
    translation_noise: Box<dyn NoiseModel>,
    rotation_noise: Box<dyn NoiseModel>,
    odometry_translation_noise: Box<dyn NoiseModel>,
    odometry_rotation_noise: Box<dyn NoiseModel>,
}

impl MotionModel {
    /// Noise-free model using the given integration scheme
    pub fn new(integration: Integration) -> Self {
        Self {
            integration,
            collision: CollisionMode::default(),
            max_linear_speed: None,
            max_angular_speed: None,
            translation_noise: Box::new(NoNoise),
            rotation_noise: Box::new(NoNoise),
            odometry_translation_noise: Box::new(NoNoise),
            odometry_rotation_noise: Box::new(NoNoise),
        }
    }

    /// Build from configuration, forking noise channels off `generator`
    pub fn from_config(
        motion: &MotionConfig,
        odometry: &OdometryConfig,
        generator: &mut NoiseGenerator,
    ) -> Self {
        Self {
            integration: motion.integration,
            collision: motion.collision,
            max_linear_speed: motion.max_linear_speed.map(f64::abs),
            max_angular_speed: motion.max_angular_speed.map(f64::abs),
            translation_noise: motion.translation_noise.build(generator),
            rotation_noise: motion.rotation_noise.build(generator),
            odometry_translation_noise: odometry.translation_noise.build(generator),
            odometry_rotation_noise: odometry.rotation_noise.build(generator),
        }
    }

    /// Set process noise applied to the true pose
    pub fn with_process_noise(
        mut self,
        translation: impl NoiseModel + 'static,
        rotation: impl NoiseModel + 'static,
    ) -> Self {
        self.translation_noise = Box::new(translation);
        self.rotation_noise = Box::new(rotation);
        self
    }

    /// Set noise applied to the odometry report
    pub fn with_odometry_noise(
        mut self,
        translation: impl NoiseModel + 'static,
        rotation: impl NoiseModel + 'static,
    ) -> Self {
        self.odometry_translation_noise = Box::new(translation);
        self.odometry_rotation_noise = Box::new(rotation);
        self
    }

    /// Clamp commanded speeds to `|v| <= linear`, `|ω| <= angular`
    pub fn with_speed_limits(mut self, linear: Option<f64>, angular: Option<f64>) -> Self {
        self.max_linear_speed = linear.map(f64::abs);
        self.max_angular_speed = angular.map(f64::abs);
        self
    }

    /// Set collision handling
    pub fn with_collision_mode(mut self, mode: CollisionMode) -> Self {
        self.collision = mode;
        self
    }

    /// Integration scheme in use
    pub fn integration(&self) -> Integration {
        self.integration
    }

    /// Collision handling in use
    pub fn collision_mode(&self) -> CollisionMode {
        self.collision
    }

    /// Integrate `control = (v, ω)` over `dt` seconds from `pose`.
    ///
    /// A negative or non-finite `dt` integrates nothing. Returns the new true
    /// pose and the odometry report; the heading is in (-π, π].
    pub fn integrate(
        &mut self,
        pose: Vec3,
        control: Vec2,
        dt: f64,
    ) -> Result<(Vec3, OdometryData), InvalidControlError> {
        if !control.is_finite() {
            return Err(InvalidControlError {
                linear: control.x,
                angular: control.y,
            });
        }
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        let linear = clamp_abs(control.x, self.max_linear_speed);
        let angular = clamp_abs(control.y, self.max_angular_speed);

        let distance = linear * dt;
        let rotation = angular * dt;
        let moving = distance != 0.0 || rotation != 0.0;

        let (true_distance, true_rotation) = if moving {
            (
                self.translation_noise.perturb(distance),
                self.rotation_noise.perturb(rotation),
            )
        } else {
            (0.0, 0.0)
        };

        let new_pose = match self.integration {
            Integration::Euler => euler_step(pose, true_distance, true_rotation),
            Integration::Arc => arc_step(pose, true_distance, true_rotation),
        };
        let new_pose = if new_pose.position().is_finite() && is_normalized(new_pose.theta) {
            new_pose
        } else {
            log::warn!(
                "Discarding non-finite pose update (d={}, φ={})",
                true_distance,
                true_rotation
            );
            pose
        };

        let odometry = if moving {
            OdometryData {
                translation: self.odometry_translation_noise.perturb(distance),
                rotation: self.odometry_rotation_noise.perturb(rotation),
                dt,
            }
        } else {
            OdometryData {
                translation: 0.0,
                rotation: 0.0,
                dt,
            }
        };

        Ok((new_pose, odometry))
    }

    /// Integrate and apply collision handling against `obstacles`.
    pub fn step(
        &mut self,
        pose: Vec3,
        control: Vec2,
        dt: f64,
        obstacles: &[LineSegmentFeature],
    ) -> Result<MotionStep, InvalidControlError> {
        let (new_pose, odometry) = self.integrate(pose, control, dt)?;

        if self.collision == CollisionMode::Stop && path_blocked(pose, new_pose, obstacles) {
            log::debug!(
                "Collision: holding position at ({:.3}, {:.3})",
                pose.x,
                pose.y
            );
            return Ok(MotionStep {
                pose: Vec3::new(pose.x, pose.y, new_pose.theta),
                odometry,
                collided: true,
            });
        }

        Ok(MotionStep {
            pose: new_pose,
            odometry,
            collided: false,
        })
    }
}

impl Default for MotionModel {
    fn default() -> Self {
        Self::new(Integration::default())
    }
}

impl std::fmt::Debug for MotionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionModel")
            .field("integration", &self.integration)
            .field("collision", &self.collision)
            .field("max_linear_speed", &self.max_linear_speed)
            .field("max_angular_speed", &self.max_angular_speed)
            .finish_non_exhaustive()
    }
}

fn clamp_abs(value: f64, limit: Option<f64>) -> f64 {
    match limit.map(f64::abs) {
        Some(l) if !l.is_nan() => value.clamp(-l, l),
        _ => value,
    }
}

fn euler_step(pose: Vec3, distance: f64, rotation: f64) -> Vec3 {
    let (sin, cos) = pose.theta.sin_cos();
    Vec3::new(
        pose.x + distance * cos,
        pose.y + distance * sin,
        pose.theta + rotation,
    )
}

fn arc_step(pose: Vec3, distance: f64, rotation: f64) -> Vec3 {
    if rotation.abs() < STRAIGHT_LINE_EPSILON {
        return euler_step(pose, distance, rotation);
    }
    let radius = distance / rotation;
    let theta = pose.theta;
    let new_theta = theta + rotation;
    Vec3::new(
        pose.x + radius * (new_theta.sin() - theta.sin()),
        pose.y + radius * (theta.cos() - new_theta.cos()),
        new_theta,
    )
}

/// Straight path between two positions crosses any obstacle
fn path_blocked(from: Vec3, to: Vec3, obstacles: &[LineSegmentFeature]) -> bool {
    let path = LineSegmentFeature::new(from.position(), to.position());
    if path.is_degenerate() {
        return false;
    }
    obstacles.iter().any(|wall| path.intersection(wall).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_zero_control_zero_dt_is_identity() {
        let mut model = MotionModel::default();
        let pose = Vec3::new(3.0, -2.0, 1.0);
        let (new_pose, odom) = model.integrate(pose, Vec2::zero(), 0.0).unwrap();
        assert_eq!(new_pose, pose);
        assert_eq!(odom, OdometryData::default());
    }

    #[test]
    fn test_straight_line() {
        for integration in [Integration::Euler, Integration::Arc] {
            let mut model = MotionModel::new(integration);
            let (p, odom) = model
                .integrate(Vec3::zero(), Vec2::new(50.0, 0.0), 0.1)
                .unwrap();
            assert_relative_eq!(p.x, 5.0, epsilon = 1e-12);
            assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
            assert_relative_eq!(odom.translation, 5.0, epsilon = 1e-12);
            assert_eq!(odom.rotation, 0.0);
            assert_eq!(odom.dt, 0.1);
        }
    }

    #[test]
    fn test_euler_translates_along_previous_heading() {
        let mut model = MotionModel::new(Integration::Euler);
        let (p, _) = model
            .integrate(Vec3::zero(), Vec2::new(1.0, FRAC_PI_2), 1.0)
            .unwrap();
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.theta, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_arc_quarter_circle() {
        // Quarter circle of radius 1 turning left
        let mut model = MotionModel::new(Integration::Arc);
        let (p, _) = model
            .integrate(Vec3::zero(), Vec2::new(FRAC_PI_2, FRAC_PI_2), 1.0)
            .unwrap();
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.theta, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_heading_wraps_after_many_turns() {
        let mut model = MotionModel::default();
        let mut pose = Vec3::new(0.0, 0.0, PI - 0.01);
        for _ in 0..1000 {
            pose = model
                .integrate(pose, Vec2::new(0.0, 7.3), 0.37)
                .unwrap()
                .0;
            assert!(is_normalized(pose.theta));
        }
    }

    #[test]
    fn test_invalid_control_rejected() {
        let mut model = MotionModel::default();
        let err = model
            .integrate(Vec3::zero(), Vec2::new(f64::NAN, 0.0), 0.1)
            .unwrap_err();
        assert!(err.linear.is_nan());

        assert!(
            model
                .integrate(Vec3::zero(), Vec2::new(0.0, f64::INFINITY), 0.1)
                .is_err()
        );
    }

    #[test]
    fn test_bad_dt_integrates_nothing() {
        let mut model = MotionModel::default();
        for dt in [-1.0, f64::NAN, f64::INFINITY] {
            let (p, odom) = model
                .integrate(Vec3::zero(), Vec2::new(1.0, 1.0), dt)
                .unwrap();
            assert_eq!(p, Vec3::zero());
            assert_eq!(odom.dt, 0.0);
        }
    }

    #[test]
    fn test_process_noise_only_affects_true_pose() {
        let mut model = MotionModel::new(Integration::Euler).with_process_noise(|| 0.5, || 0.0);
        let (p, odom) = model
            .integrate(Vec3::zero(), Vec2::new(10.0, 0.0), 0.1)
            .unwrap();
        assert_relative_eq!(p.x, 1.5, epsilon = 1e-12);
        assert_relative_eq!(odom.translation, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_odometry_noise_only_affects_report() {
        let mut model = MotionModel::new(Integration::Euler).with_odometry_noise(|| 0.0, || 0.1);
        let (p, odom) = model
            .integrate(Vec3::zero(), Vec2::new(0.0, 1.0), 1.0)
            .unwrap();
        assert_relative_eq!(p.theta, 1.0, epsilon = 1e-12);
        assert_relative_eq!(odom.rotation, 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_stationary_robot_does_not_drift() {
        let mut model = MotionModel::default().with_process_noise(|| 1.0, || 1.0);
        let (p, _) = model
            .integrate(Vec3::new(1.0, 1.0, 0.0), Vec2::zero(), 0.5)
            .unwrap();
        assert_eq!(p, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_speed_limits() {
        let mut model = MotionModel::default().with_speed_limits(Some(1.0), Some(0.5));
        let (p, odom) = model
            .integrate(Vec3::zero(), Vec2::new(-10.0, 0.0), 1.0)
            .unwrap();
        assert_relative_eq!(p.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(odom.translation, -1.0, epsilon = 1e-12);

        let (p, _) = model
            .integrate(Vec3::zero(), Vec2::new(0.0, 3.0), 1.0)
            .unwrap();
        assert_relative_eq!(p.theta, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_configured_limits_use_magnitude() {
        let motion = MotionConfig {
            max_linear_speed: Some(-1.0),
            max_angular_speed: Some(-0.5),
            ..MotionConfig::default()
        };
        let mut generator = NoiseGenerator::new(1);
        let mut model =
            MotionModel::from_config(&motion, &OdometryConfig::default(), &mut generator);
        let (p, _) = model
            .integrate(Vec3::zero(), Vec2::new(10.0, 3.0), 1.0)
            .unwrap();
        assert_relative_eq!(p.theta, 0.5, epsilon = 1e-12);
        assert!(p.position().length() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_nan_limit_is_ignored() {
        assert_eq!(clamp_abs(3.0, Some(f64::NAN)), 3.0);
        assert_eq!(clamp_abs(3.0, Some(-2.0)), 2.0);
    }

    #[test]
    fn test_non_finite_noise_keeps_previous_pose() {
        let pose = Vec3::new(1.0, 2.0, 0.5);
        for integration in [Integration::Euler, Integration::Arc] {
            let mut model = MotionModel::new(integration)
                .with_process_noise(|| f64::INFINITY, || f64::INFINITY);
            let (p, odom) = model.integrate(pose, Vec2::new(1.0, 0.1), 0.1).unwrap();
            assert_eq!(p, pose);
            assert_relative_eq!(odom.translation, 0.1, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_collision_stop_holds_position() {
        let wall = [LineSegmentFeature::from_coords(1.0, -5.0, 1.0, 5.0)];
        let mut model = MotionModel::default().with_collision_mode(CollisionMode::Stop);

        let step = model
            .step(Vec3::zero(), Vec2::new(2.0, 0.0), 1.0, &wall)
            .unwrap();
        assert!(step.collided);
        assert_eq!(step.pose.position(), Vec2::zero());
        assert_relative_eq!(step.odometry.translation, 2.0);

        let step = model
            .step(Vec3::zero(), Vec2::new(0.5, 0.0), 1.0, &wall)
            .unwrap();
        assert!(!step.collided);
        assert_relative_eq!(step.pose.x, 0.5);
    }

    #[test]
    fn test_collision_passthrough() {
        let wall = [LineSegmentFeature::from_coords(1.0, -5.0, 1.0, 5.0)];
        let mut model = MotionModel::default();
        let step = model
            .step(Vec3::zero(), Vec2::new(2.0, 0.0), 1.0, &wall)
            .unwrap();
        assert!(!step.collided);
        assert_relative_eq!(step.pose.x, 2.0);
    }
}
