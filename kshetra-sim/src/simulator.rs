//! Simulator facade.
//!
//! Owns the scene, the true pose and the tick clock. Each [`Simulator::tick`]
//! consumes the pending control (zero if none was sent), runs the motion
//! model, scans from the new pose and replaces the cached snapshot as a
//! whole. Accessors only read the cached snapshot.
//!
//! ```text
//!  send_control(v) ──▶ pending ─┐
//!                               ▼
//!  tick(dt) ──▶ MotionModel::step ──▶ LaserModel::scan ──▶ Snapshot
//!                                                           │
//!  true_pose() / odometry() / laser_scan() ◀────────────────┘
//! ```

use crate::config::SimulationConfig;
use crate::core::{LineSegmentFeature, Vec2, Vec3};
use crate::error::{InvalidControlError, Result, SceneFormatError};
use crate::laser::{LaserModel, LaserScanData};
use crate::motion::{MotionModel, OdometryData};
use crate::noise::NoiseGenerator;
use crate::scene::Scene;
use std::path::Path;
use std::sync::Arc;

/// Lifecycle of a [`Simulator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    /// No tick has run; odometry and scan are empty
    Uninitialized,
    /// At least one tick has run
    Running,
}

/// Everything a tick produces, replaced as one value
#[derive(Debug, Clone)]
struct Snapshot {
    pose: Vec3,
    odometry: OdometryData,
    scan: LaserScanData,
}

impl Snapshot {
    fn initial(scene: &Scene) -> Self {
        Self {
            pose: scene.start_pose(),
            odometry: OdometryData::default(),
            scan: LaserScanData::empty(*scene.laser()),
        }
    }
}

/// Robot motion and laser simulator over a line-segment scene
#[derive(Debug)]
pub struct Simulator {
    scene: Arc<Scene>,
    motion: MotionModel,
    laser: LaserModel,
    pending: Option<Vec2>,
    snapshot: Snapshot,
    state: SimState,
    tick_count: u64,
    elapsed: f64,
}

impl Simulator {
    /// Create a simulator with models built from `config`.
    ///
    /// Fails with [`Error::Config`](crate::Error::Config) if `config` does not
    /// validate.
    pub fn new(scene: Arc<Scene>, config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut generator = NoiseGenerator::new(config.random_seed);
        let motion = MotionModel::from_config(&config.motion, &config.odometry, &mut generator);
        let laser = LaserModel::from_config(&config.laser, &mut generator);
        Ok(Self::with_models(scene, motion, laser))
    }

    /// Load a scene file and create a noise-free simulator
    pub fn from_scene_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, SceneFormatError> {
        let scene = Scene::load(path)?;
        Ok(Self::with_models(
            Arc::new(scene),
            MotionModel::default(),
            LaserModel::new(),
        ))
    }

    /// Load a scene file and a TOML configuration
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(scene: P, config: Q) -> Result<Self> {
        let scene = Scene::load(scene)?;
        let config = SimulationConfig::from_file(config)?;
        Self::new(Arc::new(scene), &config)
    }

    /// Create a simulator with explicit models
    pub fn with_models(scene: Arc<Scene>, motion: MotionModel, laser: LaserModel) -> Self {
        let snapshot = Snapshot::initial(&scene);
        Self {
            scene,
            motion,
            laser,
            pending: None,
            snapshot,
            state: SimState::Uninitialized,
            tick_count: 0,
            elapsed: 0.0,
        }
    }

    /// Queue a `(linear, angular)` command for the next tick.
    ///
    /// Overwrites any command not yet consumed. Non-finite components are
    /// rejected and leave the pending command unchanged.
    pub fn send_control(&mut self, control: Vec2) -> std::result::Result<(), InvalidControlError> {
        if !control.is_finite() {
            let err = InvalidControlError {
                linear: control.x,
                angular: control.y,
            };
            log::warn!("Rejected control: {}", err);
            return Err(err);
        }
        self.pending = Some(control);
        Ok(())
    }

    /// Command waiting for the next tick
    pub fn pending_control(&self) -> Option<Vec2> {
        self.pending
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// A negative or non-finite `dt` is treated as zero.
    pub fn tick(&mut self, dt: f64) {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::warn!("Invalid tick duration {}, using 0", dt);
            0.0
        };

        let control = self.pending.take().unwrap_or_else(Vec2::zero);
        let pose = self.snapshot.pose;

        // Pending controls are finite, so the motion model cannot reject them.
        let (new_pose, odometry) = match self.motion.step(pose, control, dt, self.scene.features())
        {
            Ok(step) => (step.pose, step.odometry),
            Err(err) => {
                log::warn!("Motion step failed: {}", err);
                let odometry = OdometryData {
                    dt,
                    ..Default::default()
                };
                (pose, odometry)
            }
        };

        let scan = self.laser.scan(new_pose, &self.scene);

        self.snapshot = Snapshot {
            pose: new_pose,
            odometry,
            scan,
        };
        self.state = SimState::Running;
        self.tick_count += 1;
        self.elapsed += dt;

        log::debug!(
            "Tick {}: control=({:.3}, {:.3}) pose=({:.3}, {:.3}, {:.3}) hits={}",
            self.tick_count,
            control.x,
            control.y,
            new_pose.x,
            new_pose.y,
            new_pose.theta,
            self.snapshot.scan.hit_count()
        );
    }

    /// Ground-truth pose
    pub fn true_pose(&self) -> Vec3 {
        self.snapshot.pose
    }

    /// Odometry reported by the last tick
    pub fn odometry(&self) -> OdometryData {
        self.snapshot.odometry
    }

    /// Scan from the last tick (empty before the first tick)
    pub fn laser_scan(&self) -> LaserScanData {
        self.snapshot.scan.clone()
    }

    /// Borrow the last scan without copying
    pub fn laser_scan_ref(&self) -> &LaserScanData {
        &self.snapshot.scan
    }

    /// Scene obstacles in load order
    pub fn line_features(&self) -> &[LineSegmentFeature] {
        self.scene.features()
    }

    /// Shared scene
    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Lifecycle state
    pub fn state(&self) -> SimState {
        self.state
    }

    /// Ticks run since construction or the last reset
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated seconds since construction or the last reset
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Return to `Uninitialized` at `pose`, dropping any pending command
    pub fn reset(&mut self, pose: Vec3) {
        self.snapshot = Snapshot {
            pose,
            ..Snapshot::initial(&self.scene)
        };
        self.pending = None;
        self.state = SimState::Uninitialized;
        self.tick_count = 0;
        self.elapsed = 0.0;
        log::debug!("Reset to ({:.3}, {:.3}, {:.3})", pose.x, pose.y, pose.theta);
    }

    /// Number of beams per scan
    pub fn num_lasers(&self) -> usize {
        self.scene.laser().count
    }

    /// Angle of the first beam relative to the heading
    pub fn min_theta(&self) -> f64 {
        self.scene.laser().min_theta
    }

    /// Angle of the last beam relative to the heading
    pub fn max_theta(&self) -> f64 {
        self.scene.laser().max_theta
    }

    /// Range reported for beams with no return
    pub fn no_return_value(&self) -> f64 {
        self.scene.laser().no_return_value
    }

    /// Robot length
    pub fn robot_length(&self) -> f64 {
        self.scene.robot_length()
    }
}
