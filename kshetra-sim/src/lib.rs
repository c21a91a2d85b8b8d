//! # Kshetra-Sim: 2D Robot Motion and Laser Simulator
//!
//! Simulates a differential-drive robot moving through a static map of
//! line-segment walls, producing ground-truth pose, noisy odometry and
//! ray-cast laser scans for localization and mapping development.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kshetra_sim::{Simulator, Vec2};
//!
//! let mut sim = Simulator::from_scene_file("scenes/simple_rectangle.yaml")?;
//!
//! sim.send_control(Vec2::new(50.0, 0.1))?;
//! sim.tick(0.1);
//!
//! let pose = sim.true_pose();
//! let scan = sim.laser_scan();
//! println!(
//!     "Pose: ({:.1}, {:.1}, {:.3}), {} of {} beams hit",
//!     pose.x,
//!     pose.y,
//!     pose.theta,
//!     scan.hit_count(),
//!     scan.len()
//! );
//! # Ok::<(), kshetra_sim::Error>(())
//! ```
//!
//! ## Coordinate Frame
//!
//! - **X-forward**: Positive X is in front of the robot at heading 0
//! - **Y-left**: Positive Y is to the left
//! - **Rotation**: Counter-clockwise positive, headings in (-π, π]
//!
//! ## Architecture
//!
//! - [`core`]: Vectors, angles and line segments
//! - [`scene`]: Obstacle map with robot and laser constants
//! - [`noise`]: Pluggable noise strategies
//! - [`motion`]: Unicycle motion model and odometry
//! - [`laser`]: Ray-cast laser model
//! - [`landmarks`]: RANSAC wall lines and corner/loose-end landmarks
//! - [`simulator`]: Facade tying scene, motion and laser together per tick
//! - [`shared`]: Mutex-guarded handle for multi-threaded use
//! - [`driver`]: Background thread ticking a shared simulator
//! - [`config`]: TOML simulation configuration
//!
//! ## Data Flow
//!
//! ```text
//!  Scene (YAML) ──▶ Scene ──────────────┐
//!                                       ▼
//!  send_control(v, ω) ──▶ Simulator::tick(dt)
//!                            │
//!              ┌─────────────┴─────────────┐
//!              ▼                           ▼
//!      ┌───────────────┐          ┌───────────────┐
//!      │  MotionModel  │──pose──▶ │  LaserModel   │
//!      │ (pose, odom)  │          │  (ray-cast)   │
//!      └───────────────┘          └───────────────┘
//!              │                           │
//!              └──────────▶ Snapshot ◀─────┘
//! ```

pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod landmarks;
pub mod laser;
pub mod motion;
pub mod noise;
pub mod scene;
pub mod shared;
pub mod simulator;

pub use config::SimulationConfig;
pub use crate::core::{LineSegmentFeature, Vec2, Vec3, normalize_angle};
pub use driver::SimulationDriver;
pub use error::{Error, InvalidControlError, Result, SceneFormatError};
pub use landmarks::{LandmarkConfig, LandmarkExtractor, Observation, RansacExtractor};
pub use laser::{BeamReading, LaserModel, LaserScanData};
pub use motion::{CollisionMode, Integration, MotionModel, OdometryData};
pub use noise::{NoiseGenerator, NoiseModel, NoiseSpec};
pub use scene::{
    LASER_DIST_OVER_DIST_VAL, LaserGeometry, MAX_THETA, MIN_THETA, NUM_LASERS, RobotGeometry,
    Scene,
};
pub use shared::SharedSimulator;
pub use simulator::{SimState, Simulator};
