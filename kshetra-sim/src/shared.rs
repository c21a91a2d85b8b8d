//! Thread-safe simulator handle.
//!
//! One `parking_lot::Mutex` guards the whole [`Simulator`], so a `tick`
//! racing a `send_control` from another thread sees either the old or the
//! new command, and readers never see a half-updated snapshot.

use crate::core::{LineSegmentFeature, Vec2, Vec3};
use crate::error::InvalidControlError;
use crate::laser::LaserScanData;
use crate::motion::OdometryData;
use crate::simulator::{SimState, Simulator};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Cloneable handle to a simulator shared between threads
#[derive(Debug, Clone)]
pub struct SharedSimulator {
    inner: Arc<Mutex<Simulator>>,
}

impl SharedSimulator {
    /// Wrap `simulator` for shared access
    pub fn new(simulator: Simulator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(simulator)),
        }
    }

    /// Queue a command for the next tick
    pub fn send_control(&self, control: Vec2) -> Result<(), InvalidControlError> {
        self.inner.lock().send_control(control)
    }

    /// Advance by `dt` seconds under the lock
    pub fn tick(&self, dt: f64) {
        self.inner.lock().tick(dt);
    }

    /// Ground-truth pose
    pub fn true_pose(&self) -> Vec3 {
        self.inner.lock().true_pose()
    }

    /// Odometry reported by the last tick
    pub fn odometry(&self) -> OdometryData {
        self.inner.lock().odometry()
    }

    /// Copy of the last scan
    pub fn laser_scan(&self) -> LaserScanData {
        self.inner.lock().laser_scan()
    }

    /// Copy of the scene obstacles in load order
    pub fn line_features(&self) -> Vec<LineSegmentFeature> {
        self.inner.lock().line_features().to_vec()
    }

    /// Lifecycle state
    pub fn state(&self) -> SimState {
        self.inner.lock().state()
    }

    /// Ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.inner.lock().tick_count()
    }

    /// Pose, odometry and scan read under one lock acquisition
    pub fn snapshot(&self) -> (Vec3, OdometryData, LaserScanData) {
        let sim = self.inner.lock();
        (sim.true_pose(), sim.odometry(), sim.laser_scan())
    }

    /// Exclusive access for compound operations
    pub fn lock(&self) -> MutexGuard<'_, Simulator> {
        self.inner.lock()
    }
}

impl From<Simulator> for SharedSimulator {
    fn from(simulator: Simulator) -> Self {
        Self::new(simulator)
    }
}
