//! Background simulation clock.
//!
//! Spawns a named thread that ticks a [`SharedSimulator`] at a fixed rate.
//! Each tick advances simulated time by the measured wall-clock interval
//! times `speed_factor`:
//!
//! | speed_factor | Use case |
//! |--------------|----------|
//! | 1.0 | Real-time visualization |
//! | 2.0 | Faster algorithm iteration |
//! | 5.0 | Quick integration tests |
//!
//! The thread stops on [`SimulationDriver::stop`] or when the driver is
//! dropped.

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::shared::SharedSimulator;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Runs the simulation clock on its own thread
pub struct SimulationDriver {
    simulator: SharedSimulator,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SimulationDriver {
    /// Start ticking `simulator` in the background
    pub fn spawn(simulator: SharedSimulator, config: &DriverConfig) -> Result<Self> {
        if !(config.rate_hz.is_finite() && config.rate_hz > 0.0) {
            return Err(Error::Config(format!(
                "driver rate must be positive, got {}",
                config.rate_hz
            )));
        }
        if !(config.speed_factor.is_finite() && config.speed_factor > 0.0) {
            return Err(Error::Config(format!(
                "speed factor must be positive, got {}",
                config.speed_factor
            )));
        }

        let interval = Duration::try_from_secs_f64(1.0 / config.rate_hz).map_err(|e| {
            Error::Config(format!(
                "driver rate {} gives no usable tick interval: {}",
                config.rate_hz, e
            ))
        })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let speed_factor = config.speed_factor;

        let sim = simulator.clone();
        let stop = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("kshetra-sim".to_string())
            .spawn(move || simulation_loop(sim, stop, interval, speed_factor))
            .map_err(|e| Error::Other(format!("Failed to spawn simulation thread: {}", e)))?;

        Ok(Self {
            simulator,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Handle to the driven simulator
    pub fn simulator(&self) -> &SharedSimulator {
        &self.simulator
    }

    /// Thread still running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the clock and join the thread
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("Simulation thread panicked");
        }
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn simulation_loop(
    simulator: SharedSimulator,
    shutdown: Arc<AtomicBool>,
    interval: Duration,
    speed_factor: f64,
) {
    log::info!(
        "Simulation loop started: speed_factor={}, interval={:?}",
        speed_factor,
        interval
    );

    let mut last_time = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        let loop_start = Instant::now();

        let wall_dt = loop_start.duration_since(last_time).as_secs_f64();
        last_time = loop_start;
        simulator.tick(wall_dt * speed_factor);

        let elapsed = loop_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }

    log::info!(
        "Simulation loop stopped after {} ticks",
        simulator.tick_count()
    );
}
