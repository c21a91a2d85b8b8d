//! Headless simulation runner.
//!
//! Loads a scene, drives the robot with a constant command for a number of
//! ticks and logs pose, odometry and scan summary per tick.
//!
//! Usage:
//!   kshetra-sim --scene scenes/simple_rectangle.yaml --ticks 50 --linear 40 --angular 0.2
//!   RUST_LOG=debug kshetra-sim --scene scenes/simple_rectangle.yaml --config sim.toml
//!   kshetra-sim --scene scenes/simple_rectangle.yaml --ticks 10 --landmarks

use clap::Parser;
use kshetra_sim::{
    LandmarkExtractor, RansacExtractor, Result, Scene, SimulationConfig, Simulator, Vec2,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Run the robot simulator headless
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene file (YAML)
    #[arg(short, long)]
    scene: PathBuf,

    /// Simulation configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 100)]
    ticks: u64,

    /// Tick duration in seconds
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// Linear velocity command
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    linear: f64,

    /// Angular velocity command (rad/s)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    angular: f64,

    /// Random seed, overriding the configuration (0 = random)
    #[arg(long)]
    seed: Option<u64>,

    /// Extract lines and landmarks from each scan
    #[arg(long)]
    landmarks: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Using config: {}", path.display());
            SimulationConfig::from_file(path)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }

    let scene = Arc::new(Scene::load(&args.scene)?);
    let robot = scene.robot();
    log::info!(
        "Robot length {} starting at ({:.2}, {:.2}, {:.3})",
        robot.length,
        robot.start.x,
        robot.start.y,
        robot.start.theta
    );

    let mut extractor = args
        .landmarks
        .then(|| RansacExtractor::new(config.landmarks.clone()));
    let mut sim = Simulator::new(scene, &config)?;
    let control = Vec2::new(args.linear, args.angular);

    log::info!(
        "Running {} ticks of {}s with control ({}, {})",
        args.ticks,
        args.dt,
        control.x,
        control.y
    );

    for _ in 0..args.ticks {
        sim.send_control(control)?;
        sim.tick(args.dt);

        let pose = sim.true_pose();
        let odom = sim.odometry();
        let scan = sim.laser_scan_ref();
        let nearest = scan
            .nearest()
            .map_or_else(|| "none".to_string(), |d| format!("{:.2}", d));
        log::info!(
            "[{:4}] pose=({:.2}, {:.2}, {:.3}) odom=({:.3}, {:.4}) hits={}/{} nearest={}",
            sim.tick_count(),
            pose.x,
            pose.y,
            pose.theta,
            odom.translation,
            odom.rotation,
            scan.hit_count(),
            scan.len(),
            nearest
        );

        if let Some(extractor) = extractor.as_mut() {
            let observation = extractor.extract(scan, pose);
            log::info!(
                "       lines={} landmarks={}",
                observation.lines.len(),
                observation.landmarks.len()
            );
            for landmark in &observation.landmarks {
                log::debug!("       landmark ({:.2}, {:.2})", landmark.x, landmark.y);
            }
        }
    }

    log::info!("Finished after {:.2}s simulated time", sim.elapsed());
    Ok(())
}
