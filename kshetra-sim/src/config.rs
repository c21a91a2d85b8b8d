//! Simulation configuration
//!
//! Scene geometry lives in the scene file; everything about *how* the scene
//! is simulated (noise, integration, limits, tick rate) lives here and is
//! loaded from TOML. Every field has a default, so an empty file is a valid
//! noise-free configuration.
//!
//! ```toml
//! random_seed = 42
//!
//! [motion]
//! integration = "arc"
//! collision = "stop"
//! max_linear_speed = 100.0
//!
//! [motion.translation_noise]
//! model = "gaussian"
//! stddev = 0.5
//!
//! [laser.range_noise]
//! model = "uniform"
//! limit = 5.0
//!
//! [driver]
//! rate_hz = 60.0
//! speed_factor = 1.0
//! ```

use crate::error::{Error, Result};
use crate::landmarks::LandmarkConfig;
use crate::motion::{CollisionMode, Integration};
use crate::noise::NoiseSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Motion model configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Pose integration scheme
    pub integration: Integration,

    /// Collision handling against scene segments
    pub collision: CollisionMode,

    /// Linear speed limit (unlimited if absent)
    pub max_linear_speed: Option<f64>,

    /// Angular speed limit in rad/s (unlimited if absent)
    pub max_angular_speed: Option<f64>,

    /// Noise on the true forward displacement per tick
    pub translation_noise: NoiseSpec,

    /// Noise on the true rotation per tick (radians)
    pub rotation_noise: NoiseSpec,
}

/// Odometry report configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OdometryConfig {
    /// Noise on the reported displacement
    pub translation_noise: NoiseSpec,

    /// Noise on the reported rotation (radians)
    pub rotation_noise: NoiseSpec,
}

/// Laser noise configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LaserNoiseConfig {
    /// Noise on each hit's range
    pub range_noise: NoiseSpec,

    /// Noise on each beam's angle (radians)
    pub angle_noise: NoiseSpec,
}

/// Background driver timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Ticks per wall-clock second
    pub rate_hz: f64,

    /// Simulated seconds per wall-clock second (2.0 = twice real time)
    pub speed_factor: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            rate_hz: 60.0,
            speed_factor: 1.0,
        }
    }
}

/// Root simulation configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for reproducible noise (0 = random each run)
    pub random_seed: u64,

    /// Motion model
    pub motion: MotionConfig,

    /// Odometry report
    pub odometry: OdometryConfig,

    /// Laser noise
    pub laser: LaserNoiseConfig,

    /// Background driver
    pub driver: DriverConfig,

    /// Landmark extraction
    pub landmarks: LandmarkConfig,
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// True when no noise channel is configured
    pub fn is_deterministic(&self) -> bool {
        self.noise_channels()
            .iter()
            .all(|(_, spec)| spec.is_none())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.driver.rate_hz.is_finite() && self.driver.rate_hz > 0.0) {
            return Err(Error::Config(format!(
                "driver.rate_hz must be positive, got {}",
                self.driver.rate_hz
            )));
        }
        if !(self.driver.speed_factor.is_finite() && self.driver.speed_factor > 0.0) {
            return Err(Error::Config(format!(
                "driver.speed_factor must be positive, got {}",
                self.driver.speed_factor
            )));
        }
        for (name, limit) in [
            ("motion.max_linear_speed", self.motion.max_linear_speed),
            ("motion.max_angular_speed", self.motion.max_angular_speed),
        ] {
            if let Some(l) = limit
                && !(l.is_finite() && l >= 0.0)
            {
                return Err(Error::Config(format!(
                    "{} must be finite and non-negative, got {}",
                    name, l
                )));
            }
        }
        for (name, spec) in self.noise_channels() {
            spec.validate()
                .map_err(|e| Error::Config(format!("{}: {}", name, e)))?;
        }
        self.landmarks
            .validate()
            .map_err(|e| Error::Config(format!("landmarks: {}", e)))?;
        Ok(())
    }

    fn noise_channels(&self) -> [(&'static str, NoiseSpec); 6] {
        [
            ("motion.translation_noise", self.motion.translation_noise),
            ("motion.rotation_noise", self.motion.rotation_noise),
            ("odometry.translation_noise", self.odometry.translation_noise),
            ("odometry.rotation_noise", self.odometry.rotation_noise),
            ("laser.range_noise", self.laser.range_noise),
            ("laser.angle_noise", self.laser.angle_noise),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.random_seed, 0);
        assert_eq!(config.motion.integration, Integration::Arc);
        assert_eq!(config.motion.collision, CollisionMode::Passthrough);
        assert_eq!(config.driver.rate_hz, 60.0);
        assert!(config.is_deterministic());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
random_seed = 42

[motion]
integration = "euler"
collision = "stop"
max_linear_speed = 100.0

[motion.translation_noise]
model = "gaussian"
stddev = 0.5

[laser.range_noise]
model = "uniform"
limit = 5.0

[driver]
rate_hz = 30.0
"#;

        let config = SimulationConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.motion.integration, Integration::Euler);
        assert_eq!(config.motion.collision, CollisionMode::Stop);
        assert_eq!(config.motion.max_linear_speed, Some(100.0));
        assert_eq!(
            config.motion.translation_noise,
            NoiseSpec::Gaussian {
                stddev: 0.5,
                bias: 0.0
            }
        );
        assert_eq!(config.laser.range_noise, NoiseSpec::Uniform { limit: 5.0 });
        assert_eq!(config.driver.rate_hz, 30.0);
        assert_eq!(config.driver.speed_factor, 1.0);
        assert!(!config.is_deterministic());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = SimulationConfig::default();
        config.random_seed = 7;
        config.odometry.rotation_noise = NoiseSpec::Uniform { limit: 0.01 };

        let text = config.to_toml_string().unwrap();
        assert!(text.contains("random_seed = 7"));
        assert_eq!(SimulationConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_validation() {
        assert!(SimulationConfig::from_toml_str("[driver]\nrate_hz = 0.0\n").is_err());
        assert!(SimulationConfig::from_toml_str("[driver]\nspeed_factor = -1.0\n").is_err());
        assert!(SimulationConfig::from_toml_str("[motion]\nmax_angular_speed = -1.0\n").is_err());
        assert!(SimulationConfig::from_toml_str("[motion]\nintegration = \"rk4\"\n").is_err());
        assert!(SimulationConfig::from_toml_str("[landmarks]\ninlier_threshold = -4.0\n").is_err());
    }

    #[test]
    fn test_noise_validation() {
        let rejected = [
            "[laser.range_noise]\nmodel = \"uniform\"\nlimit = 1e308\n",
            "[laser.range_noise]\nmodel = \"uniform\"\nlimit = nan\n",
            "[laser.angle_noise]\nmodel = \"uniform\"\nlimit = inf\n",
            "[motion.rotation_noise]\nmodel = \"gaussian\"\nstddev = inf\n",
            "[odometry.translation_noise]\nmodel = \"gaussian\"\nstddev = -1.0\n",
            "[motion.translation_noise]\nmodel = \"gaussian\"\nstddev = 1.0\nbias = nan\n",
        ];
        for toml_content in rejected {
            let err = SimulationConfig::from_toml_str(toml_content).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{}", toml_content);
        }
    }
}
