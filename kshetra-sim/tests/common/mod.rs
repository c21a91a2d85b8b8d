//! Shared helpers for integration tests.

#![allow(dead_code)]

use kshetra_sim::{Scene, SimulationConfig, Simulator};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Single wall from (10, 0) to (10, 10), robot of length 4 at the origin.
///
/// The fan covers the full circle in five beams: -π, -π/2, 0, π/2, π.
pub const WALL_SCENE: &str = r#"
robot:
  length: 4.0
  start: [0.0, 0.0, 0.0]
laser:
  count: 5
  min_theta: -3.141592653589793
  max_theta: 3.141592653589793
  max_range: 500.0
segments:
  - [10.0, 0.0, 10.0, 10.0]
"#;

/// Closed square room, 200 units per side, centered on the origin
pub const ROOM_SCENE: &str = r#"
robot:
  length: 20.0
laser:
  count: 181
segments:
  - [-100.0, -100.0, 100.0, -100.0]
  - [100.0, -100.0, 100.0, 100.0]
  - [100.0, 100.0, -100.0, 100.0]
  - [-100.0, 100.0, -100.0, -100.0]
"#;

/// Write `contents` to a temporary scene file
pub fn write_scene(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp scene");
    file.write_all(contents.as_bytes()).expect("write temp scene");
    file.flush().expect("flush temp scene");
    file
}

/// Parse a scene from YAML text
pub fn scene(contents: &str) -> Arc<Scene> {
    Arc::new(Scene::from_yaml_str(contents).expect("valid scene"))
}

/// Noise-free simulator over `contents`
pub fn simulator(contents: &str) -> Simulator {
    Simulator::new(scene(contents), &SimulationConfig::default()).expect("valid config")
}

/// Simulator with the given TOML configuration
pub fn configured_simulator(contents: &str, config_toml: &str) -> Simulator {
    let config = SimulationConfig::from_toml_str(config_toml).expect("valid config");
    Simulator::new(scene(contents), &config).expect("valid config")
}
