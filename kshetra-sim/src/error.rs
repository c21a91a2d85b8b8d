//! Error types for the Kshetra simulator

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Scene could not be loaded.
///
/// Terminal for the simulator being constructed: the caller has to build a
/// new one from a corrected source.
#[derive(Debug, Error)]
pub enum SceneFormatError {
    /// Scene source could not be read
    #[error("Failed to read scene: {0}")]
    Io(#[from] std::io::Error),

    /// Scene source is not valid YAML or has the wrong shape
    #[error("Failed to parse scene: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Scene parsed but violates a geometric or sensor constraint
    #[error("Invalid scene: {0}")]
    Invalid(String),
}

/// Control command with a non-finite component.
///
/// The pending command is left untouched; the caller may retry.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Invalid control: linear={linear}, angular={angular} (components must be finite)")]
pub struct InvalidControlError {
    /// Rejected linear velocity
    pub linear: f64,
    /// Rejected angular velocity
    pub angular: f64,
}

/// Kshetra error types
#[derive(Debug, Error)]
pub enum Error {
    /// Scene load failure
    #[error(transparent)]
    Scene(#[from] SceneFormatError),

    /// Rejected control command
    #[error(transparent)]
    InvalidControl(#[from] InvalidControlError),

    /// Simulation configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
