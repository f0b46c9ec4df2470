//! Error types for the Seeker core

use thiserror::Error;

/// Errors raised while loading or applying configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &str, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors surfaced by the core control surface
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("goal ({x}, {y}) is not finite")]
    InvalidGoal { x: f64, y: f64 },

    #[error("lifecycle transition failed for {node}: {reason}")]
    Lifecycle { node: String, reason: String },
}
