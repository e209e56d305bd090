//! Quadtree configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Manhattan distance under which two points are treated as coincident.
///
/// Absolute, in coordinate units. It is not scaled to the size of the
/// bounding square.
pub const DEFAULT_COINCIDENCE_TOLERANCE: f64 = 0.01;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TreeConfig {
    #[serde(default)]
    pub tree: TreeSettings,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl TreeConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tree.validate()
    }
}

/// Subdivision settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TreeSettings {
    /// Coincidence threshold (Manhattan distance).
    #[serde(default = "default_coincidence_tolerance")]
    pub coincidence_tolerance: f64,
}

impl TreeSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.coincidence_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        Ok(())
    }
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            coincidence_tolerance: default_coincidence_tolerance(),
        }
    }
}

fn default_coincidence_tolerance() -> f64 {
    DEFAULT_COINCIDENCE_TOLERANCE
}

/// Node pool settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PoolConfig {
    /// Maximum idle nodes kept for reuse. Unbounded when absent.
    #[serde(default)]
    pub capacity: Option<usize>,
}
