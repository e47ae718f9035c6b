//! Main MargaConfig and conversion methods.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Capsule;
use crate::maze::MazeLimits;
use crate::query::ProbeConfig;
use crate::recovery::RecoverySettings;

use super::error::ConfigLoadError;
use super::sections::{MazeSection, PlannerSection, RayCastSection, RecoverySection};

/// Full planner configuration loaded from YAML
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct MargaConfig {
    /// Ray-cast retry settings
    #[serde(default)]
    pub raycast: RayCastSection,

    /// Path preparation settings
    #[serde(default)]
    pub planner: PlannerSection,

    /// Maze solver budgets
    #[serde(default)]
    pub maze: MazeSection,

    /// Recovery search settings
    #[serde(default)]
    pub recovery: RecoverySection,

    /// Default character capsule
    #[serde(default)]
    pub capsule: Capsule,
}

impl MargaConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Load from default config path (configs/marga.yaml)
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/marga.yaml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Probe settings for planning requests
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            probe_spacing: self.planner.probe_spacing,
            character: self.planner.character,
            retry: self.raycast.to_retry_policy(),
        }
    }

    /// Maze solver limits
    pub fn maze_limits(&self) -> MazeLimits {
        self.maze.to_limits()
    }

    /// Recovery search settings
    pub fn recovery_settings(&self) -> RecoverySettings {
        self.recovery.to_settings()
    }
}
