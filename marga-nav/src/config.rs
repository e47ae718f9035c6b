//! Configuration loading for MargaNav

use crate::error::{NavError, Result};
use marga::MargaConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NavConfig {
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub navigator: NavigatorConfig,
    /// Planner library settings (`[planning.raycast]`, `[planning.maze]`, ...)
    #[serde(default)]
    pub planning: MargaConfig,
}

/// Task runtime settings
#[derive(Clone, Debug, Deserialize)]
pub struct TaskConfig {
    /// Pause after each motion command before re-sampling the pose (default: 50)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Capacity of the request channels (default: 16)
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

/// Caller-side retry and recovery policy
#[derive(Clone, Debug, Deserialize)]
pub struct NavigatorConfig {
    /// Fresh planning attempts after a retryable failure (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Recovery relocations per navigation (default: 1)
    #[serde(default = "default_max_recoveries")]
    pub max_recoveries: u32,

    /// How long to wait for a request's outcome (default: 30000)
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_recoveries: default_max_recoveries(),
            reply_timeout_ms: default_reply_timeout_ms(),
        }
    }
}

// Default value functions
fn default_settle_ms() -> u64 {
    50
}
fn default_queue_depth() -> usize {
    16
}
fn default_max_retries() -> u32 {
    3
}
fn default_max_recoveries() -> u32 {
    1
}
fn default_reply_timeout_ms() -> u64 {
    30_000
}

impl NavConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        let config: NavConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.tasks.settle_ms)
    }

    /// Outcome wait limit as a duration
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.navigator.reply_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: NavConfig = toml::from_str("").unwrap();
        assert_eq!(config.tasks.settle_ms, 50);
        assert_eq!(config.tasks.queue_depth, 16);
        assert_eq!(config.navigator.max_retries, 3);
        assert_eq!(config.navigator.max_recoveries, 1);
        assert_eq!(config.reply_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_planning_sections_nest() {
        let config: NavConfig = toml::from_str(
            r#"
[tasks]
settle_ms = 0

[navigator]
max_retries = 5

[planning.raycast]
max_attempts = 7

[planning.capsule]
width = 0.6
height = 1.8
"#,
        )
        .unwrap();
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.navigator.max_retries, 5);
        assert_eq!(config.planning.raycast.max_attempts, 7);
        assert_eq!(config.planning.capsule.width, 0.6);
        // Untouched sections keep their defaults
        assert_eq!(config.planning.maze.max_grid_cells, 45);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = toml::from_str::<NavConfig>("[tasks]\nsettle_ms = \"soon\"").unwrap_err();
        assert!(matches!(NavError::from(err), NavError::Config(_)));
    }
}
