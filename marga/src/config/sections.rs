//! Configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::maze::MazeLimits;
use crate::query::RetryPolicy;
use crate::recovery::RecoverySettings;
use crate::world::CharacterClass;

use super::defaults;

/// Ray-cast retry settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RayCastSection {
    /// Attempts per cast, including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts (milliseconds)
    #[serde(default = "defaults::retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RayCastSection {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::retry_delay_ms(),
        }
    }
}

impl RayCastSection {
    /// Convert to RetryPolicy
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Path preparation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerSection {
    /// Vertical spacing of beam probes (meters)
    #[serde(default = "defaults::probe_spacing")]
    pub probe_spacing: f32,

    /// Points closer than this to their predecessor are dropped (meters)
    #[serde(default = "defaults::min_segment_length")]
    pub min_segment_length: f32,

    /// Character class for static path queries
    #[serde(default)]
    pub character: CharacterClass,

    /// Default distance to stop short of the goal (meters)
    #[serde(default)]
    pub stop_short: f32,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            probe_spacing: defaults::probe_spacing(),
            min_segment_length: defaults::min_segment_length(),
            character: CharacterClass::None,
            stop_short: 0.0,
        }
    }
}

/// Maze solver budgets
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MazeSection {
    /// Grid side cap (cells)
    #[serde(default = "defaults::max_grid_cells")]
    pub max_grid_cells: usize,

    /// Free cells around the start/end span (cells)
    #[serde(default = "defaults::margin_cells")]
    pub margin_cells: usize,

    /// Wall-clock budget per solve (milliseconds)
    #[serde(default = "defaults::time_budget_ms")]
    pub time_budget_ms: u64,

    /// Iteration cap as a multiple of the grid area
    #[serde(default = "defaults::iteration_factor")]
    pub iteration_factor: usize,

    /// Memory budget per solve (bytes)
    #[serde(default = "defaults::memory_budget_bytes")]
    pub memory_budget_bytes: usize,

    /// Largest plausible rise per meter toward the goal
    #[serde(default = "defaults::max_slope")]
    pub max_slope: f32,
}

impl Default for MazeSection {
    fn default() -> Self {
        Self {
            max_grid_cells: defaults::max_grid_cells(),
            margin_cells: defaults::margin_cells(),
            time_budget_ms: defaults::time_budget_ms(),
            iteration_factor: defaults::iteration_factor(),
            memory_budget_bytes: defaults::memory_budget_bytes(),
            max_slope: defaults::max_slope(),
        }
    }
}

impl MazeSection {
    /// Convert to MazeLimits
    pub fn to_limits(&self) -> MazeLimits {
        MazeLimits {
            max_grid_cells: self.max_grid_cells,
            margin_cells: self.margin_cells,
            time_budget: Duration::from_millis(self.time_budget_ms),
            iteration_factor: self.iteration_factor,
            memory_budget: self.memory_budget_bytes,
            max_slope: self.max_slope,
        }
    }
}

/// Recovery search settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoverySection {
    /// Radial search reach around the current position (meters)
    #[serde(default = "defaults::search_radius")]
    pub search_radius: f32,

    /// Candidates per search ring
    #[serde(default = "defaults::ring_samples")]
    pub ring_samples: usize,
}

impl Default for RecoverySection {
    fn default() -> Self {
        Self {
            search_radius: defaults::search_radius(),
            ring_samples: defaults::ring_samples(),
        }
    }
}

impl RecoverySection {
    /// Convert to RecoverySettings
    pub fn to_settings(&self) -> RecoverySettings {
        RecoverySettings {
            search_radius: self.search_radius,
            ring_samples: self.ring_samples,
        }
    }
}
