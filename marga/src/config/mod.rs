//! Unified configuration loading for marga.
//!
//! Loads all planner settings from a single YAML file with sensible defaults.
//!
//! ```rust,ignore
//! use marga::config::MargaConfig;
//!
//! // Load from default path (configs/marga.yaml)
//! let config = MargaConfig::load_default()?;
//!
//! let probe = config.probe_config();
//! let limits = config.maze_limits();
//! ```
//!
//! | Section | Description |
//! |---------|-------------|
//! | [`RayCastSection`] | Retry attempts and delay |
//! | [`PlannerSection`] | Probe spacing, cleanup length, character class |
//! | [`MazeSection`] | Grid cap and solve budgets |
//! | [`RecoverySection`] | Radial search for relocation |
//!
//! ```yaml
//! raycast:
//!   max_attempts: 3
//!   retry_delay_ms: 100
//! planner:
//!   probe_spacing: 0.5
//! maze:
//!   max_grid_cells: 45
//!   time_budget_ms: 2000
//! capsule:
//!   width: 0.5
//!   height: 1.8
//! ```

mod defaults;
mod error;
mod marga;
mod sections;

pub use error::ConfigLoadError;
pub use marga::MargaConfig;
pub use sections::{MazeSection, PlannerSection, RayCastSection, RecoverySection};
