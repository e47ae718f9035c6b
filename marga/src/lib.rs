//! # Marga: Capsule Path Planning over Ray-Cast Worlds
//!
//! Plans walkable routes for an upright capsule-shaped character through a
//! 3D world that can only be interrogated by ray casts and a coarse static
//! path query.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marga::core::{Capsule, WorldPoint};
//! use marga::path::{initial_path, prepare};
//! use marga::query::{ProbeConfig, Prober};
//! use marga::sim::{SimBox, SimWorld};
//!
//! let mut world = SimWorld::flat(0.0);
//! world.add_box(SimBox::centred(10.0, 0.0, 4.0, 4.0, 4.0));
//!
//! let prober = Prober::new(&world, Capsule::new(1.0, 2.0), ProbeConfig::default());
//! let start = WorldPoint::new(0.0, 0.0, 0.0);
//! let goal = WorldPoint::new(20.0, 0.0, 0.0);
//!
//! let raw = initial_path(&prober, start, goal).unwrap();
//! let segmentation = prepare(&prober, &raw, 0.1).unwrap();
//! for segment in &segmentation.segments {
//!     println!("{:?}: {:?}", segment.kind, segment.points);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: points, poses, the capsule and grid/world geometry
//! - [`world`]: the [`World`] trait every environment implements
//! - [`query`]: retried ray casts, capsule beams and cell probes
//! - [`path`]: cleanup, straightening and clear/blocked segmentation
//! - [`maze`]: grid detours around blocked segments
//! - [`recovery`]: relocation targets for stuck characters
//! - [`sim`]: box-and-terrain world for tests and the CLI
//! - [`config`]: YAML configuration
//! - [`status`]: the [`PathStatus`] taxonomy reported to callers
//!
//! ## Data Flow
//!
//! ```text
//!   static path ──► clean ──► straighten ──► segment ──┬──► clear segments
//!                                                      │
//!                                                      └──► blocked segments
//!                                                              │
//!                                                              ▼
//!                                                         maze solver ──► detours
//! ```
//!
//! ## Coordinate Frame
//!
//! Z is up. Elevation is carried on every planned point; all "horizontal"
//! measurements (directions, grid axes, collinearity of static paths) are
//! taken in the XY plane.

pub mod config;
pub mod core;
pub mod error;
pub mod maze;
pub mod path;
pub mod query;
pub mod recovery;
pub mod sim;
pub mod status;
pub mod world;

pub use config::{ConfigLoadError, MargaConfig};
pub use core::{Capsule, GridCoord, GridFrame, Pose, WorldPoint};
pub use error::{PlanError, Result};
pub use maze::{MazeError, MazeLimits, MazeSolution, solve_maze};
pub use path::{Segment, SegmentKind, Segmentation};
pub use query::{CellProbe, ProbeConfig, Prober, RayCastError};
pub use recovery::{RecoverySettings, RecoveryTarget, find_recovery_target};
pub use sim::{SimBox, SimWorld};
pub use status::PathStatus;
pub use world::{CharacterClass, RayFilter, RayHit, World};
