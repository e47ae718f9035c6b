//! MargaNav - task runtime for the marga planner
//!
//! Runs path planning as independent tasks on named threads that talk only
//! over typed channels:
//!
//! - **Planner**: endpoint checks, static path, straightening, segmentation
//! - **Maze**: detours around blocked spans
//! - **Executor**: orders segments by sequence number and drives a
//!   [`MotionSink`]; sole writer of the [`SharedPose`]
//! - **Recovery**: finds a known good position after a recoverable failure
//!
//! The [`Navigator`] is the caller side: fresh request ids, one terminal
//! outcome per request, stale outcomes dropped, retry and recovery policy.
//!
//! ```rust,ignore
//! let world: SharedWorld = Arc::new(SimWorld::load(Path::new("scene.yaml"))?);
//! let mut navigator = Navigator::start(NavConfig::default(), world, Pose::default(), TracingSink);
//! let report = navigator.navigate(WorldPoint::new(20.0, 0.0, 0.0))?;
//! navigator.shutdown();
//! ```

pub mod config;
pub mod error;
pub mod messages;
pub mod navigator;
pub mod shared;
pub mod threads;

pub use config::NavConfig;
pub use error::{NavError, Result};
pub use messages::{Outcome, RequestId, SegmentRecord};
pub use navigator::{NavReport, Navigator};
pub use shared::SharedPose;
pub use threads::{MotionSink, SharedWorld, TracingSink};
