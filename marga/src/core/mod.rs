//! Core types for the marga planning library.
//!
//! - [`GridCoord`] and [`WorldPoint`]: coordinate types
//! - [`Pose`]: character pose (position + heading)
//! - [`Capsule`]: the collision envelope of the navigating character
//! - [`geometry`]: line math and the grid-to-world projection

mod capsule;
pub mod geometry;
mod point;
mod pose;

pub use capsule::Capsule;
pub use geometry::GridFrame;
pub use point::{GridCoord, WorldPoint};
pub use pose::{Pose, normalize_angle};
