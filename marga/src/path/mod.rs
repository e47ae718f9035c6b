//! Path preparation: acquisition, cleanup, straightening and segmentation.
//!
//! The usual pipeline for one request:
//!
//! ```rust,ignore
//! let raw = initial_path(&prober, start, goal)?;
//! let raw = stop_short(&raw, 1.0);
//! let segmentation = prepare(&prober, &raw, config.planner.min_segment_length)?;
//! for segment in segmentation.blocked() {
//!     // hand to the maze solver
//! }
//! ```

mod segment;
mod straighten;

pub use segment::{PathPos, Segment, SegmentKind, Segmentation, segment_path};
pub use straighten::{clean, merge_collinear, straighten};

use log::debug;

use crate::core::WorldPoint;
use crate::error::{PlanError, Result};
use crate::query::Prober;
use crate::world::World;

/// Straight-line path from the environment's static path query.
pub fn initial_path<W: World + ?Sized>(
    prober: &Prober<'_, W>,
    start: WorldPoint,
    goal: WorldPoint,
) -> Result<Vec<WorldPoint>> {
    if !start.is_finite() || !goal.is_finite() {
        return Err(PlanError::NonFinite);
    }
    let route = prober.world().static_path(
        start,
        goal,
        prober.capsule().half_width(),
        prober.config().character,
    );
    if route.status != 0 {
        debug!("[Path] static path query failed with status {}", route.status);
        return Err(PlanError::StaticPath(route.status));
    }
    let mut points = route.points;
    if points.len() < 2 {
        points = vec![start, goal];
    }
    Ok(points)
}

/// Pull the end of the path back by `distance` along its final legs.
///
/// A path shorter than `distance` collapses onto its start.
pub fn stop_short(points: &[WorldPoint], distance: f32) -> Vec<WorldPoint> {
    if distance <= 0.0 || points.len() < 2 {
        return points.to_vec();
    }

    let mut result = points.to_vec();
    let mut remaining = distance;
    while result.len() >= 2 {
        let n = result.len();
        let (a, b) = (result[n - 2], result[n - 1]);
        let leg = a.distance(&b);
        if leg > remaining {
            result[n - 1] = b.lerp(&a, remaining / leg);
            return result;
        }
        remaining -= leg;
        result.pop();
    }
    vec![points[0], points[0]]
}

/// Clean, straighten and segment a raw path.
pub fn prepare<W: World + ?Sized>(
    prober: &Prober<'_, W>,
    points: &[WorldPoint],
    min_segment_length: f32,
) -> Result<Segmentation> {
    let cleaned = clean(points, min_segment_length);
    let straight = straighten(&cleaned, prober)?;
    segment_path(prober, &straight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pt(x: f32, y: f32) -> WorldPoint {
        WorldPoint::new(x, y, 0.0)
    }

    #[test]
    fn test_stop_short_within_last_leg() {
        let path = stop_short(&[pt(0.0, 0.0), pt(4.0, 0.0), pt(4.0, 3.0)], 1.0);
        assert_eq!(path.len(), 3);
        assert_relative_eq!(path[2].y, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_stop_short_across_legs() {
        let path = stop_short(&[pt(0.0, 0.0), pt(4.0, 0.0), pt(4.0, 3.0)], 4.0);
        assert_eq!(path.len(), 2);
        assert_relative_eq!(path[1].x, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_stop_short_past_start() {
        let path = stop_short(&[pt(1.0, 1.0), pt(2.0, 1.0)], 5.0);
        assert_eq!(path, vec![pt(1.0, 1.0), pt(1.0, 1.0)]);
    }
}
