//! Path cleanup and straightening.
//!
//! - [`clean`]: drop points crowded against their predecessor
//! - [`merge_collinear`]: drop points lying on the line through their neighbours
//! - [`straighten`]: greedy shortcuts certified by [`Prober::path_clear`]

use log::debug;

use crate::core::WorldPoint;
use crate::core::geometry::{COLLINEAR_TOLERANCE, is_collinear};
use crate::query::{Prober, RayCastError};
use crate::world::World;

/// Drop points closer than `min_segment_length` to the previously kept
/// point. The first and last points always survive.
pub fn clean(points: &[WorldPoint], min_segment_length: f32) -> Vec<WorldPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points[points.len() - 1];
    let mut result = vec![points[0]];
    for &p in &points[1..points.len() - 1] {
        if let Some(prev) = result.last()
            && p.distance(prev) >= min_segment_length
        {
            result.push(p);
        }
    }
    // The goal wins over a kept point crowding it
    while result.len() > 1
        && result
            .last()
            .is_some_and(|prev| prev.distance(&last) < min_segment_length)
    {
        result.pop();
    }
    result.push(last);
    result
}

/// Remove every point that is collinear with its neighbours (within 2 cm)
/// and lies between them. Duplicate points collapse too.
pub fn merge_collinear(points: &[WorldPoint]) -> Vec<WorldPoint> {
    let mut result: Vec<WorldPoint> = Vec::with_capacity(points.len());
    for &p in points {
        while result.len() >= 2 {
            let n = result.len();
            if is_collinear(result[n - 2], result[n - 1], p, COLLINEAR_TOLERANCE) {
                result.pop();
            } else {
                break;
            }
        }
        result.push(p);
    }
    result
}

/// Shortcut the path wherever the capsule can travel straight.
///
/// A three-point window slides along the path; when the outer points see
/// each other the middle point is deleted and the window steps back one
/// place, otherwise it advances. Passes repeat until nothing changes, so the
/// output is a fixpoint: no collinear triple remains and straightening it
/// again is a no-op.
pub fn straighten<W: World + ?Sized>(
    points: &[WorldPoint],
    prober: &Prober<'_, W>,
) -> Result<Vec<WorldPoint>, RayCastError> {
    let mut path = merge_collinear(points);
    let mut passes = 0usize;

    loop {
        passes += 1;
        let before = path.len();

        let mut i = 0;
        while i + 2 < path.len() {
            if prober.path_clear(path[i], path[i + 2])? {
                path.remove(i + 1);
                i = i.saturating_sub(1);
            } else {
                i += 1;
            }
        }
        path = merge_collinear(&path);

        if path.len() == before {
            break;
        }
    }

    debug!(
        "[Straighten] {} -> {} points in {} passes",
        points.len(),
        path.len(),
        passes
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Capsule;
    use crate::query::{ProbeConfig, RetryPolicy};
    use crate::sim::{SimBox, SimWorld};

    fn pt(x: f32, y: f32) -> WorldPoint {
        WorldPoint::new(x, y, 0.0)
    }

    fn prober(world: &SimWorld) -> Prober<'_, SimWorld> {
        Prober::new(
            world,
            Capsule::new(1.0, 2.0),
            ProbeConfig {
                retry: RetryPolicy::immediate(1),
                ..ProbeConfig::default()
            },
        )
    }

    #[test]
    fn test_clean_keeps_endpoints() {
        let path = vec![pt(0.0, 0.0), pt(0.05, 0.0), pt(1.0, 0.0), pt(1.02, 0.0), pt(1.05, 0.0)];
        let cleaned = clean(&path, 0.1);
        assert_eq!(cleaned, vec![pt(0.0, 0.0), pt(1.05, 0.0)]);
    }

    #[test]
    fn test_clean_short_path_untouched() {
        let path = vec![pt(0.0, 0.0), pt(0.01, 0.0)];
        assert_eq!(clean(&path, 0.1), path);
    }

    #[test]
    fn test_merge_collinear() {
        let path = vec![
            pt(0.0, 0.0),
            pt(1.0, 0.005),
            pt(2.0, 0.0),
            pt(2.0, 0.0),
            pt(2.0, 3.0),
        ];
        assert_eq!(
            merge_collinear(&path),
            vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(2.0, 3.0)]
        );
    }

    #[test]
    fn test_merge_keeps_reversal() {
        let path = vec![pt(0.0, 0.0), pt(4.0, 0.0), pt(2.0, 0.0)];
        assert_eq!(merge_collinear(&path), path);
    }

    #[test]
    fn test_straighten_open_field() {
        let world = SimWorld::flat(0.0);
        let p = prober(&world);
        let path = vec![pt(0.0, 0.0), pt(3.0, 4.0), pt(6.0, 0.0), pt(9.0, 4.0)];
        let straight = straighten(&path, &p).unwrap();
        assert_eq!(straight, vec![pt(0.0, 0.0), pt(9.0, 4.0)]);
    }

    #[test]
    fn test_straighten_keeps_corner_around_wall() {
        let mut world = SimWorld::flat(0.0);
        world.add_box(SimBox::centred(5.0, 0.0, 1.0, 6.0, 3.0));
        let p = prober(&world);
        let path = vec![pt(0.0, 0.0), pt(2.0, 5.0), pt(5.0, 5.0), pt(8.0, 5.0), pt(10.0, 0.0)];
        let straight = straighten(&path, &p).unwrap();
        assert_eq!(straight.first(), Some(&pt(0.0, 0.0)));
        assert_eq!(straight.last(), Some(&pt(10.0, 0.0)));
        assert!(straight.len() >= 3);
        for w in straight.windows(2) {
            assert!(p.path_clear(w[0], w[1]).unwrap());
        }
        let again = straighten(&straight, &p).unwrap();
        assert_eq!(again, straight);
    }
}
