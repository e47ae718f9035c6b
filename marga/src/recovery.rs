//! Relocation target search for stuck characters.
//!
//! Previously-good waypoints are tried newest first; a waypoint qualifies when
//! it lies at least one capsule width from the current position, the capsule
//! still fits there and the static path query reaches it from the current
//! position. When none qualifies, rings of candidates around the
//! current position are tried, nearest ring first.

use std::f32::consts::TAU;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::WorldPoint;
use crate::query::{CellProbe, Prober, RayCastError};
use crate::world::World;

/// Radial search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoverySettings {
    /// Largest ring radius (meters)
    pub search_radius: f32,
    /// Candidates per ring
    pub ring_samples: usize,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            search_radius: 4.0,
            ring_samples: 8,
        }
    }
}

/// Where a relocation target came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSource {
    /// Index into the supplied waypoint list
    Waypoint(usize),
    /// Radial search around the current position
    Search,
}

/// A verified relocation target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveryTarget {
    /// Standing position, at probed ground elevation
    pub position: WorldPoint,
    pub source: TargetSource,
}

/// Pick a place to relocate to from `current`.
///
/// `waypoints` are ordered oldest first. Returns `None` when neither a
/// waypoint nor the radial search yields a clear, reachable position.
pub fn find_recovery_target<W: World + ?Sized>(
    prober: &Prober<'_, W>,
    current: WorldPoint,
    waypoints: &[WorldPoint],
    settings: &RecoverySettings,
) -> Result<Option<RecoveryTarget>, RayCastError> {
    let width = prober.capsule().width;
    for (index, &waypoint) in waypoints.iter().enumerate().rev() {
        // Standing on it already; relocating there changes nothing
        if waypoint.distance_xy(&current) < width {
            debug!("[Recovery] waypoint {} is the current position, skipped", index);
            continue;
        }
        if let Some(position) = usable(prober, current, waypoint)? {
            debug!("[Recovery] waypoint {} at {:?} is usable", index, position);
            return Ok(Some(RecoveryTarget {
                position,
                source: TargetSource::Waypoint(index),
            }));
        }
    }

    let step = width;
    if !(step > 0.0) || settings.ring_samples == 0 {
        return Ok(None);
    }

    let rings = (settings.search_radius / step).floor() as usize;
    for ring in 1..=rings {
        let radius = ring as f32 * step;
        for k in 0..settings.ring_samples {
            let angle = TAU * k as f32 / settings.ring_samples as f32;
            let candidate = current + WorldPoint::new(angle.cos(), angle.sin(), 0.0) * radius;
            if let Some(position) = usable(prober, current, candidate)? {
                debug!(
                    "[Recovery] radial search found {:?} at radius {:.2}",
                    position, radius
                );
                return Ok(Some(RecoveryTarget {
                    position,
                    source: TargetSource::Search,
                }));
            }
        }
    }

    debug!("[Recovery] nothing usable within {:.1} m", settings.search_radius);
    Ok(None)
}

/// Probed position of `target` when it is clear and statically reachable.
fn usable<W: World + ?Sized>(
    prober: &Prober<'_, W>,
    current: WorldPoint,
    target: WorldPoint,
) -> Result<Option<WorldPoint>, RayCastError> {
    if !target.is_finite() {
        return Ok(None);
    }
    let elevation = match prober.probe_position(target, target - current)? {
        CellProbe::Clear { elevation } => elevation,
        CellProbe::Occupied => return Ok(None),
    };
    let route = prober.world().static_path(
        current,
        target,
        prober.capsule().half_width(),
        prober.config().character,
    );
    Ok((route.status == 0).then(|| target.with_z(elevation)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Capsule;
    use crate::query::{ProbeConfig, RetryPolicy};
    use crate::sim::{SimBounds, SimBox, SimWorld};
    use approx::assert_relative_eq;

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
    fn test_newest_clear_waypoint_wins() {
        let world = SimWorld::flat(0.0);
        let p = prober(&world);
        let waypoints = [pt(0.0, 0.0), pt(3.0, 0.0), pt(6.0, 0.0)];
        let target = find_recovery_target(&p, pt(8.0, 0.0), &waypoints, &RecoverySettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(target.source, TargetSource::Waypoint(2));
        assert_eq!(target.position, pt(6.0, 0.0));
    }

    #[test]
    fn test_skips_waypoint_at_current_position() {
        let world = SimWorld::flat(0.0);
        let p = prober(&world);
        let current = pt(7.0, 0.0);
        let waypoints = [pt(0.0, 0.0), pt(7.0, 0.0)];
        let target = find_recovery_target(&p, current, &waypoints, &RecoverySettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(target.source, TargetSource::Waypoint(0));
        assert_eq!(target.position, pt(0.0, 0.0));

        // Closer than one width counts as standing on it
        let waypoints = [pt(0.0, 0.0), pt(7.6, 0.3)];
        let target = find_recovery_target(&p, current, &waypoints, &RecoverySettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(target.source, TargetSource::Waypoint(0));
    }

    #[test]
    fn test_only_current_position_known_falls_back_to_search() {
        let world = SimWorld::flat(0.0);
        let p = prober(&world);
        let current = pt(7.0, 0.0);
        let target = find_recovery_target(&p, current, &[current], &RecoverySettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(target.source, TargetSource::Search);
        assert!(target.position.distance_xy(&current) >= 1.0 - 1e-4);
    }

    #[test]
    fn test_skips_blocked_waypoint() {
        let mut world = SimWorld::flat(0.0);
        world.add_box(SimBox::centred(6.0, 0.0, 1.0, 1.0, 3.0));
        let p = prober(&world);
        let waypoints = [pt(0.0, 0.0), pt(3.0, 0.0), pt(6.0, 0.0)];
        let target = find_recovery_target(&p, pt(8.0, 2.0), &waypoints, &RecoverySettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(target.source, TargetSource::Waypoint(1));
    }

    #[test]
    fn test_skips_unreachable_waypoint() {
        let mut world = SimWorld::flat(0.0);
        world.set_bounds(SimBounds {
            min_x: -1.0,
            min_y: -5.0,
            max_x: 10.0,
            max_y: 5.0,
        });
        let p = prober(&world);
        let waypoints = [pt(2.0, 0.0), pt(-3.0, 0.0)];
        let target = find_recovery_target(&p, pt(4.0, 0.0), &waypoints, &RecoverySettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(target.source, TargetSource::Waypoint(0));
    }

    #[test]
    fn test_radial_search_when_stuck() {
        let mut world = SimWorld::flat(0.0);
        world.add_box(SimBox::centred(0.0, 0.0, 1.5, 1.5, 3.0));
        let p = prober(&world);

        let target = find_recovery_target(&p, pt(0.0, 0.0), &[], &RecoverySettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(target.source, TargetSource::Search);
        assert_relative_eq!(target.position.x, 2.0, epsilon = 1e-4);
        assert_relative_eq!(target.position.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_nothing_found() {
        let mut world = SimWorld::flat(0.0);
        world.add_box(SimBox::centred(0.0, 0.0, 20.0, 20.0, 3.0));
        let p = prober(&world);
        let settings = RecoverySettings {
            search_radius: 2.0,
            ring_samples: 4,
        };
        assert_eq!(
            find_recovery_target(&p, pt(0.0, 0.0), &[pt(1.0, 1.0)], &settings).unwrap(),
            None
        );
    }
}
