//! Segment clearance and single-cell occupancy.

use log::trace;

use crate::core::WorldPoint;
use crate::core::geometry::{
    COLLINEAR_TOLERANCE, ground_direction, is_collinear_xy, perpendicular_on_ground,
};
use crate::world::{RayFilter, World};

use super::{Prober, RayCastError};

/// Segments shorter than this are clear without probing (1 cm).
pub const MIN_CLEAR_SPAN: f32 = 0.01;

/// Result of probing one cell-sized step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellProbe {
    /// The cell can be stood in; `elevation` is the ground height found.
    Clear { elevation: f32 },
    /// Something non-walkable is in the way, or there is no ground.
    Occupied,
}

impl CellProbe {
    /// Occupied?
    #[inline]
    pub fn is_occupied(&self) -> bool {
        matches!(self, CellProbe::Occupied)
    }

    /// Ground elevation when clear.
    #[inline]
    pub fn elevation(&self) -> Option<f32> {
        match self {
            CellProbe::Clear { elevation } => Some(*elevation),
            CellProbe::Occupied => None,
        }
    }
}

impl<W: World + ?Sized> Prober<'_, W> {
    /// Can the capsule travel straight from `start` to `end`?
    ///
    /// Needs both a static terrain path that does not bend and a clean beam
    /// sweep with terrain excluded.
    pub fn path_clear(&self, start: WorldPoint, end: WorldPoint) -> Result<bool, RayCastError> {
        if start.distance(&end) < MIN_CLEAR_SPAN {
            return Ok(true);
        }

        let route = self.world().static_path(
            start,
            end,
            self.capsule.half_width(),
            self.config.character,
        );
        if route.status != 0 {
            trace!("[Obstacle] static path status {}", route.status);
            return Ok(false);
        }
        if route.points.len() > 2 {
            let first = route.points[0];
            let last = route.points[route.points.len() - 1];
            let straight = route.points[1..route.points.len() - 1]
                .iter()
                .all(|&p| is_collinear_xy(first, p, last, COLLINEAR_TOLERANCE));
            if !straight {
                trace!("[Obstacle] static path bends ({} points)", route.points.len());
                return Ok(false);
            }
        }

        let distance = self.cast_beam(start, end, false, &RayFilter::land_excluded())?;
        Ok(distance.is_infinite())
    }

    /// Probe a single forward step from the known-clear `from` into the cell
    /// centred on `to`.
    ///
    /// The centre must have walkable ground below it. Forward probes run from
    /// `from` to the leading edge, one probe crosses the cell at mid height,
    /// and the left, right and leading edges are probed downward. The
    /// trailing edge is only probed when `check_all_corners` is set.
    pub fn probe_cell(
        &self,
        from: WorldPoint,
        to: WorldPoint,
        width: f32,
        height: f32,
        check_all_corners: bool,
    ) -> Result<CellProbe, RayCastError> {
        let filter = RayFilter::default();
        let caster = &self.caster;

        // Ground under the centre
        let hits = caster.cast(to.raised(height), to.raised(-height), &filter)?;
        let elevation = match hits.first() {
            Some(hit) if hit.is_walkable() => hit.point.z,
            _ => return Ok(CellProbe::Occupied),
        };
        let centre = to.with_z(elevation);

        let dir = ground_direction(from, to);
        let side = perpendicular_on_ground(from, to);
        let half = width * 0.5;
        let leading = centre + dir * half;

        let forward_probes = (height / width).ceil().clamp(3.0, 4.0) as usize;
        for i in 0..forward_probes {
            let lift = (i as f32 + 0.5) * height / forward_probes as f32;
            if caster
                .first_obstacle(from.raised(lift), leading.raised(lift), &filter)?
                .is_some()
            {
                return Ok(CellProbe::Occupied);
            }
        }

        let mid = height * 0.5;
        let left = centre + side * half;
        let right = centre - side * half;
        if caster
            .first_obstacle(left.raised(mid), right.raised(mid), &filter)?
            .is_some()
        {
            return Ok(CellProbe::Occupied);
        }

        let mut edges = vec![left, right, leading];
        if check_all_corners {
            edges.push(centre - dir * half);
        }
        for edge in edges {
            if caster
                .first_obstacle(edge.raised(height), edge.raised(-height), &filter)?
                .is_some()
            {
                return Ok(CellProbe::Occupied);
            }
        }

        Ok(CellProbe::Clear { elevation })
    }

    /// [`Prober::probe_cell`] reduced to a yes/no answer.
    pub fn cell_occupied(
        &self,
        from: WorldPoint,
        to: WorldPoint,
        width: f32,
        height: f32,
        check_all_corners: bool,
    ) -> Result<bool, RayCastError> {
        Ok(self
            .probe_cell(from, to, width, height, check_all_corners)?
            .is_occupied())
    }

    /// Full-corner probe of a standing position using the capsule size,
    /// approached from one width back along `heading`.
    pub fn probe_position(
        &self,
        position: WorldPoint,
        heading: WorldPoint,
    ) -> Result<CellProbe, RayCastError> {
        let width = self.capsule.width;
        let dir = heading.flatten().normalize();
        let dir = if dir.length() < f32::EPSILON {
            WorldPoint::new(1.0, 0.0, 0.0)
        } else {
            dir
        };
        self.probe_cell(
            position - dir * width,
            position,
            width,
            self.capsule.height,
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Capsule;
    use crate::query::{ProbeConfig, RetryPolicy};
    use crate::sim::{SimBox, SimWorld, Terrain};
    use approx::assert_relative_eq;

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
    fn test_short_segment_is_clear_without_probing() {
        let world = SimWorld::flat(0.0);
        let p = prober(&world);
        let a = WorldPoint::new(1.0, 1.0, 0.0);
        assert!(p.path_clear(a, a + WorldPoint::new(0.005, 0.0, 0.0)).unwrap());
        assert_eq!(world.ray_count(), 0);
        assert_eq!(world.static_query_count(), 0);
    }

    #[test]
    fn test_path_clear_and_blocked() {
        let mut world = SimWorld::flat(0.0);
        world.add_box(SimBox::obstacle(
            WorldPoint::new(4.0, 1.0, 0.0),
            WorldPoint::new(5.0, 3.0, 2.0),
        ));
        let p = prober(&world);
        assert!(p.path_clear(WorldPoint::ZERO, WorldPoint::new(10.0, 0.0, 0.0)).unwrap());
        assert!(!p.path_clear(WorldPoint::ZERO, WorldPoint::new(10.0, 2.0, 0.0)).unwrap());
    }

    #[test]
    fn test_failed_static_path_is_not_clear() {
        let mut world = SimWorld::flat(0.0);
        world.set_static_path_status(7);
        let p = prober(&world);
        assert!(!p.path_clear(WorldPoint::ZERO, WorldPoint::new(10.0, 0.0, 0.0)).unwrap());
        assert_eq!(world.ray_count(), 0);
    }

    #[test]
    fn test_ramp_static_path_counts_as_straight() {
        let world = SimWorld::new(Terrain::Ramp {
            height: 0.0,
            slope: 0.2,
        });
        let p = prober(&world);
        let start = WorldPoint::new(0.0, 0.0, 0.0);
        let end = WorldPoint::new(10.0, 0.0, 2.0);
        assert!(p.path_clear(start, end).unwrap());
    }

    #[test]
    fn test_probe_cell_resolves_elevation() {
        let world = SimWorld::new(Terrain::Ramp {
            height: 1.0,
            slope: 0.1,
        });
        let p = prober(&world);
        let probe = p
            .probe_cell(
                WorldPoint::new(2.0, 0.0, 1.2),
                WorldPoint::new(3.0, 0.0, 1.2),
                1.0,
                2.0,
                false,
            )
            .unwrap();
        assert_relative_eq!(probe.elevation().unwrap(), 1.3, epsilon = 1e-4);
    }

    #[test]
    fn test_probe_cell_occupied_by_box() {
        let mut world = SimWorld::flat(0.0);
        world.add_box(SimBox::obstacle(
            WorldPoint::new(2.6, -0.2, 0.0),
            WorldPoint::new(2.9, 0.2, 1.0),
        ));
        let p = prober(&world);
        let from = WorldPoint::new(2.0, 0.0, 0.0);
        let to = WorldPoint::new(3.0, 0.0, 0.0);
        assert!(p.cell_occupied(from, to, 1.0, 2.0, false).unwrap());
    }

    #[test]
    fn test_trailing_edge_only_with_all_corners() {
        let mut world = SimWorld::flat(0.0);
        // Low kerb on the trailing edge, under the lowest forward probe
        world.add_box(SimBox::obstacle(
            WorldPoint::new(2.45, -0.05, 0.0),
            WorldPoint::new(2.55, 0.05, 0.2),
        ));
        let p = prober(&world);
        let from = WorldPoint::new(2.0, 0.0, 0.0);
        let to = WorldPoint::new(3.0, 0.0, 0.0);
        assert!(!p.cell_occupied(from, to, 1.0, 2.0, false).unwrap());
        assert!(p.cell_occupied(from, to, 1.0, 2.0, true).unwrap());
    }

    #[test]
    fn test_no_ground_is_occupied() {
        let world = SimWorld::flat(-10.0);
        let p = prober(&world);
        assert!(
            p.cell_occupied(WorldPoint::ZERO, WorldPoint::new(1.0, 0.0, 0.0), 1.0, 2.0, false)
                .unwrap()
        );
    }
}
