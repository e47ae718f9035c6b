//! Beam sweeps across the capsule footprint.

use crate::core::WorldPoint;
use crate::core::geometry::perpendicular_on_ground;
use crate::world::{RayFilter, World};

use super::{Prober, RayCastError};

impl<W: World + ?Sized> Prober<'_, W> {
    /// Number of stacked probe rows for the capsule height.
    pub fn vertical_probe_count(&self) -> usize {
        let spacing = self.config.probe_spacing;
        if spacing <= 0.0 || !spacing.is_finite() {
            return 1;
        }
        ((self.capsule.height / spacing).floor() as usize).max(1)
    }

    /// Sweep the capsule from `start` to `end` and report the distance to the
    /// nearest non-walkable hit, measured along the segment.
    ///
    /// Rows are spread evenly over the capsule height; each row has three
    /// probes at the left edge, the centre and the right edge. With
    /// `want_nearest == false` the first hit found is returned. Returns
    /// `f32::INFINITY` when nothing blocks the sweep.
    pub fn cast_beam(
        &self,
        start: WorldPoint,
        end: WorldPoint,
        want_nearest: bool,
        filter: &RayFilter,
    ) -> Result<f32, RayCastError> {
        let dir = (end - start).normalize();
        let side = perpendicular_on_ground(start, end);
        let half_width = self.capsule.half_width();
        let rows = self.vertical_probe_count();
        let row_step = self.capsule.height / rows as f32;

        let mut nearest = f32::INFINITY;
        for row in 0..rows {
            let lift = (row as f32 + 0.5) * row_step;
            for offset in [-half_width, 0.0, half_width] {
                let shift = side * offset;
                let from = (start + shift).raised(lift);
                let to = (end + shift).raised(lift);
                if let Some(hit) = self.caster.first_obstacle(from, to, filter)? {
                    let along = (hit.point - from).dot(&dir).max(0.0);
                    if !want_nearest {
                        return Ok(along);
                    }
                    nearest = nearest.min(along);
                }
            }
        }
        Ok(nearest)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Capsule, WorldPoint};
    use crate::query::{ProbeConfig, Prober, RetryPolicy};
    use crate::sim::{SimBox, SimWorld};
    use crate::world::RayFilter;
    use approx::assert_relative_eq;

    fn config(spacing: f32) -> ProbeConfig {
        ProbeConfig {
            probe_spacing: spacing,
            retry: RetryPolicy::immediate(1),
            ..ProbeConfig::default()
        }
    }

    #[test]
    fn test_vertical_probe_count() {
        let world = SimWorld::flat(0.0);
        let prober = Prober::new(&world, Capsule::new(1.0, 2.0), config(0.5));
        assert_eq!(prober.vertical_probe_count(), 4);
        let prober = Prober::new(&world, Capsule::new(1.0, 2.0), config(5.0));
        assert_eq!(prober.vertical_probe_count(), 1);
    }

    #[test]
    fn test_clear_beam_is_infinite() {
        let world = SimWorld::flat(0.0);
        let prober = Prober::new(&world, Capsule::new(1.0, 2.0), config(0.5));
        let d = prober
            .cast_beam(
                WorldPoint::ZERO,
                WorldPoint::new(10.0, 0.0, 0.0),
                true,
                &RayFilter::land_excluded(),
            )
            .unwrap();
        assert!(d.is_infinite());
        // Four rows of three probes
        assert_eq!(world.ray_count(), 12);
    }

    #[test]
    fn test_nearest_hit_distance() {
        let mut world = SimWorld::flat(0.0);
        world.add_box(SimBox::obstacle(
            WorldPoint::new(5.0, -2.0, 0.0),
            WorldPoint::new(6.0, 2.0, 3.0),
        ));
        // Offset wall catches only the left edge probes
        world.add_box(SimBox::obstacle(
            WorldPoint::new(3.0, 0.3, 0.0),
            WorldPoint::new(3.5, 2.0, 3.0),
        ));
        let prober = Prober::new(&world, Capsule::new(1.0, 2.0), config(0.5));
        let d = prober
            .cast_beam(
                WorldPoint::ZERO,
                WorldPoint::new(10.0, 0.0, 0.0),
                true,
                &RayFilter::land_excluded(),
            )
            .unwrap();
        assert_relative_eq!(d, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_walkable_objects_do_not_block() {
        let mut world = SimWorld::flat(0.0);
        world.add_box(SimBox::walkable(
            WorldPoint::new(2.0, -2.0, 0.0),
            WorldPoint::new(4.0, 2.0, 3.0),
        ));
        let prober = Prober::new(&world, Capsule::new(1.0, 2.0), config(0.5));
        let d = prober
            .cast_beam(
                WorldPoint::ZERO,
                WorldPoint::new(10.0, 0.0, 0.0),
                false,
                &RayFilter::land_excluded(),
            )
            .unwrap();
        assert!(d.is_infinite());
    }

    #[test]
    fn test_error_short_circuits() {
        let mut world = SimWorld::flat(0.0);
        world.fail_rays(vec![-3], None);
        let prober = Prober::new(&world, Capsule::new(1.0, 2.0), config(0.5));
        let err = prober
            .cast_beam(
                WorldPoint::ZERO,
                WorldPoint::new(10.0, 0.0, 0.0),
                true,
                &RayFilter::land_excluded(),
            )
            .unwrap_err();
        assert_eq!(err.status, -3);
        assert_eq!(world.ray_count(), 1);
    }
}
