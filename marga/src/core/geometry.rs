//! Geometry utilities: line distances, collinearity and the grid projection.

use serde::{Deserialize, Serialize};

use super::point::{GridCoord, WorldPoint};

/// Tolerance for collinearity tests (2 cm).
pub const COLLINEAR_TOLERANCE: f32 = 0.02;

/// Distance from `p` to the infinite line through `a` and `b`.
///
/// Degenerate lines (a == b) fall back to the distance from `a`.
pub fn distance_to_line(p: WorldPoint, a: WorldPoint, b: WorldPoint) -> f32 {
    let ab = b - a;
    let len = ab.length();
    if len < f32::EPSILON {
        return p.distance(&a);
    }
    (p - a).cross(&ab).length() / len
}

/// Parameter of the projection of `p` onto segment a→b (0 at a, 1 at b).
pub fn projection_parameter(p: WorldPoint, a: WorldPoint, b: WorldPoint) -> f32 {
    let ab = b - a;
    let len_sq = ab.dot(&ab);
    if len_sq < f32::EPSILON {
        return 0.0;
    }
    (p - a).dot(&ab) / len_sq
}

/// True when `b` lies on the line a→c within `tolerance` and between the ends.
///
/// A `b` that doubles back past either end is not collinear: removing it
/// would change the route.
pub fn is_collinear(a: WorldPoint, b: WorldPoint, c: WorldPoint, tolerance: f32) -> bool {
    if distance_to_line(b, a, c) > tolerance {
        return false;
    }
    let t = projection_parameter(b, a, c);
    let slack = tolerance / a.distance(&c).max(tolerance);
    (-slack..=1.0 + slack).contains(&t)
}

/// Collinearity measured in the ground plane only.
pub fn is_collinear_xy(a: WorldPoint, b: WorldPoint, c: WorldPoint, tolerance: f32) -> bool {
    is_collinear(a.flatten(), b.flatten(), c.flatten(), tolerance)
}

/// Unit direction from `from` to `to` projected onto the ground plane.
///
/// Vertical or zero-length segments give +X.
pub fn ground_direction(from: WorldPoint, to: WorldPoint) -> WorldPoint {
    let d = (to - from).flatten();
    if d.length() < f32::EPSILON {
        WorldPoint::new(1.0, 0.0, 0.0)
    } else {
        d.normalize()
    }
}

/// Unit vector on the ground plane, perpendicular to from→to, pointing left.
pub fn perpendicular_on_ground(from: WorldPoint, to: WorldPoint) -> WorldPoint {
    let d = ground_direction(from, to);
    WorldPoint::new(-d.y, d.x, 0.0)
}

/// Rigid mapping between maze grid cells and world positions.
///
/// Cell (0, 0) is centred on `origin`; the grid +X axis points along `yaw`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridFrame {
    origin: WorldPoint,
    cell_size: f32,
    yaw: f32,
}

impl GridFrame {
    /// Create a frame. `cell_size` must be positive.
    pub fn new(origin: WorldPoint, cell_size: f32, yaw: f32) -> Self {
        Self {
            origin: origin.flatten(),
            cell_size,
            yaw,
        }
    }

    /// Frame whose +X axis runs from `start` toward `end`, with `start`
    /// landing on the centre of `start_cell`.
    pub fn aligned(
        start: WorldPoint,
        end: WorldPoint,
        cell_size: f32,
        start_cell: GridCoord,
    ) -> Self {
        let dir = ground_direction(start, end);
        let yaw = dir.y.atan2(dir.x);
        let offset = rotate(
            start_cell.x as f32 * cell_size,
            start_cell.y as f32 * cell_size,
            yaw,
        );
        Self::new(start.flatten() - offset, cell_size, yaw)
    }

    /// Side length of a cell in meters.
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position of a cell centre at elevation `z`.
    pub fn cell_to_world(&self, coord: GridCoord, z: f32) -> WorldPoint {
        let offset = rotate(
            coord.x as f32 * self.cell_size,
            coord.y as f32 * self.cell_size,
            self.yaw,
        );
        (self.origin + offset).with_z(z)
    }

    /// Nearest cell to a world position (elevation ignored).
    pub fn world_to_cell(&self, point: WorldPoint) -> GridCoord {
        let local = point.flatten() - self.origin;
        let back = rotate(local.x, local.y, -self.yaw);
        GridCoord::new(
            (back.x / self.cell_size).round() as i32,
            (back.y / self.cell_size).round() as i32,
        )
    }
}

#[inline]
fn rotate(x: f32, y: f32, angle: f32) -> WorldPoint {
    let (sin_a, cos_a) = angle.sin_cos();
    WorldPoint::new(x * cos_a - y * sin_a, x * sin_a + y * cos_a, 0.0)
}
