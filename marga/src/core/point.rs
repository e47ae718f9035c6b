//! Point and coordinate types.
//!
//! World positions are 3D because every planned point carries the terrain
//! elevation it was probed at. Grid positions are integer cell indices; their
//! elevation travels alongside them.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Grid coordinates (integer cell indices)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// X coordinate (column index)
    pub x: i32,
    /// Y coordinate (row index)
    pub y: i32,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate
    #[inline]
    pub fn manhattan_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Get the 4 cardinal neighbors (N, E, S, W)
    #[inline]
    pub fn neighbors_4(&self) -> [GridCoord; 4] {
        [
            GridCoord::new(self.x, self.y + 1), // North
            GridCoord::new(self.x + 1, self.y), // East
            GridCoord::new(self.x, self.y - 1), // South
            GridCoord::new(self.x - 1, self.y), // West
        ]
    }
}

impl Add for GridCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        GridCoord::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for GridCoord {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        GridCoord::new(self.x - other.x, self.y - other.y)
    }
}

/// World coordinates (meters, f32). Z is up.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
    /// Elevation in meters
    #[serde(default)]
    pub z: f32,
}

impl WorldPoint {
    /// Create a new world point
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero point (origin)
    pub const ZERO: WorldPoint = WorldPoint {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Unit vector pointing up.
    pub const UP: WorldPoint = WorldPoint {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &WorldPoint) -> f32 {
        (*self - *other).length()
    }

    /// Distance measured in the ground plane only.
    #[inline]
    pub fn distance_xy(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Length (magnitude) of this point as a vector from origin
    #[inline]
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize to unit length. Zero vectors are returned unchanged.
    #[inline]
    pub fn normalize(&self) -> WorldPoint {
        let len = self.length();
        if len > 0.0 { *self * (1.0 / len) } else { *self }
    }

    /// Projection onto the ground plane (z dropped).
    #[inline]
    pub fn flatten(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y, 0.0)
    }

    /// Same position with a different elevation.
    #[inline]
    pub fn with_z(&self, z: f32) -> WorldPoint {
        WorldPoint::new(self.x, self.y, z)
    }

    /// Raise (or lower) the point by `dz`.
    #[inline]
    pub fn raised(&self, dz: f32) -> WorldPoint {
        WorldPoint::new(self.x, self.y, self.z + dz)
    }

    /// Dot product with another point (as vectors)
    #[inline]
    pub fn dot(&self, other: &WorldPoint) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[inline]
    pub fn cross(&self, other: &WorldPoint) -> WorldPoint {
        WorldPoint::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Linear interpolation toward `other` (t = 0 gives self).
    #[inline]
    pub fn lerp(&self, other: &WorldPoint, t: f32) -> WorldPoint {
        *self + (*other - *self) * t
    }

    /// True when all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for WorldPoint {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        WorldPoint::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for WorldPoint {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        WorldPoint::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for WorldPoint {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        WorldPoint::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Neg for WorldPoint {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        WorldPoint::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_coord_neighbors() {
        let c = GridCoord::new(5, 5);
        let n4 = c.neighbors_4();
        assert_eq!(n4[0], GridCoord::new(5, 6)); // N
        assert_eq!(n4[1], GridCoord::new(6, 5)); // E
        assert_eq!(n4[2], GridCoord::new(5, 4)); // S
        assert_eq!(n4[3], GridCoord::new(4, 5)); // W
    }

    #[test]
    fn test_manhattan() {
        let a = GridCoord::new(1, 2);
        let b = GridCoord::new(-3, 5);
        assert_eq!(a.manhattan_distance(&b), 7);
    }

    #[test]
    fn test_world_point_distance() {
        let a = WorldPoint::ZERO;
        let b = WorldPoint::new(3.0, 4.0, 12.0);
        assert!((a.distance(&b) - 13.0).abs() < 1e-5);
        assert!((a.distance_xy(&b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_cross_is_perpendicular() {
        let a = WorldPoint::new(1.0, 0.0, 0.0);
        let c = a.cross(&WorldPoint::UP);
        assert!((c.dot(&a)).abs() < 1e-6);
        assert!((c.y + 1.0).abs() < 1e-6);
    }
}
