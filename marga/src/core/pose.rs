//! Character pose (position and heading).

use serde::{Deserialize, Serialize};

use super::point::WorldPoint;

/// Position of the character's feet plus its heading about the Z axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Ground position in meters.
    pub position: WorldPoint,
    /// Heading in radians [-π, π), CCW positive from +X.
    #[serde(default)]
    pub yaw: f32,
}

impl Pose {
    /// Create a new pose. The heading is normalized.
    #[inline]
    pub fn new(position: WorldPoint, yaw: f32) -> Self {
        Self {
            position,
            yaw: normalize_angle(yaw),
        }
    }

    /// Pose at `position` facing toward `target` (ground plane).
    pub fn facing(position: WorldPoint, target: WorldPoint) -> Self {
        let dx = target.x - position.x;
        let dy = target.y - position.y;
        Self::new(position, dy.atan2(dx))
    }

    /// Unit vector of the heading on the ground plane.
    #[inline]
    pub fn forward(&self) -> WorldPoint {
        WorldPoint::new(self.yaw.cos(), self.yaw.sin(), 0.0)
    }
}

/// Normalize an angle to [-π, π).
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut a = angle % TAU;
    if a >= PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}
