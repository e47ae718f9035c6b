//! Capsule footprint used for every clearance check.

use serde::{Deserialize, Serialize};

/// Cylindrical collision envelope approximating the character.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    /// Diameter in meters.
    pub width: f32,
    /// Height in meters.
    pub height: f32,
}

impl Default for Capsule {
    fn default() -> Self {
        Self {
            width: 0.5,
            height: 1.8,
        }
    }
}

impl Capsule {
    /// Create a new capsule.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Half of the width, the radius used by static path queries.
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    /// Both dimensions finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}
