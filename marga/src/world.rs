//! Environment primitives consumed by the planner.
//!
//! The planner never inspects scene geometry directly. Everything it knows
//! comes through two queries: a ray cast and a static terrain-path query.
//! Both may fail transiently and report it with a negative status.

use serde::{Deserialize, Serialize};

use crate::core::WorldPoint;

/// Pathfinding category an object is tagged with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathfindingKind {
    /// Surface characters may stand on.
    Walkable,
    /// Solid obstacle.
    StaticObstacle,
    /// Volume that changes movement properties.
    MaterialVolume,
    /// Region characters must not enter.
    ExclusionVolume,
    /// Another character.
    Character,
    /// An avatar.
    Avatar,
    /// Untagged legacy object.
    Legacy,
    /// Anything else.
    Other,
}

/// What a ray struck.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitSurface {
    /// Ground terrain (no object).
    Terrain,
    /// A scene object.
    Object {
        /// Object identifier.
        id: u32,
        /// Its pathfinding tag.
        kind: PathfindingKind,
        /// Whether the object is physical (moving).
        physical: bool,
    },
}

/// A single ray hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// World position of the hit.
    pub point: WorldPoint,
    /// Struck surface.
    pub surface: HitSurface,
}

impl RayHit {
    /// Terrain and walkable-tagged objects may be stood on; everything else
    /// is an obstacle.
    #[inline]
    pub fn is_walkable(&self) -> bool {
        match self.surface {
            HitSurface::Terrain => true,
            HitSurface::Object { kind, .. } => kind == PathfindingKind::Walkable,
        }
    }
}

/// Hit classes excluded from a cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RayFilter {
    /// Ignore terrain.
    pub reject_land: bool,
    /// Ignore physical (moving) objects.
    pub reject_physical: bool,
    /// Ignore characters and avatars.
    pub reject_agents: bool,
    /// Maximum number of hits to report, nearest first.
    pub max_hits: usize,
}

impl Default for RayFilter {
    fn default() -> Self {
        Self {
            reject_land: false,
            reject_physical: true,
            reject_agents: true,
            max_hits: 2,
        }
    }
}

impl RayFilter {
    /// Filter for beam sweeps: terrain is never an obstacle there.
    pub fn land_excluded() -> Self {
        Self {
            reject_land: true,
            ..Self::default()
        }
    }

    /// Does this filter let `surface` through?
    pub fn admits(&self, surface: &HitSurface) -> bool {
        match *surface {
            HitSurface::Terrain => !self.reject_land,
            HitSurface::Object { kind, physical, .. } => {
                if self.reject_physical && physical {
                    return false;
                }
                !(self.reject_agents
                    && matches!(kind, PathfindingKind::Character | PathfindingKind::Avatar))
            }
        }
    }
}

/// Character class passed through to static path queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    /// No class-specific costs.
    #[default]
    None,
    /// Humanoid.
    A,
    /// Wildlife.
    B,
    /// Mechanical.
    C,
    /// Flying-capable.
    D,
}

/// Result of a static terrain-path query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticPath {
    /// Zero on success, otherwise the environment's failure code.
    pub status: i32,
    /// Waypoints from start to end.
    pub points: Vec<WorldPoint>,
}

impl StaticPath {
    /// Successful query.
    pub fn found(points: Vec<WorldPoint>) -> Self {
        Self { status: 0, points }
    }

    /// Failed query.
    pub fn failed(status: i32) -> Self {
        Self {
            status,
            points: Vec::new(),
        }
    }
}

/// The environment the planner probes.
///
/// Implementations must be shareable between the planning tasks.
pub trait World: Send + Sync {
    /// Cast a ray from `start` to `end`, returning hits ordered nearest first
    /// or a negative status when the environment could not service the cast.
    fn cast_ray(&self, start: WorldPoint, end: WorldPoint, filter: &RayFilter)
    -> Result<Vec<RayHit>, i32>;

    /// Static terrain path between two ground points for a character of the
    /// given half-width.
    fn static_path(
        &self,
        start: WorldPoint,
        end: WorldPoint,
        half_width: f32,
        character: CharacterClass,
    ) -> StaticPath;
}

impl<W: World + ?Sized> World for std::sync::Arc<W> {
    fn cast_ray(
        &self,
        start: WorldPoint,
        end: WorldPoint,
        filter: &RayFilter,
    ) -> Result<Vec<RayHit>, i32> {
        (**self).cast_ray(start, end, filter)
    }

    fn static_path(
        &self,
        start: WorldPoint,
        end: WorldPoint,
        half_width: f32,
        character: CharacterClass,
    ) -> StaticPath {
        (**self).static_path(start, end, half_width, character)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkable_classification() {
        let terrain = RayHit {
            point: WorldPoint::ZERO,
            surface: HitSurface::Terrain,
        };
        assert!(terrain.is_walkable());

        let floor = RayHit {
            point: WorldPoint::ZERO,
            surface: HitSurface::Object {
                id: 1,
                kind: PathfindingKind::Walkable,
                physical: false,
            },
        };
        assert!(floor.is_walkable());

        let wall = RayHit {
            point: WorldPoint::ZERO,
            surface: HitSurface::Object {
                id: 2,
                kind: PathfindingKind::StaticObstacle,
                physical: false,
            },
        };
        assert!(!wall.is_walkable());
    }

    #[test]
    fn test_filter_admits() {
        let beam = RayFilter::land_excluded();
        assert!(!beam.admits(&HitSurface::Terrain));
        assert!(beam.admits(&HitSurface::Object {
            id: 1,
            kind: PathfindingKind::StaticObstacle,
            physical: false,
        }));
        assert!(!beam.admits(&HitSurface::Object {
            id: 1,
            kind: PathfindingKind::StaticObstacle,
            physical: true,
        }));
        assert!(!beam.admits(&HitSurface::Object {
            id: 3,
            kind: PathfindingKind::Avatar,
            physical: false,
        }));
    }
}
