//! Deterministic in-memory world.
//!
//! Flat or ramped terrain plus axis-aligned boxes, with optional ray-cast
//! failure injection and counters for every query served. Scenes can be
//! loaded from YAML:
//!
//! ```yaml
//! terrain:
//!   type: flat
//!   height: 0.0
//! boxes:
//!   - min: { x: 8.0, y: -2.0 }
//!     max: { x: 12.0, y: 2.0, z: 4.0 }
//! ray_failures:
//!   statuses: [-1, -2]
//!   count: 4
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::ConfigLoadError;
use crate::core::WorldPoint;
use crate::core::geometry::COLLINEAR_TOLERANCE;
use crate::world::{
    CharacterClass, HitSurface, PathfindingKind, RayFilter, RayHit, StaticPath, World,
};

/// Status returned by static path queries that leave the scene bounds.
pub const OUT_OF_BOUNDS_STATUS: i32 = 1;

/// Status returned by static path queries crossing an exclusion volume.
pub const EXCLUDED_STATUS: i32 = 2;

/// Ground surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Terrain {
    /// Level ground at `height`.
    Flat { height: f32 },
    /// Ground rising along +X: `z = height + slope * x`.
    Ramp { height: f32, slope: f32 },
}

impl Default for Terrain {
    fn default() -> Self {
        Terrain::Flat { height: 0.0 }
    }
}

impl Terrain {
    /// Ground elevation at (x, y).
    pub fn elevation(&self, x: f32, _y: f32) -> f32 {
        match *self {
            Terrain::Flat { height } => height,
            Terrain::Ramp { height, slope } => height + slope * x,
        }
    }

    /// Ray parameter where the segment first meets the ground.
    fn intersect(&self, start: WorldPoint, end: WorldPoint) -> Option<f32> {
        let f0 = start.z - self.elevation(start.x, start.y);
        let f1 = end.z - self.elevation(end.x, end.y);
        if f0 < 0.0 {
            Some(0.0)
        } else if f1 <= 0.0 {
            let denom = f0 - f1;
            Some(if denom > f32::EPSILON { f0 / denom } else { 0.0 })
        } else {
            None
        }
    }
}

fn default_kind() -> PathfindingKind {
    PathfindingKind::StaticObstacle
}

/// Axis-aligned box in the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimBox {
    /// Object id reported in hits. Zero is replaced on insertion.
    #[serde(default)]
    pub id: u32,
    /// Minimum corner.
    pub min: WorldPoint,
    /// Maximum corner.
    pub max: WorldPoint,
    /// Pathfinding tag.
    #[serde(default = "default_kind")]
    pub kind: PathfindingKind,
    /// Moving object.
    #[serde(default)]
    pub physical: bool,
}

impl SimBox {
    /// Solid obstacle.
    pub fn obstacle(min: WorldPoint, max: WorldPoint) -> Self {
        Self {
            id: 0,
            min,
            max,
            kind: PathfindingKind::StaticObstacle,
            physical: false,
        }
    }

    /// Surface characters may stand on.
    pub fn walkable(min: WorldPoint, max: WorldPoint) -> Self {
        Self {
            kind: PathfindingKind::Walkable,
            ..Self::obstacle(min, max)
        }
    }

    /// Box of `size` (x, y, height) standing on z = 0 centred at (x, y).
    pub fn centred(x: f32, y: f32, size_x: f32, size_y: f32, height: f32) -> Self {
        Self::obstacle(
            WorldPoint::new(x - size_x * 0.5, y - size_y * 0.5, 0.0),
            WorldPoint::new(x + size_x * 0.5, y + size_y * 0.5, height),
        )
    }

    fn surface(&self) -> HitSurface {
        HitSurface::Object {
            id: self.id,
            kind: self.kind,
            physical: self.physical,
        }
    }

    /// Slab test. A segment starting inside the box hits at its start.
    fn intersect(&self, start: WorldPoint, end: WorldPoint) -> Option<f32> {
        let d = end - start;
        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;
        for (s, dir, lo, hi) in [
            (start.x, d.x, self.min.x, self.max.x),
            (start.y, d.y, self.min.y, self.max.y),
            (start.z, d.z, self.min.z, self.max.z),
        ] {
            if dir.abs() < 1e-9 {
                if s < lo || s > hi {
                    return None;
                }
                continue;
            }
            let mut t1 = (lo - s) / dir;
            let mut t2 = (hi - s) / dir;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }

    /// Does the box overlap the segment in the ground plane?
    fn crosses_xy(&self, start: WorldPoint, end: WorldPoint) -> bool {
        let flat = SimBox {
            min: self.min.with_z(-1.0),
            max: self.max.with_z(1.0),
            ..self.clone()
        };
        flat.intersect(start.flatten(), end.flatten()).is_some()
    }
}

/// Scene extent for static path queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl SimBounds {
    fn contains(&self, p: WorldPoint) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }
}

/// Injected ray-cast failures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RayFailures {
    /// Statuses returned in turn.
    pub statuses: Vec<i32>,
    /// Number of casts to fail; `None` fails forever.
    #[serde(default)]
    pub count: Option<usize>,
}

/// Scene description as loaded from YAML.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimScene {
    #[serde(default)]
    pub terrain: Terrain,
    #[serde(default)]
    pub bounds: Option<SimBounds>,
    #[serde(default)]
    pub boxes: Vec<SimBox>,
    #[serde(default)]
    pub ray_failures: Option<RayFailures>,
    #[serde(default)]
    pub static_path_status: i32,
}

/// In-memory [`World`].
#[derive(Debug, Default)]
pub struct SimWorld {
    terrain: Terrain,
    bounds: Option<SimBounds>,
    boxes: Vec<SimBox>,
    ray_failures: Option<RayFailures>,
    static_path_status: i32,
    rays: AtomicUsize,
    failures_served: AtomicUsize,
    static_queries: AtomicUsize,
}

impl SimWorld {
    /// Empty world over `terrain`.
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            ..Self::default()
        }
    }

    /// Empty world on level ground.
    pub fn flat(height: f32) -> Self {
        Self::new(Terrain::Flat { height })
    }

    /// Build from a parsed scene.
    pub fn from_scene(scene: SimScene) -> Self {
        let mut world = Self::new(scene.terrain);
        world.bounds = scene.bounds;
        world.ray_failures = scene.ray_failures;
        world.static_path_status = scene.static_path_status;
        for b in scene.boxes {
            world.add_box(b);
        }
        world
    }

    /// Parse a YAML scene.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let scene: SimScene =
            serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))?;
        Ok(Self::from_scene(scene))
    }

    /// Load a YAML scene file.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Add a box. Boxes without an id get the next free one.
    pub fn add_box(&mut self, mut b: SimBox) -> u32 {
        if b.id == 0 {
            b.id = self.boxes.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        }
        let id = b.id;
        self.boxes.push(b);
        id
    }

    /// Restrict static path queries to a rectangle.
    pub fn set_bounds(&mut self, bounds: SimBounds) {
        self.bounds = Some(bounds);
    }

    /// Fail `count` ray casts (all of them when `None`), cycling `statuses`.
    pub fn fail_rays(&mut self, statuses: Vec<i32>, count: Option<usize>) {
        self.ray_failures = if statuses.is_empty() {
            None
        } else {
            Some(RayFailures { statuses, count })
        };
        self.failures_served.store(0, Ordering::Relaxed);
    }

    /// Force every static path query to report `status`.
    pub fn set_static_path_status(&mut self, status: i32) {
        self.static_path_status = status;
    }

    /// Ground elevation at (x, y).
    pub fn ground(&self, x: f32, y: f32) -> f32 {
        self.terrain.elevation(x, y)
    }

    /// Ground point below (x, y).
    pub fn ground_point(&self, x: f32, y: f32) -> WorldPoint {
        WorldPoint::new(x, y, self.ground(x, y))
    }

    /// Ray casts served, failed ones included.
    pub fn ray_count(&self) -> usize {
        self.rays.load(Ordering::Relaxed)
    }

    /// Static path queries served.
    pub fn static_query_count(&self) -> usize {
        self.static_queries.load(Ordering::Relaxed)
    }

    /// Zero the query counters.
    pub fn reset_counters(&self) {
        self.rays.store(0, Ordering::Relaxed);
        self.static_queries.store(0, Ordering::Relaxed);
    }

    fn injected_failure(&self) -> Option<i32> {
        let plan = self.ray_failures.as_ref()?;
        let served = self.failures_served.fetch_add(1, Ordering::Relaxed);
        if plan.count.is_none_or(|count| served < count) {
            Some(plan.statuses[served % plan.statuses.len()])
        } else {
            None
        }
    }
}

impl World for SimWorld {
    fn cast_ray(
        &self,
        start: WorldPoint,
        end: WorldPoint,
        filter: &RayFilter,
    ) -> Result<Vec<RayHit>, i32> {
        self.rays.fetch_add(1, Ordering::Relaxed);
        if let Some(status) = self.injected_failure() {
            return Err(status);
        }

        let mut hits: Vec<(f32, RayHit)> = Vec::new();
        if filter.admits(&HitSurface::Terrain)
            && let Some(t) = self.terrain.intersect(start, end)
        {
            let p = start.lerp(&end, t);
            hits.push((
                t,
                RayHit {
                    point: p.with_z(self.ground(p.x, p.y)),
                    surface: HitSurface::Terrain,
                },
            ));
        }
        for b in &self.boxes {
            let surface = b.surface();
            if !filter.admits(&surface) {
                continue;
            }
            if let Some(t) = b.intersect(start, end) {
                hits.push((
                    t,
                    RayHit {
                        point: start.lerp(&end, t),
                        surface,
                    },
                ));
            }
        }

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits
            .into_iter()
            .take(filter.max_hits.max(1))
            .map(|(_, hit)| hit)
            .collect())
    }

    fn static_path(
        &self,
        start: WorldPoint,
        end: WorldPoint,
        _half_width: f32,
        _character: CharacterClass,
    ) -> StaticPath {
        self.static_queries.fetch_add(1, Ordering::Relaxed);
        if self.static_path_status != 0 {
            return StaticPath::failed(self.static_path_status);
        }
        if let Some(bounds) = &self.bounds
            && (!bounds.contains(start) || !bounds.contains(end))
        {
            return StaticPath::failed(OUT_OF_BOUNDS_STATUS);
        }
        if self
            .boxes
            .iter()
            .any(|b| b.kind == PathfindingKind::ExclusionVolume && b.crosses_xy(start, end))
        {
            return StaticPath::failed(EXCLUDED_STATUS);
        }

        match self.terrain {
            Terrain::Flat { .. } => StaticPath::found(vec![start, end]),
            Terrain::Ramp { .. } => {
                // Navmesh-style output: one vertex per polygon edge crossed
                let mid = start.lerp(&end, 0.5);
                let mid = mid.with_z(self.ground(mid.x, mid.y));
                if start.distance_xy(&end) < COLLINEAR_TOLERANCE {
                    StaticPath::found(vec![start, end])
                } else {
                    StaticPath::found(vec![start, mid, end])
                }
            }
        }
    }
}
