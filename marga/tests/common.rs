//! Shared helpers for marga integration tests.

#![allow(dead_code)]

use marga::core::{Capsule, WorldPoint};
use marga::query::{ProbeConfig, Prober, RetryPolicy};
use marga::sim::{SimBox, SimWorld};

/// Ground-level point.
pub fn pt(x: f32, y: f32) -> WorldPoint {
    WorldPoint::new(x, y, 0.0)
}

/// 1 m wide, 2 m tall capsule.
pub fn capsule() -> Capsule {
    Capsule::new(1.0, 2.0)
}

/// Probe settings with no retry delay.
pub fn probe_config() -> ProbeConfig {
    ProbeConfig {
        retry: RetryPolicy::immediate(1),
        ..ProbeConfig::default()
    }
}

/// Prober for the standard capsule.
pub fn prober(world: &SimWorld) -> Prober<'_, SimWorld> {
    Prober::new(world, capsule(), probe_config())
}

/// 20 m corridor along +X, 6 m wide, walls 3 m tall.
pub const CORRIDOR_SCENE: &str = r#"
terrain:
  type: flat
  height: 0.0
boxes:
  - min: { x: -1.0, y: 3.0, z: 0.0 }
    max: { x: 21.0, y: 3.5, z: 3.0 }
  - min: { x: -1.0, y: -3.5, z: 0.0 }
    max: { x: 21.0, y: -3.0, z: 3.0 }
"#;

/// Open ground with a 4x4x4 block centred on (10, 0).
pub fn block_world() -> SimWorld {
    let mut world = SimWorld::flat(0.0);
    world.add_box(SimBox::centred(10.0, 0.0, 4.0, 4.0, 4.0));
    world
}

/// Assert every leg of `points` is clear for the prober's capsule.
pub fn assert_legs_clear(prober: &Prober<'_, SimWorld>, points: &[WorldPoint]) {
    for leg in points.windows(2) {
        assert!(
            prober.path_clear(leg[0], leg[1]).unwrap(),
            "leg {:?} -> {:?} is blocked",
            leg[0],
            leg[1]
        );
    }
}

/// Total polyline length.
pub fn length(points: &[WorldPoint]) -> f32 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}
