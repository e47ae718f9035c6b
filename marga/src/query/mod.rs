//! Environment queries built on ray casts.
//!
//! - **Ray cast**: retrying wrapper around the environment primitive
//! - **Beam**: a lattice of parallel casts sweeping the capsule footprint
//! - **Obstacle**: segment clearance and single-cell occupancy probes
//!
//! All of them hang off [`Prober`], which bundles the world, the capsule and
//! the probe settings for one planning request.

mod beam;
mod obstacle;
mod raycast;

pub use obstacle::{CellProbe, MIN_CLEAR_SPAN};
pub use raycast::{NON_FINITE_STATUS, RayCastError, RayCaster, RetryPolicy};

use serde::{Deserialize, Serialize};

use crate::core::Capsule;
use crate::world::{CharacterClass, World};

/// Per-request probe settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Vertical spacing between beam probes (meters).
    pub probe_spacing: f32,
    /// Character class for static path queries.
    pub character: CharacterClass,
    /// Ray-cast retry schedule.
    pub retry: RetryPolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_spacing: 0.5,
            character: CharacterClass::None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Clearance queries for one capsule against one world.
pub struct Prober<'a, W: World + ?Sized> {
    caster: RayCaster<'a, W>,
    capsule: Capsule,
    config: ProbeConfig,
}

impl<'a, W: World + ?Sized> Prober<'a, W> {
    /// Create a prober.
    pub fn new(world: &'a W, capsule: Capsule, config: ProbeConfig) -> Self {
        Self {
            caster: RayCaster::new(world, config.retry),
            capsule,
            config,
        }
    }

    /// The retrying ray caster.
    pub fn caster(&self) -> &RayCaster<'a, W> {
        &self.caster
    }

    /// The wrapped environment.
    pub fn world(&self) -> &'a W {
        self.caster.world()
    }

    /// Capsule being probed for.
    pub fn capsule(&self) -> Capsule {
        self.capsule
    }

    /// Probe settings.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }
}
