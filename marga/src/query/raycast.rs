//! Ray casts with bounded retry.
//!
//! The environment's ray cast can fail transiently when it is overloaded.
//! [`RayCaster`] retries a fixed number of times with a fixed delay and, if
//! every attempt fails, surfaces the last status unchanged.

use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::WorldPoint;
use crate::world::{RayFilter, RayHit, World};

/// Status reported for casts rejected before reaching the environment.
pub const NON_FINITE_STATUS: i32 = -1000;

/// Ray cast that failed on every attempt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ray cast failed with status {status}")]
pub struct RayCastError {
    /// Last status returned by the environment.
    pub status: i32,
}

impl RayCastError {
    /// Wrap an environment status.
    pub fn new(status: i32) -> Self {
        Self { status }
    }
}

/// Retry schedule for transient ray-cast failures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// Retrying front end to [`World::cast_ray`].
pub struct RayCaster<'a, W: World + ?Sized> {
    world: &'a W,
    policy: RetryPolicy,
}

impl<W: World + ?Sized> Clone for RayCaster<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: World + ?Sized> Copy for RayCaster<'_, W> {}

impl<'a, W: World + ?Sized> RayCaster<'a, W> {
    /// Create a caster over `world`.
    pub fn new(world: &'a W, policy: RetryPolicy) -> Self {
        Self { world, policy }
    }

    /// The wrapped environment.
    pub fn world(&self) -> &'a W {
        self.world
    }

    /// Retry schedule in use.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Cast from `start` to `end`, retrying on failure.
    ///
    /// Hits come back nearest first.
    pub fn cast(
        &self,
        start: WorldPoint,
        end: WorldPoint,
        filter: &RayFilter,
    ) -> Result<Vec<RayHit>, RayCastError> {
        if !start.is_finite() || !end.is_finite() {
            warn!("[RayCast] rejected non-finite segment {:?} -> {:?}", start, end);
            return Err(RayCastError::new(NON_FINITE_STATUS));
        }

        let attempts = self.policy.max_attempts.max(1);
        let mut last_status = NON_FINITE_STATUS;
        for attempt in 1..=attempts {
            match self.world.cast_ray(start, end, filter) {
                Ok(hits) => return Ok(hits),
                Err(status) => {
                    last_status = status;
                    debug!(
                        "[RayCast] attempt {}/{} failed with status {}",
                        attempt, attempts, status
                    );
                    if attempt < attempts && !self.policy.delay.is_zero() {
                        thread::sleep(self.policy.delay);
                    }
                }
            }
        }

        warn!(
            "[RayCast] giving up after {} attempts, last status {}",
            attempts, last_status
        );
        Err(RayCastError::new(last_status))
    }

    /// Nearest non-walkable hit on the segment, if any.
    pub fn first_obstacle(
        &self,
        start: WorldPoint,
        end: WorldPoint,
        filter: &RayFilter,
    ) -> Result<Option<RayHit>, RayCastError> {
        let hits = self.cast(start, end, filter)?;
        Ok(hits.into_iter().find(|hit| !hit.is_walkable()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CharacterClass, HitSurface, StaticPath};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` casts with a decreasing status.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl World for Flaky {
        fn cast_ray(
            &self,
            _start: WorldPoint,
            end: WorldPoint,
            _filter: &RayFilter,
        ) -> Result<Vec<RayHit>, i32> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(-(n as i32) - 1)
            } else {
                Ok(vec![RayHit {
                    point: end,
                    surface: HitSurface::Terrain,
                }])
            }
        }

        fn static_path(
            &self,
            start: WorldPoint,
            end: WorldPoint,
            _half_width: f32,
            _character: CharacterClass,
        ) -> StaticPath {
            StaticPath::found(vec![start, end])
        }
    }

    fn flaky(failures: usize) -> Flaky {
        Flaky {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_retry_recovers() {
        let world = flaky(2);
        let caster = RayCaster::new(&world, RetryPolicy::immediate(3));
        let hits = caster
            .cast(WorldPoint::ZERO, WorldPoint::new(1.0, 0.0, 0.0), &RayFilter::default())
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(world.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_last_status_surfaces() {
        let world = flaky(10);
        let caster = RayCaster::new(&world, RetryPolicy::immediate(4));
        let err = caster
            .cast(WorldPoint::ZERO, WorldPoint::new(1.0, 0.0, 0.0), &RayFilter::default())
            .unwrap_err();
        // Fourth failure reports -4
        assert_eq!(err.status, -4);
        assert_eq!(world.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_non_finite_never_reaches_world() {
        let world = flaky(0);
        let caster = RayCaster::new(&world, RetryPolicy::default());
        let err = caster
            .cast(
                WorldPoint::new(f32::NAN, 0.0, 0.0),
                WorldPoint::ZERO,
                &RayFilter::default(),
            )
            .unwrap_err();
        assert_eq!(err.status, NON_FINITE_STATUS);
        assert_eq!(world.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_terrain_is_not_an_obstacle() {
        let world = flaky(0);
        let caster = RayCaster::new(&world, RetryPolicy::immediate(1));
        let hit = caster
            .first_obstacle(WorldPoint::ZERO, WorldPoint::new(0.0, 0.0, -1.0), &RayFilter::default())
            .unwrap();
        assert!(hit.is_none());
    }
}
