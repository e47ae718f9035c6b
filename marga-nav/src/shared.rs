//! Shared character pose.
//!
//! The executor is the only writer. The navigator and the recovery task
//! take snapshots.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use marga::{Pose, WorldPoint};

/// Atomic wrapper for f32 values.
/// Uses AtomicU32 with bit reinterpretation.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(val: f32) -> Self {
        Self(AtomicU32::new(val.to_bits()))
    }

    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    pub fn store(&self, val: f32, order: Ordering) {
        self.0.store(val.to_bits(), order);
    }
}

/// Lock-free character pose.
/// The ground coordinates share one u64 (two f32 bit patterns) so a reader
/// never sees x from one update and y from another.
#[derive(Debug)]
pub struct SharedPose {
    xy: AtomicU64,
    z: AtomicF32,
    yaw: AtomicF32,
}

fn pack_xy(x: f32, y: f32) -> u64 {
    ((x.to_bits() as u64) << 32) | y.to_bits() as u64
}

fn unpack_xy(xy: u64) -> (f32, f32) {
    (f32::from_bits((xy >> 32) as u32), f32::from_bits(xy as u32))
}

impl SharedPose {
    pub fn new(pose: Pose) -> Self {
        let p = pose.position;
        Self {
            xy: AtomicU64::new(pack_xy(p.x, p.y)),
            z: AtomicF32::new(p.z),
            yaw: AtomicF32::new(pose.yaw),
        }
    }

    /// Current pose snapshot.
    pub fn load(&self) -> Pose {
        let (x, y) = unpack_xy(self.xy.load(Ordering::Acquire));
        let z = self.z.load(Ordering::Acquire);
        Pose::new(WorldPoint::new(x, y, z), self.yaw.load(Ordering::Acquire))
    }

    /// Current position snapshot.
    pub fn position(&self) -> WorldPoint {
        self.load().position
    }

    /// Publish a new pose (executor only).
    pub fn store(&self, pose: Pose) {
        let p = pose.position;
        self.z.store(p.z, Ordering::Release);
        self.yaw.store(pose.yaw, Ordering::Release);
        self.xy.store(pack_xy(p.x, p.y), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pose_round_trips_exactly() {
        let pose = Pose::new(WorldPoint::new(-12.345, 678.9, 1.25), 2.5);
        let shared = SharedPose::new(pose);
        assert_eq!(shared.load(), pose);

        let moved = Pose::new(WorldPoint::new(3.5, -0.001, -4.0), -1.0);
        shared.store(moved);
        assert_eq!(shared.position(), moved.position);
        assert_relative_eq!(shared.load().yaw, -1.0);
    }

    #[test]
    fn test_atomic_f32() {
        let value = AtomicF32::new(1.5);
        value.store(-0.25, Ordering::Relaxed);
        assert_eq!(value.load(Ordering::Relaxed), -0.25);
    }
}
