//! Caller side of the task runtime.
//!
//! The navigator issues requests with fresh ids and hands back exactly one
//! terminal outcome per request. Outcomes for older ids are dropped. On top
//! of that it runs the retry and recovery policy:
//!
//! - Recoverable failures send the character back to a known good position,
//!   then a fresh plan is made from there
//! - Retryable failures get a fresh plan from the current pose, but only
//!   while the character keeps getting strictly closer to the goal

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::RecvTimeoutError;

use marga::{PathStatus, Pose, WorldPoint};

use crate::config::NavConfig;
use crate::error::{NavError, Result};
use crate::messages::{ExecutorInput, Outcome, PlanRequest, RecoveryRequest, RequestId};
use crate::shared::SharedPose;
use crate::threads::{MotionSink, SharedWorld, TaskHandles, TaskLinks, spawn_tasks};

/// Result of a full navigation.
#[derive(Clone, Debug, PartialEq)]
pub struct NavReport {
    pub status: PathStatus,
    /// Planning requests issued.
    pub attempts: u32,
    /// Recovery relocations performed.
    pub recoveries: u32,
    pub pose: Pose,
}

/// Permits retries while the distance to the goal keeps shrinking.
#[derive(Clone, Debug)]
pub struct ProgressGate {
    best: f32,
    retries: u32,
    max_retries: u32,
}

impl ProgressGate {
    pub fn new(distance: f32, max_retries: u32) -> Self {
        Self {
            best: distance,
            retries: 0,
            max_retries,
        }
    }

    /// Retry from `distance`? Consumes one retry when allowed.
    pub fn allow(&mut self, distance: f32) -> bool {
        if self.retries >= self.max_retries || distance.is_nan() || distance >= self.best {
            return false;
        }
        self.best = distance;
        self.retries += 1;
        true
    }

    /// New baseline after the character was moved elsewhere.
    pub fn rebase(&mut self, distance: f32) {
        self.best = distance;
    }
}

/// Request issuer and outcome reader.
pub struct Navigator {
    config: NavConfig,
    pose: Arc<SharedPose>,
    links: TaskLinks,
    handles: TaskHandles,
    next_id: RequestId,
    pending: Option<RequestId>,
    /// Known good positions, oldest first.
    waypoints: Vec<WorldPoint>,
}

impl Navigator {
    /// Spawn the tasks with the character standing at `start`.
    pub fn start<S: MotionSink + 'static>(
        config: NavConfig,
        world: SharedWorld,
        start: Pose,
        sink: S,
    ) -> Self {
        let pose = Arc::new(SharedPose::new(start));
        let (handles, links) = spawn_tasks(&config, world, Arc::clone(&pose), sink);
        Self {
            config,
            pose,
            links,
            handles,
            next_id: 0,
            pending: None,
            waypoints: vec![start.position],
        }
    }

    /// Current character pose.
    pub fn pose(&self) -> Pose {
        self.pose.load()
    }

    /// Known good positions collected so far, oldest first.
    pub fn waypoints(&self) -> &[WorldPoint] {
        &self.waypoints
    }

    /// Request in flight, if any.
    pub fn pending(&self) -> Option<RequestId> {
        self.pending
    }

    fn fresh_id(&mut self) -> RequestId {
        self.next_id += 1;
        self.next_id
    }

    /// Plan from the current pose to `goal`. Supersedes any request still
    /// in flight.
    pub fn request(&mut self, goal: WorldPoint) -> Result<RequestId> {
        let id = self.fresh_id();
        if let Some(previous) = self.pending.replace(id) {
            tracing::debug!("Request {} superseded by {}", previous, id);
        }
        let planner = &self.config.planning.planner;
        let request = PlanRequest {
            id,
            start: self.pose.load(),
            goal,
            stop_short: planner.stop_short,
            capsule: self.config.planning.capsule,
            character: planner.character,
            probe_spacing: planner.probe_spacing,
        };
        self.links
            .plans
            .send(request)
            .map_err(|_| NavError::ChannelClosed("planner"))?;
        Ok(id)
    }

    /// Block until the pending request ends.
    pub fn wait(&mut self) -> Result<Outcome> {
        let Some(id) = self.pending else {
            return Err(NavError::Idle);
        };
        let timeout = self.config.reply_timeout();
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.links.outcomes.recv_timeout(remaining) {
                Ok(outcome) if outcome.id == id => {
                    self.pending = None;
                    self.waypoints.extend_from_slice(&outcome.reached);
                    return Ok(outcome);
                }
                Ok(stale) => {
                    tracing::debug!(
                        "Discarding stale outcome {} ({}) while waiting for {}",
                        stale.id,
                        stale.status.name(),
                        id
                    );
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(NavError::ReplyTimeout {
                        id,
                        waited_ms: timeout.as_millis() as u64,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(NavError::ChannelClosed("outcome"));
                }
            }
        }
    }

    /// Cancel the pending request. Returns its outcome, which is `Stopped`
    /// unless the request ended first.
    pub fn stop(&mut self) -> Result<Option<Outcome>> {
        let Some(id) = self.pending else {
            return Ok(None);
        };
        self.links
            .executor
            .send(ExecutorInput::Stop(id))
            .map_err(|_| NavError::ChannelClosed("executor"))?;
        self.wait().map(Some)
    }

    /// Return to the newest still-usable known good position.
    pub fn recover(&mut self) -> Result<Outcome> {
        let id = self.fresh_id();
        self.pending = Some(id);
        self.links
            .recoveries
            .send(RecoveryRequest {
                id,
                waypoints: self.waypoints.clone(),
                capsule: self.config.planning.capsule,
            })
            .map_err(|_| NavError::ChannelClosed("recovery"))?;
        self.wait()
    }

    /// Navigate to `goal`, retrying and recovering as allowed.
    pub fn navigate(&mut self, goal: WorldPoint) -> Result<NavReport> {
        let policy = self.config.navigator.clone();
        let mut gate = ProgressGate::new(self.distance_to(goal), policy.max_retries);
        let mut attempts = 0;
        let mut recoveries = 0;

        let status = loop {
            self.request(goal)?;
            attempts += 1;
            let status = self.wait()?.status;
            if status.is_ok() {
                break status;
            }

            if status.is_recoverable() && recoveries < policy.max_recoveries {
                recoveries += 1;
                let recovery = self.recover()?;
                if recovery.status.is_ok() {
                    tracing::info!("Recovered after {}; planning again", status.name());
                    gate.rebase(self.distance_to(goal));
                    continue;
                }
                tracing::warn!("Recovery failed with {}", recovery.status.name());
                break status;
            }

            if status.is_retryable() && gate.allow(self.distance_to(goal)) {
                tracing::info!("Attempt {} failed with {}; retrying", attempts, status.name());
                continue;
            }
            break status;
        };

        Ok(NavReport {
            status,
            attempts,
            recoveries,
            pose: self.pose(),
        })
    }

    fn distance_to(&self, goal: WorldPoint) -> f32 {
        self.pose.position().distance(&goal)
    }

    /// Close the channels and wait for the tasks to exit.
    pub fn shutdown(self) {
        let Self { links, handles, .. } = self;
        drop(links);
        handles.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_requires_strict_progress() {
        let mut gate = ProgressGate::new(10.0, 5);
        assert!(!gate.allow(10.0));
        assert!(gate.allow(8.0));
        assert!(!gate.allow(8.0));
        assert!(gate.allow(7.9));
    }

    #[test]
    fn test_gate_caps_retries() {
        let mut gate = ProgressGate::new(10.0, 2);
        assert!(gate.allow(9.0));
        assert!(gate.allow(8.0));
        assert!(!gate.allow(1.0));
    }

    #[test]
    fn test_gate_rebase_after_relocation() {
        let mut gate = ProgressGate::new(4.0, 3);
        gate.rebase(6.0);
        assert!(gate.allow(5.0));
    }
}
