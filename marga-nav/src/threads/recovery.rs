//! Recovery task: picks a previously good position to return to.
//!
//! The executor performs the relocation; a failed search is reported to the
//! navigator directly.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use marga::recovery::TargetSource;
use marga::{PathStatus, ProbeConfig, Prober, RecoverySettings, find_recovery_target};

use crate::error::{NavError, Result};
use crate::messages::{ExecutorInput, Outcome, RecoveryRequest};
use crate::shared::SharedPose;

use super::SharedWorld;

/// Recovery task state and logic.
pub struct RecoveryTask {
    world: SharedWorld,
    settings: RecoverySettings,
    probe: ProbeConfig,
    pose: Arc<SharedPose>,
    requests: Receiver<RecoveryRequest>,
    executor: Sender<ExecutorInput>,
    outcomes: Sender<Outcome>,
}

impl RecoveryTask {
    /// Create a new recovery task.
    pub fn new(
        settings: RecoverySettings,
        probe: ProbeConfig,
        world: SharedWorld,
        pose: Arc<SharedPose>,
        requests: Receiver<RecoveryRequest>,
        executor: Sender<ExecutorInput>,
        outcomes: Sender<Outcome>,
    ) -> Self {
        Self {
            world,
            settings,
            probe,
            pose,
            requests,
            executor,
            outcomes,
        }
    }

    /// Run until the request channel closes.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("Recovery task started");

        while let Ok(request) = self.requests.recv() {
            self.process(request)?;
        }

        tracing::info!("Recovery task shutting down");
        Ok(())
    }

    /// Handle one recovery request.
    pub fn process(&mut self, request: RecoveryRequest) -> Result<()> {
        let prober = Prober::new(&*self.world, request.capsule, self.probe);
        let current = self.pose.position();

        let status = match find_recovery_target(
            &prober,
            current,
            &request.waypoints,
            &self.settings,
        ) {
            Ok(Some(target)) => {
                match target.source {
                    TargetSource::Waypoint(index) => tracing::info!(
                        "Recovery {}: returning to waypoint {} of {}",
                        request.id,
                        index,
                        request.waypoints.len()
                    ),
                    TargetSource::Search => tracing::info!(
                        "Recovery {}: no usable waypoint, nearest clear spot found",
                        request.id
                    ),
                }
                return self
                    .executor
                    .send(ExecutorInput::Relocate {
                        id: request.id,
                        target: target.position,
                    })
                    .map_err(|_| NavError::ChannelClosed("executor"));
            }
            Ok(None) => {
                tracing::warn!("Recovery {}: nowhere to go", request.id);
                PathStatus::NoPath
            }
            Err(e) => {
                tracing::warn!("Recovery {}: {}", request.id, e);
                PathStatus::RayCast(e.status)
            }
        };

        self.outcomes
            .send(Outcome {
                id: request.id,
                status,
                pose: self.pose.load(),
                reached: Vec::new(),
            })
            .map_err(|_| NavError::ChannelClosed("outcome"))
    }
}
