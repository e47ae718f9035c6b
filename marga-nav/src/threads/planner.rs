//! Planner task: turns plan requests into a stream of segment records.
//!
//! For each request the task:
//! - Verifies the start and goal positions are clear
//! - Fetches the static path, stops it short and prepares it
//! - Sends clear stretches to the executor and blocked spans to the maze task
//! - Closes the stream with a zero-length final record

use crossbeam_channel::{Receiver, Sender};

use marga::maze::{MazeLayout, MazeLimits};
use marga::path::{SegmentKind, Segmentation, initial_path, prepare, stop_short};
use marga::{MargaConfig, PathStatus, PlanError, ProbeConfig, Prober};

use crate::error::{NavError, Result};
use crate::messages::{ExecutorInput, MazeRequest, PlanRequest, RequestId, SegmentRecord};

use super::SharedWorld;

/// Planner task state and logic.
pub struct PlannerTask {
    world: SharedWorld,
    base_probe: ProbeConfig,
    limits: MazeLimits,
    min_segment_length: f32,
    requests: Receiver<PlanRequest>,
    executor: Sender<ExecutorInput>,
    maze: Sender<MazeRequest>,
}

impl PlannerTask {
    /// Create a new planner task.
    pub fn new(
        config: &MargaConfig,
        world: SharedWorld,
        requests: Receiver<PlanRequest>,
        executor: Sender<ExecutorInput>,
        maze: Sender<MazeRequest>,
    ) -> Self {
        Self {
            world,
            base_probe: config.probe_config(),
            limits: config.maze_limits(),
            min_segment_length: config.planner.min_segment_length,
            requests,
            executor,
            maze,
        }
    }

    /// Run until the request channel closes.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("Planner task started");

        while let Ok(mut request) = self.requests.recv() {
            // Only the newest queued request is worth planning
            while let Ok(newer) = self.requests.try_recv() {
                tracing::debug!("Request {} superseded by {} before planning", request.id, newer.id);
                request = newer;
            }
            self.process(&request)?;
        }

        tracing::info!("Planner task shutting down");
        Ok(())
    }

    /// Plan one request and deliver its records.
    pub fn process(&self, request: &PlanRequest) -> Result<()> {
        match self.plan(request) {
            Ok(Some(segmentation)) => self.emit(request, &segmentation),
            Ok(None) => {
                tracing::debug!("Request {}: already within stop-short distance", request.id);
                self.deliver(SegmentRecord::terminator(request.id, 0, PathStatus::Ok))
            }
            Err(status) => self.deliver(SegmentRecord::terminator(request.id, 0, status)),
        }
    }

    /// Verify endpoints and prepare the path. `None` when there is nothing
    /// left to walk.
    fn plan(&self, request: &PlanRequest) -> std::result::Result<Option<Segmentation>, PathStatus> {
        let id = request.id;
        if !request.capsule.is_valid() {
            return Err(self.report(
                id,
                PlanError::InvalidCapsule {
                    width: request.capsule.width,
                    height: request.capsule.height,
                },
            ));
        }

        let prober = Prober::new(
            &*self.world,
            request.capsule,
            request.probe_config(&self.base_probe),
        );
        let start = request.start.position;
        let goal = request.goal;
        if !start.is_finite() || !goal.is_finite() {
            return Err(self.report(id, PlanError::NonFinite));
        }

        let start_probe = prober
            .probe_position(start, request.start.forward())
            .map_err(|e| self.report(id, e.into()))?;
        if start_probe.is_occupied() {
            tracing::info!("Request {}: start {:?} is blocked", id, start);
            return Err(PathStatus::BadStart);
        }
        let goal_probe = prober
            .probe_position(goal, goal - start)
            .map_err(|e| self.report(id, e.into()))?;
        if goal_probe.is_occupied() {
            tracing::info!("Request {}: goal {:?} is blocked", id, goal);
            return Err(PathStatus::BadDestination);
        }

        let raw = initial_path(&prober, start, goal).map_err(|e| self.report(id, e))?;
        let raw = stop_short(&raw, request.stop_short);
        let span: f32 = raw.windows(2).map(|w| w[0].distance(&w[1])).sum();
        if span < self.min_segment_length {
            return Ok(None);
        }

        prepare(&prober, &raw, self.min_segment_length)
            .map(Some)
            .map_err(|e| self.report(id, e))
    }

    /// Send the prepared segments in order, then the terminator.
    fn emit(&self, request: &PlanRequest, segmentation: &Segmentation) -> Result<()> {
        let id = request.id;
        let mut seq = 0;
        let mut detours = 0;

        for segment in &segmentation.segments {
            match segment.kind {
                SegmentKind::Clear => {
                    self.deliver(SegmentRecord::clear(id, seq, segment.points.clone()))?;
                }
                SegmentKind::Blocked => {
                    let (Some(start), Some(end)) = (segment.start(), segment.end()) else {
                        tracing::error!("Request {}: blocked segment {} has no end points; resetting", id, seq);
                        return self.deliver(SegmentRecord::failed(id, seq, PathStatus::Internal));
                    };
                    match MazeLayout::plan(start, end, request.capsule.width, &self.limits) {
                        Ok(layout) => {
                            detours += 1;
                            self.maze
                                .send(MazeRequest {
                                    path_id: id,
                                    seq,
                                    layout,
                                    capsule: request.capsule,
                                    probe: request.probe_config(&self.base_probe),
                                })
                                .map_err(|_| NavError::ChannelClosed("maze"))?;
                        }
                        Err(e) => {
                            tracing::info!("Request {}: no maze for segment {}: {}", id, seq, e);
                            return self.deliver(SegmentRecord::failed(id, seq, e.status()));
                        }
                    }
                }
            }
            seq += 1;
        }

        tracing::info!(
            "Request {}: {} segments, {} detours, status {}",
            id,
            seq,
            detours,
            segmentation.status.name()
        );
        self.deliver(SegmentRecord::terminator(id, seq, segmentation.status))
    }

    fn deliver(&self, record: SegmentRecord) -> Result<()> {
        self.executor
            .send(ExecutorInput::Segment(record))
            .map_err(|_| NavError::ChannelClosed("executor"))
    }

    /// Log a planning failure and map it to the caller's status.
    fn report(&self, id: RequestId, error: PlanError) -> PathStatus {
        if error.is_invariant() {
            tracing::error!("Request {}: {}; planner state reset", id, error);
        } else {
            tracing::info!("Request {}: planning failed: {}", id, error);
        }
        error.status()
    }
}
