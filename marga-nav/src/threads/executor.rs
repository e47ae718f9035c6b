//! Executor task: assembles segment records into motion.
//!
//! Clear stretches arrive from the planner and detours from the maze task,
//! in any order. Records are buffered by sequence number and released
//! strictly in order; the executor is the only writer of the shared pose.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use marga::{PathStatus, Pose, WorldPoint};

use crate::error::{NavError, Result};
use crate::messages::{
    ExecutorInput, Outcome, RequestId, SegmentRecord, SequenceNumber,
};
use crate::shared::SharedPose;

/// Consumer of released path pieces.
pub trait MotionSink: Send {
    /// Walk along `points`, starting at the first.
    fn follow(&mut self, path_id: RequestId, points: &[WorldPoint]);

    /// Move directly to a recovery position.
    fn relocate(&mut self, id: RequestId, target: WorldPoint);
}

/// Sink that only logs what it would do.
#[derive(Debug, Default)]
pub struct TracingSink;

impl MotionSink for TracingSink {
    fn follow(&mut self, path_id: RequestId, points: &[WorldPoint]) {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            tracing::info!(
                "Path {}: ({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2}) via {} points",
                path_id,
                first.x,
                first.y,
                first.z,
                last.x,
                last.y,
                last.z,
                points.len()
            );
        }
    }

    fn relocate(&mut self, id: RequestId, target: WorldPoint) {
        tracing::info!(
            "Recovery {}: relocating to ({:.2}, {:.2}, {:.2})",
            id,
            target.x,
            target.y,
            target.z
        );
    }
}

/// Delivery state of the request being executed.
#[derive(Debug)]
struct ActivePath {
    id: RequestId,
    next_seq: SequenceNumber,
    pending: BTreeMap<SequenceNumber, SegmentRecord>,
    reached: Vec<WorldPoint>,
}

impl ActivePath {
    fn new(id: RequestId) -> Self {
        Self {
            id,
            next_seq: 0,
            pending: BTreeMap::new(),
            reached: Vec::new(),
        }
    }
}

/// Executor task state and logic.
pub struct ExecutorTask<S: MotionSink> {
    pose: Arc<SharedPose>,
    sink: S,
    settle: Duration,
    inbox: Receiver<ExecutorInput>,
    outcomes: Sender<Outcome>,
    active: Option<ActivePath>,
    /// Highest id that has ended; anything at or below is stale.
    closed: RequestId,
}

impl<S: MotionSink> ExecutorTask<S> {
    /// Create a new executor task.
    pub fn new(
        settle: Duration,
        pose: Arc<SharedPose>,
        sink: S,
        inbox: Receiver<ExecutorInput>,
        outcomes: Sender<Outcome>,
    ) -> Self {
        Self {
            pose,
            sink,
            settle,
            inbox,
            outcomes,
            active: None,
            closed: 0,
        }
    }

    /// Run until every sender has gone away.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("Executor task started");

        while let Ok(input) = self.inbox.recv() {
            self.handle(input)?;
        }

        tracing::info!("Executor task shutting down");
        Ok(())
    }

    /// React to one input.
    pub fn handle(&mut self, input: ExecutorInput) -> Result<()> {
        let id = input.request_id();
        if id <= self.closed || self.active.as_ref().is_some_and(|a| id < a.id) {
            tracing::debug!("Discarding stale {:?} for request {}", input, id);
            return Ok(());
        }

        match input {
            ExecutorInput::Segment(record) => self.accept(record),
            ExecutorInput::Maze(reply) => self.accept(reply.into()),
            ExecutorInput::Stop(id) => {
                tracing::info!("Request {} stopped", id);
                self.supersede(id);
                self.finish(id, PathStatus::Stopped, Vec::new())
            }
            ExecutorInput::Relocate { id, target } => {
                self.supersede(id);
                self.sink.relocate(id, target);
                let from = self.pose.position();
                self.publish(from, target);
                self.finish(id, PathStatus::Ok, vec![target])
            }
        }
    }

    /// Drop any older request in favour of `id`.
    fn supersede(&mut self, id: RequestId) {
        if let Some(active) = self.active.take_if(|a| a.id < id) {
            tracing::debug!(
                "Request {} superseded by {} with {} records buffered",
                active.id,
                id,
                active.pending.len()
            );
        }
    }

    /// Buffer a record and release whatever is now in order.
    fn accept(&mut self, record: SegmentRecord) -> Result<()> {
        let id = record.path_id;
        self.supersede(id);
        let active = self.active.get_or_insert_with(|| ActivePath::new(id));

        if record.seq < active.next_seq || active.pending.contains_key(&record.seq) {
            tracing::warn!("Request {}: duplicate record {} ignored", id, record.seq);
            return Ok(());
        }
        active.pending.insert(record.seq, record);

        loop {
            let Some(active) = self.active.as_mut() else {
                return Ok(());
            };
            let Some(record) = active.pending.remove(&active.next_seq) else {
                return Ok(());
            };
            active.next_seq += 1;

            if !record.status.is_ok() {
                let reached = std::mem::take(&mut active.reached);
                return self.finish(id, record.status, reached);
            }
            if !record.points.is_empty() {
                self.walk(id, &record.points);
            }
            if record.is_final {
                let reached = self
                    .active
                    .as_mut()
                    .map(|a| std::mem::take(&mut a.reached))
                    .unwrap_or_default();
                return self.finish(id, PathStatus::Ok, reached);
            }
        }
    }

    /// Hand a stretch to the sink and move the pose to its end.
    fn walk(&mut self, id: RequestId, points: &[WorldPoint]) {
        self.sink.follow(id, points);
        let Some(&last) = points.last() else {
            return;
        };
        let from = match points.len() {
            1 => self.pose.position(),
            n => points[n - 2],
        };
        self.publish(from, last);
        if let Some(active) = self.active.as_mut() {
            active.reached.push(last);
        }
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
    }

    fn publish(&self, from: WorldPoint, to: WorldPoint) {
        let pose = if from.distance_xy(&to) > f32::EPSILON {
            Pose::facing(from, to)
        } else {
            Pose::new(to, self.pose.load().yaw)
        };
        self.pose.store(Pose::new(to, pose.yaw));
    }

    /// Report the single terminal outcome for `id`.
    fn finish(&mut self, id: RequestId, status: PathStatus, reached: Vec<WorldPoint>) -> Result<()> {
        self.active = None;
        self.closed = self.closed.max(id);
        tracing::debug!("Request {} finished with {}", id, status.name());
        self.outcomes
            .send(Outcome {
                id,
                status,
                pose: self.pose.load(),
                reached,
            })
            .map_err(|_| NavError::ChannelClosed("outcome"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::Mutex;

    use crate::messages::MazeReply;

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<Vec<WorldPoint>>>>);

    impl MotionSink for RecordingSink {
        fn follow(&mut self, _path_id: RequestId, points: &[WorldPoint]) {
            self.0.lock().unwrap().push(points.to_vec());
        }

        fn relocate(&mut self, _id: RequestId, target: WorldPoint) {
            self.0.lock().unwrap().push(vec![target]);
        }
    }

    fn pt(x: f32) -> WorldPoint {
        WorldPoint::new(x, 0.0, 0.0)
    }

    fn executor() -> (
        ExecutorTask<RecordingSink>,
        RecordingSink,
        crossbeam_channel::Receiver<Outcome>,
    ) {
        let sink = RecordingSink::default();
        let (_inbox_tx, inbox_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        let pose = Arc::new(SharedPose::new(Pose::default()));
        let task = ExecutorTask::new(Duration::ZERO, pose, sink.clone(), inbox_rx, out_tx);
        (task, sink, out_rx)
    }

    #[test]
    fn test_releases_in_sequence_order() {
        let (mut task, sink, outcomes) = executor();

        task.handle(ExecutorInput::Segment(SegmentRecord::terminator(1, 2, PathStatus::Ok)))
            .unwrap();
        task.handle(ExecutorInput::Maze(MazeReply {
            path_id: 1,
            seq: 1,
            outcome: Ok(vec![pt(2.0), pt(3.0)]),
        }))
        .unwrap();
        assert!(sink.0.lock().unwrap().is_empty());
        assert!(outcomes.try_recv().is_err());

        task.handle(ExecutorInput::Segment(SegmentRecord::clear(1, 0, vec![pt(0.0), pt(2.0)])))
            .unwrap();

        let walked = sink.0.lock().unwrap().clone();
        assert_eq!(walked, vec![vec![pt(0.0), pt(2.0)], vec![pt(2.0), pt(3.0)]]);
        let outcome = outcomes.try_recv().unwrap();
        assert_eq!(outcome.id, 1);
        assert_eq!(outcome.status, PathStatus::Ok);
        assert_eq!(outcome.pose.position, pt(3.0));
        assert_eq!(outcome.reached, vec![pt(2.0), pt(3.0)]);
    }

    #[test]
    fn test_failed_detour_ends_path_after_earlier_segments() {
        let (mut task, sink, outcomes) = executor();

        task.handle(ExecutorInput::Maze(MazeReply {
            path_id: 3,
            seq: 1,
            outcome: Err(PathStatus::NoPath),
        }))
        .unwrap();
        task.handle(ExecutorInput::Segment(SegmentRecord::clear(3, 0, vec![pt(0.0), pt(1.0)])))
            .unwrap();

        assert_eq!(sink.0.lock().unwrap().len(), 1);
        let outcome = outcomes.try_recv().unwrap();
        assert_eq!(outcome.status, PathStatus::NoPath);
        assert_eq!(outcome.pose.position, pt(1.0));

        // Records after the failure belong to a finished request
        task.handle(ExecutorInput::Segment(SegmentRecord::terminator(3, 2, PathStatus::Ok)))
            .unwrap();
        assert!(outcomes.try_recv().is_err());
    }

    #[test]
    fn test_newer_request_supersedes_buffered_one() {
        let (mut task, sink, outcomes) = executor();

        task.handle(ExecutorInput::Segment(SegmentRecord::terminator(1, 1, PathStatus::Ok)))
            .unwrap();
        task.handle(ExecutorInput::Segment(SegmentRecord::terminator(2, 0, PathStatus::Ok)))
            .unwrap();
        // Late piece of request 1
        task.handle(ExecutorInput::Segment(SegmentRecord::clear(1, 0, vec![pt(0.0), pt(5.0)])))
            .unwrap();

        assert!(sink.0.lock().unwrap().is_empty());
        let outcome = outcomes.try_recv().unwrap();
        assert_eq!(outcome.id, 2);
        assert!(outcomes.try_recv().is_err());
    }

    #[test]
    fn test_duplicate_record_is_ignored() {
        let (mut task, sink, _outcomes) = executor();
        let record = SegmentRecord::clear(1, 0, vec![pt(0.0), pt(1.0)]);
        task.handle(ExecutorInput::Segment(record.clone())).unwrap();
        task.handle(ExecutorInput::Segment(record)).unwrap();
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_relocate_moves_pose() {
        let (mut task, sink, outcomes) = executor();
        task.handle(ExecutorInput::Relocate {
            id: 4,
            target: pt(-2.0),
        })
        .unwrap();
        assert_eq!(sink.0.lock().unwrap().clone(), vec![vec![pt(-2.0)]]);
        let outcome = outcomes.try_recv().unwrap();
        assert_eq!(outcome.status, PathStatus::Ok);
        assert_eq!(outcome.pose.position, pt(-2.0));
        assert_eq!(outcome.reached, vec![pt(-2.0)]);
    }
}
