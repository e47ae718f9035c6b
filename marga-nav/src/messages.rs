//! Messages exchanged between the navigator and the tasks.
//!
//! Every message carries the id of the request it belongs to. Ids grow
//! monotonically, so a task that has seen id `n` treats anything older as
//! stale.

use marga::maze::MazeLayout;
use marga::world::CharacterClass;
use marga::{Capsule, PathStatus, Pose, ProbeConfig, WorldPoint};

/// Navigation request identifier.
pub type RequestId = u64;

/// Position of a record within one request's segment stream.
pub type SequenceNumber = u32;

// ============================================================================
// Navigator → planner
// ============================================================================

/// One planning request.
#[derive(Clone, Debug)]
pub struct PlanRequest {
    pub id: RequestId,
    pub start: Pose,
    pub goal: WorldPoint,
    /// Distance to stop before the goal (meters).
    pub stop_short: f32,
    pub capsule: Capsule,
    pub character: CharacterClass,
    pub probe_spacing: f32,
}

impl PlanRequest {
    /// Probe settings for this request on top of the task's retry policy.
    pub fn probe_config(&self, base: &ProbeConfig) -> ProbeConfig {
        ProbeConfig {
            probe_spacing: self.probe_spacing,
            character: self.character,
            retry: base.retry,
        }
    }
}

// ============================================================================
// Planner / maze → executor
// ============================================================================

/// One piece of a delivered path.
///
/// A path ends with an `is_final` record that carries no points. A record
/// whose status is not `Ok` ends the path with that status when it is
/// released.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentRecord {
    pub seq: SequenceNumber,
    pub is_maze: bool,
    pub is_final: bool,
    pub path_id: RequestId,
    pub status: PathStatus,
    pub points: Vec<WorldPoint>,
}

impl SegmentRecord {
    /// Clear stretch produced by the planner.
    pub fn clear(path_id: RequestId, seq: SequenceNumber, points: Vec<WorldPoint>) -> Self {
        Self {
            seq,
            is_maze: false,
            is_final: false,
            path_id,
            status: PathStatus::Ok,
            points,
        }
    }

    /// Zero-length terminator.
    pub fn terminator(path_id: RequestId, seq: SequenceNumber, status: PathStatus) -> Self {
        Self {
            seq,
            is_maze: false,
            is_final: true,
            path_id,
            status,
            points: Vec::new(),
        }
    }

    /// Failure in place of the stretch at `seq`.
    pub fn failed(path_id: RequestId, seq: SequenceNumber, status: PathStatus) -> Self {
        Self {
            seq,
            is_maze: false,
            is_final: false,
            path_id,
            status,
            points: Vec::new(),
        }
    }
}

// ============================================================================
// Planner → maze task
// ============================================================================

/// Detour request for one blocked span.
///
/// The layout carries the grid dimensions, the start and end cells and
/// their exact world positions (elevation included) and the cell size.
#[derive(Clone, Debug)]
pub struct MazeRequest {
    pub path_id: RequestId,
    pub seq: SequenceNumber,
    pub layout: MazeLayout,
    pub capsule: Capsule,
    pub probe: ProbeConfig,
}

/// Maze task answer; ids are passed through from the request.
#[derive(Clone, Debug, PartialEq)]
pub struct MazeReply {
    pub path_id: RequestId,
    pub seq: SequenceNumber,
    pub outcome: Result<Vec<WorldPoint>, PathStatus>,
}

impl From<MazeReply> for SegmentRecord {
    fn from(reply: MazeReply) -> Self {
        let (status, points) = match reply.outcome {
            Ok(points) => (PathStatus::Ok, points),
            Err(status) => (status, Vec::new()),
        };
        Self {
            seq: reply.seq,
            is_maze: true,
            is_final: false,
            path_id: reply.path_id,
            status,
            points,
        }
    }
}

// ============================================================================
// Navigator → recovery task
// ============================================================================

/// Ask for a return to a previously good position.
#[derive(Clone, Debug)]
pub struct RecoveryRequest {
    pub id: RequestId,
    /// Positions reached earlier, oldest first.
    pub waypoints: Vec<WorldPoint>,
    pub capsule: Capsule,
}

// ============================================================================
// Executor inbox
// ============================================================================

/// Everything the executor reacts to.
#[derive(Clone, Debug)]
pub enum ExecutorInput {
    /// Clear stretch or terminator from the planner.
    Segment(SegmentRecord),
    /// Detour or failure from the maze task.
    Maze(MazeReply),
    /// Cancel the request and drop its buffered segments.
    Stop(RequestId),
    /// Move straight to a recovery position.
    Relocate { id: RequestId, target: WorldPoint },
}

impl ExecutorInput {
    /// Request this input belongs to.
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Segment(record) => record.path_id,
            Self::Maze(reply) => reply.path_id,
            Self::Stop(id) | Self::Relocate { id, .. } => *id,
        }
    }
}

// ============================================================================
// Tasks → navigator
// ============================================================================

/// Terminal result of one request.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub id: RequestId,
    pub status: PathStatus,
    /// Character pose when the request ended.
    pub pose: Pose,
    /// Segment end points reached while executing the request.
    pub reached: Vec<WorldPoint>,
}
