//! Terminal status taxonomy for planning requests.
//!
//! Every request ends with exactly one [`PathStatus`]. Codes are stable so
//! they can be logged and compared across task boundaries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a planning request or one of its stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathStatus {
    /// Path delivered.
    Ok,
    /// The environment's ray cast kept failing; carries the last status.
    RayCast(i32),
    /// A pursued target moved while planning.
    TargetMoved,
    /// Maze attempt found no detour.
    NoPath,
    /// Start position is not clear.
    BadStart,
    /// Goal position is not clear or not permitted.
    BadDestination,
    /// Maze destination cell is a barrier.
    BadEnd,
    /// Static terrain path query failed; carries the environment status.
    StaticPathFailed(i32),
    /// Maze grid would exceed the size cap.
    TooBig,
    /// Maze wall-clock budget exceeded.
    Timeout,
    /// Maze memory budget exceeded.
    NoMem,
    /// Maze iteration or path-length bound exceeded.
    TooLong,
    /// Path ended while still inside an obstacle.
    UnresolvedObstacle,
    /// Segmentation backtracked past the start of the path.
    BacktrackExhausted,
    /// Request cancelled by a stop command.
    Stopped,
    /// A task hit an internal invariant failure and was reset.
    Internal,
}

impl PathStatus {
    /// Stable numeric code.
    ///
    /// Ray-cast failures report the environment's own (negative) status so
    /// the underlying cause survives the trip to the caller.
    pub fn code(&self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::RayCast(status) => *status,
            Self::TargetMoved => 1,
            Self::NoPath => 2,
            Self::BadStart => 3,
            Self::BadDestination => 4,
            Self::BadEnd => 5,
            Self::StaticPathFailed(_) => 6,
            Self::TooBig => 7,
            Self::Timeout => 8,
            Self::NoMem => 9,
            Self::TooLong => 10,
            Self::UnresolvedObstacle => 11,
            Self::BacktrackExhausted => 12,
            Self::Stopped => 13,
            Self::Internal => 99,
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::RayCast(_) => "RAYCAST",
            Self::TargetMoved => "TARGET_MOVED",
            Self::NoPath => "NO_PATH",
            Self::BadStart => "BAD_START",
            Self::BadDestination => "BAD_DESTINATION",
            Self::BadEnd => "BAD_END",
            Self::StaticPathFailed(_) => "STATIC_PATH",
            Self::TooBig => "TOO_BIG",
            Self::Timeout => "TIMEOUT",
            Self::NoMem => "NOMEM",
            Self::TooLong => "TOO_LONG",
            Self::UnresolvedObstacle => "UNRESOLVED_OBSTACLE",
            Self::BacktrackExhausted => "BACKTRACK_EXHAUSTED",
            Self::Stopped => "STOPPED",
            Self::Internal => "INTERNAL",
        }
    }

    /// Success?
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Worth a fresh planning attempt from the current pose.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RayCast(_) | Self::TargetMoved | Self::NoPath)
    }

    /// Resolved by returning to a previously good position.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::NoPath | Self::TooLong | Self::UnresolvedObstacle
        )
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RayCast(status) => write!(f, "ray cast failed (status {})", status),
            Self::StaticPathFailed(status) => {
                write!(f, "static path query failed (status {})", status)
            }
            other => write!(f, "{}", other.name()),
        }
    }
}
