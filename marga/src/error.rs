//! Error types for path planning.

use thiserror::Error;

use crate::query::RayCastError;
use crate::status::PathStatus;

/// Failure while cleaning, straightening or segmenting a path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    RayCast(#[from] RayCastError),

    #[error("invalid capsule {width}x{height}")]
    InvalidCapsule { width: f32, height: f32 },

    #[error("path needs at least two points, got {0}")]
    TooFewPoints(usize),

    #[error("path contains a non-finite point")]
    NonFinite,

    #[error("static path query failed with status {0}")]
    StaticPath(i32),

    #[error("backtracking passed the start of the path")]
    BacktrackExhausted,

    /// Internal geometric invariant broken. The owning task must reset.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl PlanError {
    /// Status reported to the caller for this failure.
    pub fn status(&self) -> PathStatus {
        match self {
            PlanError::RayCast(e) => PathStatus::RayCast(e.status),
            PlanError::InvalidCapsule { .. } | PlanError::TooFewPoints(_) | PlanError::NonFinite => {
                PathStatus::BadStart
            }
            PlanError::StaticPath(status) => PathStatus::StaticPathFailed(*status),
            PlanError::BacktrackExhausted => PathStatus::BacktrackExhausted,
            PlanError::Invariant(_) => PathStatus::Internal,
        }
    }

    /// True for broken internal invariants.
    pub fn is_invariant(&self) -> bool {
        matches!(self, PlanError::Invariant(_))
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
