//! Maze solver for blocked path segments.
//!
//! A blocked segment gets its own small grid, aligned with the
//! start→end direction and one capsule width per cell. The solver walks it
//! greedily toward the goal and, when the direct move is blocked, releases
//! two wall-following cursors (right hand and left hand) until one of them
//! finds a cell from which progress resumes.
//!
//! ```rust,ignore
//! let limits = MazeLimits::default();
//! let solution = solve_maze(&prober, blocked.start, blocked.end, &limits)?;
//! ```
//!
//! Cells are probed lazily with [`Prober::probe_cell`] and cached for the
//! duration of one solve. Every solve is bounded by wall-clock time,
//! iteration count and memory.

mod cursor;
mod grid;
mod solver;

pub use cursor::{FollowSide, Heading, StopReason, WallFollower};
pub use grid::{CellGrid, CellState};
pub use solver::MazeSolver;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{GridCoord, GridFrame, WorldPoint};
use crate::query::{Prober, RayCastError};
use crate::status::PathStatus;
use crate::world::World;

/// Budgets and shape limits for one solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MazeLimits {
    /// Largest grid side in cells.
    pub max_grid_cells: usize,
    /// Free cells kept around the start/end span.
    pub margin_cells: usize,
    /// Wall-clock budget.
    pub time_budget: Duration,
    /// Iteration cap as a multiple of the grid area.
    pub iteration_factor: usize,
    /// Memory budget in bytes (grid plus accumulated paths).
    pub memory_budget: usize,
    /// Largest plausible rise per meter toward the goal.
    pub max_slope: f32,
}

impl Default for MazeLimits {
    fn default() -> Self {
        Self {
            max_grid_cells: 45,
            margin_cells: 4,
            time_budget: Duration::from_secs(2),
            iteration_factor: 4,
            memory_budget: 64 * 1024,
            max_slope: 1.0,
        }
    }
}

/// Why a solve failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MazeError {
    #[error("maze start is invalid")]
    BadStart,

    #[error("maze destination cell is a barrier")]
    BadEnd,

    #[error("no detour found")]
    NoPath,

    #[error("solve exceeded its time budget")]
    Timeout,

    #[error("solve exceeded its memory budget")]
    NoMem,

    #[error("solve exceeded its iteration bound")]
    TooLong,

    #[error("grid of {0} cells exceeds the size cap")]
    TooBig(usize),

    #[error(transparent)]
    RayCast(#[from] RayCastError),

    /// Internal invariant broken. The owning task must reset.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl MazeError {
    /// Status reported to the caller for this failure.
    pub fn status(&self) -> PathStatus {
        match self {
            MazeError::BadStart => PathStatus::BadStart,
            MazeError::BadEnd => PathStatus::BadEnd,
            MazeError::NoPath => PathStatus::NoPath,
            MazeError::Timeout => PathStatus::Timeout,
            MazeError::NoMem => PathStatus::NoMem,
            MazeError::TooLong => PathStatus::TooLong,
            MazeError::TooBig(_) => PathStatus::TooBig,
            MazeError::RayCast(e) => PathStatus::RayCast(e.status),
            MazeError::Invariant(_) => PathStatus::Internal,
        }
    }

    /// True for broken internal invariants.
    pub fn is_invariant(&self) -> bool {
        matches!(self, MazeError::Invariant(_))
    }
}

/// Grid placement for one blocked segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MazeLayout {
    /// Cell ↔ world mapping.
    pub frame: GridFrame,
    /// Columns (along start→end).
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// Cell holding the start point.
    pub start_cell: GridCoord,
    /// Cell holding the end point.
    pub end_cell: GridCoord,
    /// Exact requested start.
    pub start: WorldPoint,
    /// Exact requested end.
    pub end: WorldPoint,
}

impl MazeLayout {
    /// Size and place the grid for a start/end pair.
    ///
    /// Columns span the distance plus the margin on both sides; rows match
    /// the columns (at least the two margins) so detours have room either way.
    pub fn plan(
        start: WorldPoint,
        end: WorldPoint,
        cell_size: f32,
        limits: &MazeLimits,
    ) -> Result<Self, MazeError> {
        if !start.is_finite() || !(cell_size > 0.0) {
            return Err(MazeError::BadStart);
        }
        if !end.is_finite() {
            return Err(MazeError::BadEnd);
        }

        let span = (start.distance_xy(&end) / cell_size).round() as usize;
        let margin = limits.margin_cells;
        let width = span + 1 + 2 * margin;
        if width > limits.max_grid_cells {
            return Err(MazeError::TooBig(width));
        }
        let height = width.max(2 * margin + 1).min(limits.max_grid_cells);

        let row = (height / 2) as i32;
        let start_cell = GridCoord::new(margin as i32, row);
        let end_cell = GridCoord::new((margin + span) as i32, row);
        let frame = GridFrame::aligned(start, end, cell_size, start_cell);

        Ok(Self {
            frame,
            width,
            height,
            start_cell,
            end_cell,
            start,
            end,
        })
    }

    /// Grid area in cells.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Is `coord` inside the grid?
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as usize) < self.width && (coord.y as usize) < self.height
    }
}

/// A detour found by the solver.
#[derive(Clone, Debug, PartialEq)]
pub struct MazeSolution {
    /// Polyline from the exact start to the exact end.
    pub points: Vec<WorldPoint>,
    /// Solver iterations used.
    pub iterations: usize,
    /// Cells probed against the world.
    pub cells_probed: usize,
}

impl MazeSolution {
    /// Polyline length.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// Plan a grid for `start`→`end` at the prober's capsule width and solve it.
pub fn solve_maze<W: World + ?Sized>(
    prober: &Prober<'_, W>,
    start: WorldPoint,
    end: WorldPoint,
    limits: &MazeLimits,
) -> Result<MazeSolution, MazeError> {
    let layout = MazeLayout::plan(start, end, prober.capsule().width, limits)?;
    MazeSolver::new(prober, layout, limits.clone())?.solve()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_centres_the_span() {
        let limits = MazeLimits::default();
        let layout = MazeLayout::plan(
            WorldPoint::new(7.0, 0.0, 0.0),
            WorldPoint::new(14.0, 0.0, 0.0),
            1.0,
            &limits,
        )
        .unwrap();
        assert_eq!(layout.width, 16);
        assert_eq!(layout.height, 16);
        assert_eq!(layout.start_cell, GridCoord::new(4, 8));
        assert_eq!(layout.end_cell, GridCoord::new(11, 8));
        assert_eq!(layout.frame.world_to_cell(layout.end), layout.end_cell);
    }

    #[test]
    fn test_layout_too_big() {
        let limits = MazeLimits::default();
        let err = MazeLayout::plan(
            WorldPoint::ZERO,
            WorldPoint::new(60.0, 0.0, 0.0),
            1.0,
            &limits,
        )
        .unwrap_err();
        assert_eq!(err, MazeError::TooBig(69));
        assert_eq!(err.status(), PathStatus::TooBig);
    }

    #[test]
    fn test_layout_rejects_bad_input() {
        let limits = MazeLimits::default();
        assert_eq!(
            MazeLayout::plan(WorldPoint::new(f32::NAN, 0.0, 0.0), WorldPoint::ZERO, 1.0, &limits),
            Err(MazeError::BadStart)
        );
        assert_eq!(
            MazeLayout::plan(WorldPoint::ZERO, WorldPoint::new(0.0, f32::INFINITY, 0.0), 1.0, &limits),
            Err(MazeError::BadEnd)
        );
        assert_eq!(
            MazeLayout::plan(WorldPoint::ZERO, WorldPoint::UP, 0.0, &limits),
            Err(MazeError::BadStart)
        );
    }
}
