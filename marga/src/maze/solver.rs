//! Greedy seek with wall-following fallback.

use std::time::Instant;

use log::{debug, trace};

use super::cursor::push_compressed;
use super::{
    CellGrid, CellState, FollowSide, Heading, MazeError, MazeLayout, MazeLimits, MazeSolution,
    StopReason, WallFollower,
};
use crate::core::geometry::ground_direction;
use crate::core::{GridCoord, WorldPoint};
use crate::path::merge_collinear;
use crate::query::{CellProbe, Prober};
use crate::world::World;

enum Phase {
    Seeking,
    WallFollowing(Box<[WallFollower; 2]>),
    Solved,
}

/// Solver for one maze grid.
///
/// Consumed by [`MazeSolver::solve`]; the cell cache lives and dies with it.
pub struct MazeSolver<'p, 'a, W: World + ?Sized> {
    prober: &'p Prober<'a, W>,
    layout: MazeLayout,
    limits: MazeLimits,
    grid: CellGrid,
    current: GridCoord,
    elevation: f32,
    /// Best Manhattan distance to the end cell reached so far
    watermark: i32,
    path: Vec<WorldPoint>,
    iterations: usize,
    cells_probed: usize,
    started: Instant,
}

impl<'p, 'a, W: World + ?Sized> MazeSolver<'p, 'a, W> {
    /// Set up a solver. Fails with [`MazeError::NoMem`] when the grid alone
    /// exceeds the memory budget.
    pub fn new(
        prober: &'p Prober<'a, W>,
        layout: MazeLayout,
        limits: MazeLimits,
    ) -> Result<Self, MazeError> {
        let grid = CellGrid::new(layout.width, layout.height);
        if grid.memory_bytes() > limits.memory_budget {
            return Err(MazeError::NoMem);
        }
        if !layout.contains(layout.start_cell) {
            return Err(MazeError::BadStart);
        }
        if !layout.contains(layout.end_cell) {
            return Err(MazeError::BadEnd);
        }

        Ok(Self {
            prober,
            current: layout.start_cell,
            elevation: layout.start.z,
            watermark: layout.start_cell.manhattan_distance(&layout.end_cell),
            path: vec![layout.start],
            layout,
            limits,
            grid,
            iterations: 0,
            cells_probed: 0,
            started: Instant::now(),
        })
    }

    /// Cell cache so far.
    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Run to completion.
    pub fn solve(mut self) -> Result<MazeSolution, MazeError> {
        if self.layout.start_cell == self.layout.end_cell {
            return Ok(self.finish());
        }
        self.check_destination()?;

        let mut phase = Phase::Seeking;
        loop {
            phase = match phase {
                Phase::Solved => break,
                Phase::Seeking => {
                    self.tick(None)?;
                    self.seek()?
                }
                Phase::WallFollowing(cursors) => {
                    self.tick(Some(&cursors))?;
                    self.follow(cursors)?
                }
            };
        }

        debug!(
            "[Maze] solved in {} iterations, {} cells probed",
            self.iterations, self.cells_probed
        );
        Ok(self.finish())
    }

    // ========================================================================
    // Phases
    // ========================================================================

    fn seek(&mut self) -> Result<Phase, MazeError> {
        if self.current == self.layout.end_cell {
            return Ok(Phase::Solved);
        }

        match self.productive_move(self.current)? {
            Some((next, z)) => {
                self.move_to(next, z);
                if next == self.layout.end_cell {
                    Ok(Phase::Solved)
                } else {
                    Ok(Phase::Seeking)
                }
            }
            None => {
                let (major, _) = axis_headings(self.layout.end_cell - self.current);
                trace!(
                    "[Maze] blocked at {:?} facing {:?}, releasing cursors",
                    self.current, major
                );
                let spawn = |side| {
                    WallFollower::new(side, self.layout.frame, self.current, self.elevation, major)
                };
                Ok(Phase::WallFollowing(Box::new([
                    spawn(FollowSide::Right),
                    spawn(FollowSide::Left),
                ])))
            }
        }
    }

    fn follow(&mut self, mut cursors: Box<[WallFollower; 2]>) -> Result<Phase, MazeError> {
        for i in 0..2 {
            let cursor = &mut cursors[i];
            if !cursor.is_active() {
                continue;
            }
            let Some((cell, z)) = cursor.advance(|from, to| self.cell_clear(from, to))? else {
                continue;
            };

            if !self.slope_plausible(cell, z) {
                cursor.stop(StopReason::SlopeExceeded);
                continue;
            }
            if cell == self.layout.end_cell {
                self.splice(cursor);
                return Ok(Phase::Solved);
            }
            if cell.manhattan_distance(&self.layout.end_cell) < self.watermark
                && self.productive_move(cell)?.is_some()
            {
                self.splice(cursor);
                return Ok(Phase::Seeking);
            }
        }

        let [right, left] = &mut *cursors;
        if right.is_active() && left.is_active() && right.collides_with(left) {
            trace!("[Maze] cursors met at {:?}", right.cell());
            right.stop(StopReason::Met);
            left.stop(StopReason::Met);
        }

        if cursors.iter().all(|c| !c.is_active()) {
            debug!(
                "[Maze] no path: right {:?}, left {:?} after {} iterations",
                cursors[0].stop_reason(),
                cursors[1].stop_reason(),
                self.iterations
            );
            return Err(MazeError::NoPath);
        }
        Ok(Phase::WallFollowing(cursors))
    }

    // ========================================================================
    // Moves
    // ========================================================================

    /// First clear step of the cascade major → minor → major.
    ///
    /// The repeated major attempt is answered from the cache.
    fn productive_move(&mut self, cell: GridCoord) -> Result<Option<(GridCoord, f32)>, MazeError> {
        let delta = self.layout.end_cell - cell;
        let (major, minor) = axis_headings(delta);
        for heading in [Some(major), minor, Some(major)].into_iter().flatten() {
            let next = cell + heading.delta();
            if let Some(z) = self.cell_clear(cell, next)? {
                return Ok(Some((next, z)));
            }
        }
        Ok(None)
    }

    fn move_to(&mut self, cell: GridCoord, elevation: f32) {
        self.current = cell;
        self.elevation = elevation;
        self.watermark = self
            .watermark
            .min(cell.manhattan_distance(&self.layout.end_cell));
        push_compressed(
            &mut self.path,
            self.layout.frame.cell_to_world(cell, elevation),
        );
    }

    /// Adopt a cursor's walk as part of the solution.
    fn splice(&mut self, cursor: &WallFollower) {
        for &p in cursor.trail() {
            push_compressed(&mut self.path, p);
        }
        self.current = cursor.cell();
        self.elevation = cursor.elevation();
        self.watermark = cursor.cell().manhattan_distance(&self.layout.end_cell);
        trace!("[Maze] {:?} cursor productive at {:?}", cursor.side(), self.current);
    }

    fn slope_plausible(&self, cell: GridCoord, elevation: f32) -> bool {
        let remaining = cell.manhattan_distance(&self.layout.end_cell).max(1) as f32;
        let reach = remaining * self.layout.frame.cell_size() * self.limits.max_slope;
        (elevation - self.layout.end.z).abs() <= reach
    }

    // ========================================================================
    // Cells
    // ========================================================================

    /// Can `to` be entered from `from`? Returns its elevation when it can.
    ///
    /// The start and end cells count as clear without probing.
    fn cell_clear(&mut self, from: GridCoord, to: GridCoord) -> Result<Option<f32>, MazeError> {
        if !self.grid.contains(to) {
            return Ok(None);
        }
        if to == self.layout.start_cell {
            return Ok(Some(self.layout.start.z));
        }
        if to == self.layout.end_cell {
            return Ok(Some(self.layout.end.z));
        }

        match self.grid.state(to) {
            CellState::Clear => Ok(self.grid.elevation(to)),
            CellState::Barrier => Ok(None),
            CellState::Unexamined => {
                let from_z = self.elevation_of(from)?;
                let frame = self.layout.frame;
                let size = frame.cell_size();
                self.cells_probed += 1;
                let probe = self.prober.probe_cell(
                    frame.cell_to_world(from, from_z),
                    frame.cell_to_world(to, from_z),
                    size,
                    self.prober.capsule().height,
                    false,
                )?;
                match probe {
                    CellProbe::Clear { elevation } => {
                        self.grid.mark_clear(to, elevation);
                        Ok(Some(elevation))
                    }
                    CellProbe::Occupied => {
                        self.grid.mark_barrier(to);
                        Ok(None)
                    }
                }
            }
        }
    }

    fn elevation_of(&self, cell: GridCoord) -> Result<f32, MazeError> {
        if cell == self.layout.start_cell {
            return Ok(self.layout.start.z);
        }
        if cell == self.layout.end_cell {
            return Ok(self.layout.end.z);
        }
        self.grid.elevation(cell).ok_or_else(|| {
            MazeError::Invariant(format!("cell {:?} occupied without a known elevation", cell))
        })
    }

    /// Full-corner probe of the destination, approached along start→end.
    fn check_destination(&mut self) -> Result<(), MazeError> {
        let size = self.layout.frame.cell_size();
        let dir = ground_direction(self.layout.start, self.layout.end);
        let end = self.layout.end;
        self.cells_probed += 1;
        let probe = self.prober.probe_cell(
            end - dir * size,
            end,
            size,
            self.prober.capsule().height,
            true,
        )?;
        if probe.is_occupied() {
            debug!("[Maze] destination {:?} is a barrier", end);
            return Err(MazeError::BadEnd);
        }
        Ok(())
    }

    // ========================================================================
    // Budgets
    // ========================================================================

    /// Count one iteration and enforce the time, iteration and memory budgets.
    fn tick(&mut self, cursors: Option<&[WallFollower; 2]>) -> Result<(), MazeError> {
        self.iterations += 1;
        if self.started.elapsed() > self.limits.time_budget {
            return Err(MazeError::Timeout);
        }
        if self.iterations > self.limits.iteration_factor * self.layout.area() {
            return Err(MazeError::TooLong);
        }
        let trail_points: usize = cursors
            .map(|c| c.iter().map(|f| f.trail().len()).sum())
            .unwrap_or(0);
        let bytes = self.grid.memory_bytes()
            + (self.path.len() + trail_points) * std::mem::size_of::<WorldPoint>();
        if bytes > self.limits.memory_budget {
            return Err(MazeError::NoMem);
        }
        Ok(())
    }

    fn finish(self) -> MazeSolution {
        let mut points = self.path;
        points[0] = self.layout.start;
        match points.len() {
            1 => points.push(self.layout.end),
            n => points[n - 1] = self.layout.end,
        }

        MazeSolution {
            points: merge_collinear(&points),
            iterations: self.iterations,
            cells_probed: self.cells_probed,
        }
    }
}

/// Dominant and secondary axis headings toward `delta`.
fn axis_headings(delta: GridCoord) -> (Heading, Option<Heading>) {
    if delta.x.abs() >= delta.y.abs() {
        let minor = (delta.y != 0).then(|| Heading::along_y(delta.y));
        (Heading::along_x(delta.x), minor)
    } else {
        let minor = (delta.x != 0).then(|| Heading::along_x(delta.x));
        (Heading::along_y(delta.y), minor)
    }
}
