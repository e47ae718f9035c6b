//! Per-solve cell cache.
//!
//! Structure-of-arrays layout: cell states in one array, the elevation each
//! clear cell was probed at in another.
//!
//! ```text
//! states:     [U C C B U U C ...]
//! elevations: [- z z - - - z ...]
//! ```

use crate::core::GridCoord;

/// What the solver knows about a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CellState {
    /// Not probed yet
    #[default]
    Unexamined = 0,
    /// Walkable; its elevation is cached
    Clear = 1,
    /// Occupied, or outside the grid
    Barrier = 2,
}

/// Cell cache for one maze grid.
#[derive(Clone, Debug)]
pub struct CellGrid {
    states: Vec<CellState>,
    elevations: Vec<f32>,
    width: usize,
    height: usize,
}

impl CellGrid {
    /// Create a grid of unexamined cells.
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            states: vec![CellState::Unexamined; size],
            elevations: vec![f32::NAN; size],
            width,
            height,
        }
    }

    /// Grid width in cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 {
            return None;
        }
        let (x, y) = (coord.x as usize, coord.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Is `coord` inside the grid?
    #[inline]
    pub fn contains(&self, coord: GridCoord) -> bool {
        self.index(coord).is_some()
    }

    /// State of a cell. Cells outside the grid are barriers.
    #[inline]
    pub fn state(&self, coord: GridCoord) -> CellState {
        self.index(coord)
            .map_or(CellState::Barrier, |idx| self.states[idx])
    }

    /// Cached elevation of a clear cell.
    pub fn elevation(&self, coord: GridCoord) -> Option<f32> {
        let idx = self.index(coord)?;
        (self.states[idx] == CellState::Clear).then_some(self.elevations[idx])
    }

    /// Record a clear cell and its elevation.
    pub fn mark_clear(&mut self, coord: GridCoord, elevation: f32) {
        if let Some(idx) = self.index(coord) {
            self.states[idx] = CellState::Clear;
            self.elevations[idx] = elevation;
        }
    }

    /// Record a barrier.
    pub fn mark_barrier(&mut self, coord: GridCoord) {
        if let Some(idx) = self.index(coord) {
            self.states[idx] = CellState::Barrier;
        }
    }

    /// Number of cells that are no longer unexamined.
    pub fn examined(&self) -> usize {
        self.states
            .iter()
            .filter(|&&s| s != CellState::Unexamined)
            .count()
    }

    /// Bytes held by the cache.
    pub fn memory_bytes(&self) -> usize {
        self.states.len() * std::mem::size_of::<CellState>()
            + self.elevations.len() * std::mem::size_of::<f32>()
    }

    /// ASCII dump, top row first (`.` unexamined, `o` clear, `#` barrier).
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                out.push(match self.states[y * self.width + x] {
                    CellState::Unexamined => '.',
                    CellState::Clear => 'o',
                    CellState::Barrier => '#',
                });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_is_barrier() {
        let grid = CellGrid::new(4, 3);
        assert_eq!(grid.state(GridCoord::new(-1, 0)), CellState::Barrier);
        assert_eq!(grid.state(GridCoord::new(4, 0)), CellState::Barrier);
        assert_eq!(grid.state(GridCoord::new(0, 3)), CellState::Barrier);
        assert_eq!(grid.state(GridCoord::new(3, 2)), CellState::Unexamined);
    }

    #[test]
    fn test_mark_and_read_back() {
        let mut grid = CellGrid::new(4, 3);
        grid.mark_clear(GridCoord::new(1, 1), 0.25);
        grid.mark_barrier(GridCoord::new(2, 1));
        grid.mark_barrier(GridCoord::new(9, 9));

        assert_eq!(grid.elevation(GridCoord::new(1, 1)), Some(0.25));
        assert_eq!(grid.elevation(GridCoord::new(2, 1)), None);
        assert_eq!(grid.examined(), 2);
        assert_eq!(grid.memory_bytes(), 12 + 48);
        assert_eq!(grid.render(), "....\n.o#.\n....\n");
    }
}
