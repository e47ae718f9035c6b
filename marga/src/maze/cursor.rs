//! Wall-following cursors.
//!
//! A cursor keeps a wall on one side while it walks. Each call to
//! [`WallFollower::advance`] applies exactly one rule:
//!
//! | ahead   | other side | follow-side diagonal | action                          |
//! |---------|------------|----------------------|---------------------------------|
//! | blocked | blocked    | -                    | reverse (dead end)              |
//! | blocked | clear      | -                    | turn away from the wall         |
//! | clear   | -          | clear                | step, then turn toward the wall |
//! | clear   | -          | blocked              | step                            |

use serde::{Deserialize, Serialize};

use super::MazeError;
use crate::core::geometry::{COLLINEAR_TOLERANCE, is_collinear};
use crate::core::{GridCoord, GridFrame, WorldPoint};

/// Grid heading. East is the grid +X axis (start toward end).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// One-cell step in this heading.
    pub fn delta(self) -> GridCoord {
        match self {
            Heading::North => GridCoord::new(0, 1),
            Heading::East => GridCoord::new(1, 0),
            Heading::South => GridCoord::new(0, -1),
            Heading::West => GridCoord::new(-1, 0),
        }
    }

    /// Quarter turn clockwise.
    pub fn clockwise(self) -> Heading {
        match self {
            Heading::North => Heading::East,
            Heading::East => Heading::South,
            Heading::South => Heading::West,
            Heading::West => Heading::North,
        }
    }

    /// Quarter turn counter-clockwise.
    pub fn counter_clockwise(self) -> Heading {
        match self {
            Heading::North => Heading::West,
            Heading::West => Heading::South,
            Heading::South => Heading::East,
            Heading::East => Heading::North,
        }
    }

    /// Half turn.
    pub fn reversed(self) -> Heading {
        self.clockwise().clockwise()
    }

    /// Quarter turn toward `side`.
    pub fn toward(self, side: FollowSide) -> Heading {
        match side {
            FollowSide::Right => self.clockwise(),
            FollowSide::Left => self.counter_clockwise(),
        }
    }

    /// East or west by the sign of `dx`.
    pub fn along_x(dx: i32) -> Heading {
        if dx >= 0 { Heading::East } else { Heading::West }
    }

    /// North or south by the sign of `dy`.
    pub fn along_y(dy: i32) -> Heading {
        if dy >= 0 { Heading::North } else { Heading::South }
    }
}

/// Which hand stays on the wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowSide {
    Right,
    Left,
}

impl FollowSide {
    pub fn opposite(self) -> FollowSide {
        match self {
            FollowSide::Right => FollowSide::Left,
            FollowSide::Left => FollowSide::Right,
        }
    }
}

/// Why a cursor stopped walking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Back on its own first cell and heading
    Looped,
    /// Ran head-on into the other cursor
    Met,
    /// Elevation no longer plausible for reaching the goal
    SlopeExceeded,
}

/// One wall-following cursor.
#[derive(Clone, Debug)]
pub struct WallFollower {
    side: FollowSide,
    frame: GridFrame,
    cell: GridCoord,
    elevation: f32,
    heading: Heading,
    /// Cell held before the last rule
    previous: GridCoord,
    /// First (cell, heading) after spawning
    anchor: Option<(GridCoord, Heading)>,
    moves: usize,
    trail: Vec<WorldPoint>,
    stopped: Option<StopReason>,
}

impl WallFollower {
    /// Spawn a cursor on `cell`, facing the blocked `heading`.
    pub fn new(
        side: FollowSide,
        frame: GridFrame,
        cell: GridCoord,
        elevation: f32,
        heading: Heading,
    ) -> Self {
        Self {
            side,
            frame,
            cell,
            elevation,
            heading,
            previous: cell,
            anchor: None,
            moves: 0,
            trail: Vec::new(),
            stopped: None,
        }
    }

    #[inline]
    pub fn side(&self) -> FollowSide {
        self.side
    }

    #[inline]
    pub fn cell(&self) -> GridCoord {
        self.cell
    }

    #[inline]
    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    #[inline]
    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Cells entered since spawning.
    #[inline]
    pub fn moves(&self) -> usize {
        self.moves
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.stopped.is_none()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stopped
    }

    pub fn stop(&mut self, reason: StopReason) {
        self.stopped.get_or_insert(reason);
    }

    /// Compressed world-space trail of entered cells.
    pub fn trail(&self) -> &[WorldPoint] {
        &self.trail
    }

    /// Did the last rule carry this cursor across `other`'s last step?
    pub fn collides_with(&self, other: &WallFollower) -> bool {
        if self.moves == 0 || other.moves == 0 {
            return false;
        }
        let head_on = self.cell == other.cell && self.heading == other.heading.reversed();
        let swapped = self.cell == other.previous
            && other.cell == self.previous
            && self.cell != self.previous;
        head_on || swapped
    }

    /// Apply one wall-following rule.
    ///
    /// `clear(from, to)` answers whether `to` can be entered from `from`,
    /// with the elevation of `to` when it can. Returns the cell entered, if
    /// any.
    pub fn advance<F>(&mut self, mut clear: F) -> Result<Option<(GridCoord, f32)>, MazeError>
    where
        F: FnMut(GridCoord, GridCoord) -> Result<Option<f32>, MazeError>,
    {
        if self.stopped.is_some() {
            return Ok(None);
        }
        self.previous = self.cell;

        let ahead = self.cell + self.heading.delta();
        let entered = match clear(self.cell, ahead)? {
            None => {
                let away = self.heading.toward(self.side.opposite());
                self.heading = if clear(self.cell, self.cell + away.delta())?.is_some() {
                    away
                } else {
                    self.heading.reversed()
                };
                None
            }
            Some(z) => {
                let inward = self.heading.toward(self.side);
                let outside_corner = clear(ahead, ahead + inward.delta())?.is_some();
                self.enter(ahead, z);
                if outside_corner {
                    self.heading = inward;
                }
                Some((ahead, z))
            }
        };

        match self.anchor {
            None => self.anchor = Some((self.cell, self.heading)),
            Some(anchor) if anchor == (self.cell, self.heading) => {
                self.stopped = Some(StopReason::Looped);
            }
            Some(_) => {}
        }
        Ok(entered)
    }

    fn enter(&mut self, cell: GridCoord, elevation: f32) {
        self.cell = cell;
        self.elevation = elevation;
        self.moves += 1;
        push_compressed(&mut self.trail, self.frame.cell_to_world(cell, elevation));
    }
}

/// Append `p`, first dropping trailing points it makes redundant.
pub(super) fn push_compressed(points: &mut Vec<WorldPoint>, p: WorldPoint) {
    while points.len() >= 2 {
        let n = points.len();
        if is_collinear(points[n - 2], points[n - 1], p, COLLINEAR_TOLERANCE) {
            points.pop();
        } else {
            break;
        }
    }
    if points.last() != Some(&p) {
        points.push(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn frame() -> GridFrame {
        GridFrame::new(WorldPoint::ZERO, 1.0, 0.0)
    }

    /// Oracle over a set of blocked cells inside a 10x10 grid.
    fn oracle(
        blocked: &HashSet<(i32, i32)>,
    ) -> impl FnMut(GridCoord, GridCoord) -> Result<Option<f32>, MazeError> + '_ {
        move |_, to| {
            let inside = (0..10).contains(&to.x) && (0..10).contains(&to.y);
            Ok((inside && !blocked.contains(&(to.x, to.y))).then_some(0.0))
        }
    }

    #[test]
    fn test_heading_turns() {
        assert_eq!(Heading::North.toward(FollowSide::Right), Heading::East);
        assert_eq!(Heading::North.toward(FollowSide::Left), Heading::West);
        assert_eq!(Heading::East.reversed(), Heading::West);
        assert_eq!(Heading::along_x(-3), Heading::West);
        assert_eq!(Heading::along_y(2), Heading::North);
    }

    #[test]
    fn test_inside_corner_turns_away() {
        let blocked: HashSet<_> = [(5, 5)].into_iter().collect();
        let mut cursor = WallFollower::new(
            FollowSide::Right,
            frame(),
            GridCoord::new(4, 5),
            0.0,
            Heading::East,
        );
        let entered = cursor.advance(oracle(&blocked)).unwrap();
        assert_eq!(entered, None);
        assert_eq!(cursor.heading(), Heading::North);
        assert!(cursor.is_active());
    }

    #[test]
    fn test_dead_end_reverses_then_loops() {
        let blocked: HashSet<_> = [(5, 5), (4, 6), (4, 4), (3, 5)].into_iter().collect();
        let mut cursor = WallFollower::new(
            FollowSide::Right,
            frame(),
            GridCoord::new(4, 5),
            0.0,
            Heading::East,
        );
        cursor.advance(oracle(&blocked)).unwrap();
        assert_eq!(cursor.heading(), Heading::West);
        cursor.advance(oracle(&blocked)).unwrap();
        assert_eq!(cursor.heading(), Heading::East);
        cursor.advance(oracle(&blocked)).unwrap();
        assert_eq!(cursor.stop_reason(), Some(StopReason::Looped));
        assert_eq!(cursor.moves(), 0);
    }

    #[test]
    fn test_circles_single_block() {
        let blocked: HashSet<_> = [(5, 5)].into_iter().collect();
        let mut cursor = WallFollower::new(
            FollowSide::Right,
            frame(),
            GridCoord::new(4, 5),
            0.0,
            Heading::East,
        );
        let mut visited = HashSet::new();
        for _ in 0..32 {
            if !cursor.is_active() {
                break;
            }
            if let Some((cell, _)) = cursor.advance(oracle(&blocked)).unwrap() {
                assert!(cell.manhattan_distance(&GridCoord::new(5, 5)) <= 2);
                visited.insert(cell);
            }
        }
        assert_eq!(cursor.stop_reason(), Some(StopReason::Looped));
        assert_eq!(cursor.cell(), GridCoord::new(4, 5));
        // The loop passes all four sides of the block
        for side in [(4, 5), (5, 6), (6, 5), (5, 4)] {
            assert!(visited.contains(&GridCoord::new(side.0, side.1)));
        }
    }

    #[test]
    fn test_swapped_cells_collide() {
        let mut a = WallFollower::new(FollowSide::Right, frame(), GridCoord::new(2, 2), 0.0, Heading::North);
        let mut b = WallFollower::new(FollowSide::Left, frame(), GridCoord::new(2, 3), 0.0, Heading::South);
        assert!(!a.collides_with(&b));

        let open = HashSet::new();
        a.advance(oracle(&open)).unwrap();
        b.advance(oracle(&open)).unwrap();
        assert_eq!(a.cell(), GridCoord::new(2, 3));
        assert_eq!(b.cell(), GridCoord::new(2, 2));
        assert!(a.collides_with(&b));
        assert!(b.collides_with(&a));
    }

    #[test]
    fn test_head_on_in_corridor() {
        // Walls along rows 1 and 3 leave a corridor on row 2
        let blocked: HashSet<_> = (0..10).flat_map(|x| [(x, 1), (x, 3)]).collect();
        let mut a = WallFollower::new(FollowSide::Right, frame(), GridCoord::new(2, 2), 0.0, Heading::East);
        let mut b = WallFollower::new(FollowSide::Left, frame(), GridCoord::new(4, 2), 0.0, Heading::West);
        a.advance(oracle(&blocked)).unwrap();
        b.advance(oracle(&blocked)).unwrap();
        assert_eq!(a.cell(), GridCoord::new(3, 2));
        assert_eq!(b.cell(), GridCoord::new(3, 2));
        assert!(a.collides_with(&b));
    }

    #[test]
    fn test_push_compressed() {
        let mut points = Vec::new();
        for x in 0..4 {
            push_compressed(&mut points, WorldPoint::new(x as f32, 0.0, 0.0));
        }
        push_compressed(&mut points, WorldPoint::new(3.0, 1.0, 0.0));
        push_compressed(&mut points, WorldPoint::new(3.0, 1.0, 0.0));
        assert_eq!(
            points,
            vec![
                WorldPoint::new(0.0, 0.0, 0.0),
                WorldPoint::new(3.0, 0.0, 0.0),
                WorldPoint::new(3.0, 1.0, 0.0),
            ]
        );
    }
}
