//! Obstacle segmentation.
//!
//! Walks a cleaned path and splits it into alternating clear and blocked
//! runs. Blocked runs are handed to the maze solver, so their endpoints must
//! be standing positions the capsule fits in, and the blocked end sits an
//! exact whole number of capsule widths from the blocked start (the solver's
//! grid is aligned on the start with one cell per width).

use std::cmp::Ordering;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::core::WorldPoint;
use crate::core::geometry::ground_direction;
use crate::error::{PlanError, Result};
use crate::query::{CellProbe, MIN_CLEAR_SPAN, Prober};
use crate::status::PathStatus;
use crate::world::{RayFilter, World};

/// Position tolerance along the path (meters).
const POS_EPSILON: f32 = 1e-4;

/// Relative tolerance when re-checking a snapped candidate.
const SNAP_TOLERANCE: f32 = 1e-3;

/// Clear or needing a detour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    Clear,
    Blocked,
}

/// A typed run of the path.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub points: Vec<WorldPoint>,
}

impl Segment {
    /// Blocked run?
    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.kind == SegmentKind::Blocked
    }

    /// First point.
    pub fn start(&self) -> Option<WorldPoint> {
        self.points.first().copied()
    }

    /// Last point.
    pub fn end(&self) -> Option<WorldPoint> {
        self.points.last().copied()
    }

    /// Polyline length.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// Result of segmenting a path.
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    /// Runs in path order.
    pub segments: Vec<Segment>,
    /// `Ok`, or `UnresolvedObstacle` for a best-effort partial result.
    pub status: PathStatus,
}

impl Segmentation {
    /// Reached the destination?
    pub fn is_complete(&self) -> bool {
        self.status.is_ok()
    }

    /// Blocked runs only.
    pub fn blocked(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_blocked())
    }
}

/// Location on a polyline: raw segment index plus distance along it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathPos {
    pub segment: usize,
    pub distance: f32,
}

impl PathPos {
    /// Start of the path.
    pub const START: PathPos = PathPos {
        segment: 0,
        distance: 0.0,
    };

    /// Create a position.
    pub fn new(segment: usize, distance: f32) -> Self {
        Self { segment, distance }
    }
}

impl PartialOrd for PathPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.segment.cmp(&other.segment) {
            Ordering::Equal => self.distance.partial_cmp(&other.distance),
            ord => Some(ord),
        }
    }
}

/// Polyline with cached segment lengths.
struct Route {
    points: Vec<WorldPoint>,
    lengths: Vec<f32>,
}

impl Route {
    fn new(points: &[WorldPoint]) -> Self {
        let lengths = points.windows(2).map(|w| w[0].distance(&w[1])).collect();
        Self {
            points: points.to_vec(),
            lengths,
        }
    }

    fn last_segment(&self) -> usize {
        self.lengths.len() - 1
    }

    fn end(&self) -> PathPos {
        let last = self.last_segment();
        PathPos::new(last, self.lengths[last])
    }

    fn goal(&self) -> WorldPoint {
        self.points[self.points.len() - 1]
    }

    fn is_end(&self, pos: PathPos) -> bool {
        pos.segment >= self.last_segment()
            && pos.distance >= self.lengths[self.last_segment()] - POS_EPSILON
    }

    /// Canonical form: a position at a segment end is the next segment's start.
    fn normalize(&self, mut pos: PathPos) -> PathPos {
        let last = self.last_segment();
        while pos.segment < last && pos.distance >= self.lengths[pos.segment] - POS_EPSILON {
            pos = PathPos::new(
                pos.segment + 1,
                (pos.distance - self.lengths[pos.segment]).max(0.0),
            );
        }
        if pos.segment == last {
            pos.distance = pos.distance.min(self.lengths[last]);
        }
        pos
    }

    fn point_at(&self, pos: PathPos) -> WorldPoint {
        let a = self.points[pos.segment];
        let b = self.points[pos.segment + 1];
        let len = self.lengths[pos.segment];
        if len < POS_EPSILON {
            a
        } else {
            a.lerp(&b, (pos.distance / len).clamp(0.0, 1.0))
        }
    }

    fn direction(&self, segment: usize) -> WorldPoint {
        ground_direction(self.points[segment], self.points[segment + 1])
    }

    /// The next waypoint after `pos`.
    fn next_waypoint(&self, pos: PathPos) -> PathPos {
        self.normalize(PathPos::new(pos.segment, self.lengths[pos.segment]))
    }

    /// Move `distance` forward along the path, clamped to the end.
    fn forward(&self, pos: PathPos, distance: f32) -> PathPos {
        self.normalize(PathPos::new(pos.segment, pos.distance + distance))
    }

    /// Move `distance` back along the path; `None` past the start.
    fn back(&self, pos: PathPos, distance: f32) -> Option<PathPos> {
        let mut remaining = distance;
        let mut segment = pos.segment;
        let mut along = pos.distance;
        loop {
            if along >= remaining - POS_EPSILON {
                return Some(self.normalize(PathPos::new(segment, (along - remaining).max(0.0))));
            }
            remaining -= along;
            if segment == 0 {
                return None;
            }
            segment -= 1;
            along = self.lengths[segment];
        }
    }

    /// First position after `from` whose straight-line distance from
    /// `centre` equals `radius`, or `None` when the path ends first.
    ///
    /// Along a segment starting at `a` with unit direction `u`, the
    /// parameter solves `t² + 2t·(u·(a − centre)) + |a − centre|² − radius² = 0`.
    fn sphere_exit(
        &self,
        from: PathPos,
        centre: WorldPoint,
        radius: f32,
    ) -> Result<Option<PathPos>> {
        for segment in from.segment..=self.last_segment() {
            let (a, start_along) = if segment == from.segment {
                (self.point_at(from), from.distance)
            } else {
                (self.points[segment], 0.0)
            };
            let b = self.points[segment + 1];
            let len = self.lengths[segment] - start_along;
            if len < POS_EPSILON || b.distance(&centre) < radius {
                continue;
            }

            let u = (b - a) * (1.0 / len);
            let q = a - centre;
            let half_b = u.dot(&q);
            let c = q.dot(&q) - radius * radius;
            let discriminant = half_b * half_b - c;
            if discriminant < 0.0 {
                return Err(PlanError::Invariant(format!(
                    "negative discriminant {} snapping to radius {}",
                    discriminant, radius
                )));
            }
            let root = discriminant.sqrt();
            let t = [-half_b - root, -half_b + root]
                .into_iter()
                .filter(|t| (-POS_EPSILON..=len + POS_EPSILON).contains(t))
                .fold(f32::INFINITY, f32::min);
            if !t.is_finite() {
                return Err(PlanError::Invariant(format!(
                    "no admissible root snapping to radius {} on segment {}",
                    radius, segment
                )));
            }

            let pos = self.normalize(PathPos::new(
                segment,
                start_along + t.clamp(0.0, len),
            ));
            let snapped = self.point_at(pos).distance(&centre);
            if (snapped - radius).abs() > SNAP_TOLERANCE * radius.max(1.0) {
                return Err(PlanError::Invariant(format!(
                    "snapped point at {} misses radius {}",
                    snapped, radius
                )));
            }
            return Ok(Some(pos));
        }
        Ok(None)
    }
}

/// One run under construction; every point remembers where it sits.
struct Run {
    kind: SegmentKind,
    start: PathPos,
    points: Vec<(PathPos, WorldPoint)>,
}

impl Run {
    fn clear(start: PathPos, point: WorldPoint) -> Self {
        Self {
            kind: SegmentKind::Clear,
            start,
            points: vec![(start, point)],
        }
    }

    fn blocked(start: (PathPos, WorldPoint), end: (PathPos, WorldPoint)) -> Self {
        Self {
            kind: SegmentKind::Blocked,
            start: start.0,
            points: vec![start, end],
        }
    }
}

/// Split `points` into clear and blocked runs for the prober's capsule.
///
/// The path's first and last points must be clear standing positions.
pub fn segment_path<W: World + ?Sized>(
    prober: &Prober<'_, W>,
    points: &[WorldPoint],
) -> Result<Segmentation> {
    Segmenter::new(prober, points)?.run()
}

struct Segmenter<'p, 'a, W: World + ?Sized> {
    prober: &'p Prober<'a, W>,
    route: Route,
    runs: Vec<Run>,
    width: f32,
    height: f32,
}

impl<'p, 'a, W: World + ?Sized> Segmenter<'p, 'a, W> {
    fn new(prober: &'p Prober<'a, W>, points: &[WorldPoint]) -> Result<Self> {
        let capsule = prober.capsule();
        if !capsule.is_valid() {
            return Err(PlanError::InvalidCapsule {
                width: capsule.width,
                height: capsule.height,
            });
        }
        if points.len() < 2 {
            return Err(PlanError::TooFewPoints(points.len()));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(PlanError::NonFinite);
        }
        Ok(Self {
            prober,
            route: Route::new(points),
            runs: vec![Run::clear(PathPos::START, points[0])],
            width: capsule.width,
            height: capsule.height,
        })
    }

    fn run(mut self) -> Result<Segmentation> {
        let beam_filter = RayFilter::land_excluded();
        let mut pos = self.route.normalize(PathPos::START);

        while !self.route.is_end(pos) {
            let from = self.route.point_at(pos);
            let next = self.route.next_waypoint(pos);
            let target = self.route.points[pos.segment + 1];

            let hit = self.prober.cast_beam(from, target, true, &beam_filter)?;
            if hit.is_infinite() {
                self.current_run()?.points.push((next, target));
                pos = ensure_progress(pos, next)?;
                continue;
            }

            let hit_pos = self.route.forward(pos, hit);
            debug!(
                "[Segment] obstacle {:.2} m into segment {} at {:.2} m",
                hit, pos.segment, hit_pos.distance
            );

            let blocked_start = self.retreat(pos, hit_pos)?;
            let Some(blocked_end) = self.find_clear_space(blocked_start, hit_pos)? else {
                debug!("[Segment] obstacle unresolved at end of path");
                return Ok(self.finish(PathStatus::UnresolvedObstacle));
            };

            trace!(
                "[Segment] blocked {:?} -> {:?}",
                blocked_start.1, blocked_end.1
            );
            self.runs.push(Run::blocked(blocked_start, blocked_end));
            self.runs.push(Run::clear(blocked_end.0, blocked_end.1));
            pos = ensure_progress(pos, blocked_end.0)?;
        }

        let goal = self.route.goal();
        let reached = self
            .runs
            .last()
            .and_then(|run| run.points.last())
            .is_some_and(|(_, p)| p.distance(&goal) <= MIN_CLEAR_SPAN);
        if !reached {
            return Err(PlanError::Invariant(
                "segmentation ended away from the destination".into(),
            ));
        }
        Ok(self.finish(PathStatus::Ok))
    }

    fn current_run(&mut self) -> Result<&mut Run> {
        match self.runs.last_mut() {
            Some(run) if run.kind == SegmentKind::Clear => Ok(run),
            _ => Err(PlanError::Invariant("no open clear run".into())),
        }
    }

    /// Choose where the blocked run starts for an obstacle at `hit_pos`,
    /// first seen while scanning from `pos`.
    fn retreat(&mut self, pos: PathPos, hit_pos: PathPos) -> Result<(PathPos, WorldPoint)> {
        // One width back is still on the stretch the beam just cleared
        if let Some(candidate) = self.route.back(hit_pos, self.width)
            && candidate >= pos
        {
            let point = self.route.point_at(candidate);
            return self.cut_current_run(candidate, point);
        }
        self.find_unobstructed_point(hit_pos)
    }

    /// Search back from the obstacle one width at a time over the current
    /// clear run. Past its start the previous blocked run is reopened; past
    /// the start of the path the search fails.
    fn find_unobstructed_point(&mut self, hit_pos: PathPos) -> Result<(PathPos, WorldPoint)> {
        let run_start = self.current_run()?.start;
        let mut steps = 1usize;
        loop {
            match self.route.back(hit_pos, steps as f32 * self.width) {
                Some(candidate) if candidate > run_start => {
                    if let CellProbe::Clear { elevation } = self.probe_at(candidate, run_start, true)? {
                        let point = self.route.point_at(candidate).with_z(elevation);
                        debug!("[Segment] backtracked {} widths", steps);
                        return self.cut_current_run(candidate, point);
                    }
                    steps += 1;
                }
                _ => break,
            }
        }

        if self.runs.len() >= 3 {
            return self.reopen_previous_blocked();
        }

        // First run: the path start is the last candidate
        if let CellProbe::Clear { elevation } = self.probe_at(run_start, run_start, true)? {
            let point = self.route.point_at(run_start).with_z(elevation);
            return self.cut_current_run(run_start, point);
        }
        debug!("[Segment] backtrack exhausted at path start");
        Err(PlanError::BacktrackExhausted)
    }

    /// Drop emitted points beyond `pos` and end the current run there.
    fn cut_current_run(&mut self, pos: PathPos, point: WorldPoint) -> Result<(PathPos, WorldPoint)> {
        let run = self.current_run()?;
        run.points.retain(|(p, _)| *p < pos);
        run.points.push((pos, point));
        Ok((pos, point))
    }

    /// Merge the upcoming blocked run with the previous one.
    fn reopen_previous_blocked(&mut self) -> Result<(PathPos, WorldPoint)> {
        self.runs.pop();
        match self.runs.pop() {
            Some(run) if run.kind == SegmentKind::Blocked => {
                debug!("[Segment] merging with previous blocked run");
                run.points
                    .first()
                    .copied()
                    .ok_or_else(|| PlanError::Invariant("empty blocked run".into()))
            }
            _ => Err(PlanError::Invariant(
                "expected a blocked run before the current clear run".into(),
            )),
        }
    }

    /// Step forward from the blocked start one width at a time until a
    /// standing position is found past the obstacle.
    ///
    /// Candidates are snapped so their straight-line distance from the
    /// blocked start is a whole number of widths. Running off the end makes
    /// the destination the final candidate; `None` if it is occupied too.
    fn find_clear_space(
        &mut self,
        start: (PathPos, WorldPoint),
        hit_pos: PathPos,
    ) -> Result<Option<(PathPos, WorldPoint)>> {
        let (start_pos, start_point) = start;
        let hit_point = self.route.point_at(hit_pos);
        let mut widths = (start_point.distance(&hit_point) / self.width).floor() as usize + 1;
        let mut last = start_pos;

        loop {
            let radius = widths as f32 * self.width;
            let Some(candidate) = self.route.sphere_exit(start_pos, start_point, radius)? else {
                let end = self.route.end();
                return Ok(match self.probe_at(end, start_pos, false)? {
                    CellProbe::Clear { elevation } => Some((end, self.route.goal().with_z(elevation))),
                    CellProbe::Occupied => None,
                });
            };
            last = ensure_progress(last, candidate)?;

            if let CellProbe::Clear { elevation } = self.probe_at(candidate, start_pos, false)? {
                let point = self.route.point_at(candidate).with_z(elevation);
                trace!("[Segment] clear space {} widths past blocked start", widths);
                return Ok(Some((candidate, point)));
            }
            widths += 1;
        }
    }

    /// Probe the cell at `pos`, approached from one width back along the
    /// path but never from before `floor`.
    fn probe_at(&self, pos: PathPos, floor: PathPos, all_corners: bool) -> Result<CellProbe> {
        let to = self.route.point_at(pos);
        let origin = self
            .route
            .back(pos, self.width)
            .filter(|b| *b >= floor)
            .unwrap_or(floor);
        let mut from = self.route.point_at(origin);
        if from.distance_xy(&to) < MIN_CLEAR_SPAN {
            let segment = pos.segment.min(self.route.last_segment());
            from = to - self.route.direction(segment) * MIN_CLEAR_SPAN;
        }
        Ok(self
            .prober
            .probe_cell(from, to, self.width, self.height, all_corners)?)
    }

    fn finish(self, status: PathStatus) -> Segmentation {
        let segments: Vec<Segment> = self
            .runs
            .into_iter()
            .filter(|run| run.points.len() >= 2)
            .map(|run| Segment {
                kind: run.kind,
                points: run.points.into_iter().map(|(_, p)| p).collect(),
            })
            .collect();
        debug!(
            "[Segment] {} runs ({} blocked), status {}",
            segments.len(),
            segments.iter().filter(|s| s.is_blocked()).count(),
            status
        );
        Segmentation { segments, status }
    }
}

fn ensure_progress(old: PathPos, new: PathPos) -> Result<PathPos> {
    if new > old {
        Ok(new)
    } else {
        Err(PlanError::Invariant(format!(
            "no forward progress: {:?} -> {:?}",
            old, new
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pt(x: f32, y: f32) -> WorldPoint {
        WorldPoint::new(x, y, 0.0)
    }

    fn l_route() -> Route {
        Route::new(&[pt(0.0, 0.0), pt(4.0, 0.0), pt(4.0, 3.0)])
    }

    #[test]
    fn test_path_pos_ordering() {
        assert!(PathPos::new(1, 0.0) > PathPos::new(0, 9.0));
        assert!(PathPos::new(1, 0.5) > PathPos::new(1, 0.25));
    }

    #[test]
    fn test_normalize_and_back() {
        let route = l_route();
        assert_eq!(route.normalize(PathPos::new(0, 4.0)), PathPos::new(1, 0.0));
        assert_eq!(route.normalize(PathPos::new(1, 9.0)), PathPos::new(1, 3.0));
        let back = route.back(PathPos::new(1, 1.0), 2.0).unwrap();
        assert_eq!(back.segment, 0);
        assert_relative_eq!(back.distance, 3.0, epsilon = 1e-5);
        assert!(route.back(PathPos::new(0, 1.0), 2.0).is_none());
    }

    #[test]
    fn test_sphere_exit_around_corner() {
        let route = l_route();
        let centre = pt(3.0, 0.0);
        let pos = route
            .sphere_exit(PathPos::new(0, 3.0), centre, 2.0)
            .unwrap()
            .unwrap();
        assert_eq!(pos.segment, 1);
        let p = route.point_at(pos);
        assert_relative_eq!(p.distance(&centre), 2.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 3.0f32.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn test_sphere_exit_runs_off_end() {
        let route = l_route();
        assert!(
            route
                .sphere_exit(PathPos::START, pt(0.0, 0.0), 10.0)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_progress_guard() {
        assert!(ensure_progress(PathPos::new(0, 1.0), PathPos::new(0, 1.5)).is_ok());
        let err = ensure_progress(PathPos::new(1, 0.0), PathPos::new(0, 3.0)).unwrap_err();
        assert!(err.is_invariant());
    }
}
