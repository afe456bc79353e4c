use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;

use crate::cell::{Axis, CellState, NEIGHBOUR_STEPS};
use crate::cost::RouterConfig;
use crate::grid::{Grid, GridDims};
use crate::path::{Path, RouteRequest};

/// The outcome of a BFS expansion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// The destination was popped with this finite cost.
    Reachable { cost: u32 },
    /// The queue emptied before the destination was reached.
    Unreachable,
}

/// The outcome of a transactional commit attempt. Only `Ok` hands the
/// path to the caller; `Collision` and `Contention` are expected data
/// outcomes under concurrency, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Ok,
    Collision,
    Contention,
}

/// The result of running one work item through expand, backtrace, and
/// commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Committed(Path),
    Unreachable,
    Collision,
    Contention,
}

/// A per-worker deep copy of the shared grid's cell states, used for
/// expansion so that one worker's in-progress BFS never perturbs
/// another.
///
/// Reused across requests by the worker that owns it: `reset_from`
/// re-snapshots the live grid and clears the per-attempt bookkeeping,
/// avoiding a fresh allocation for every work item.
pub struct ScratchGrid {
    dims: GridDims,
    cells: Vec<CellState>,
    incoming_axis: Vec<Option<Axis>>,
    queue: VecDeque<usize>,
}

impl ScratchGrid {
    pub fn new(grid: &Grid) -> Self {
        let dims = grid.dims();
        let len = dims.len();
        Self {
            dims,
            cells: vec![CellState::Empty; len],
            incoming_axis: vec![None; len],
            queue: VecDeque::new(),
        }
    }

    fn reset_from(&mut self, grid: &Grid) {
        grid.copy_state_into(&mut self.cells);
        self.incoming_axis.clear();
        self.incoming_axis.resize(self.cells.len(), None);
        self.queue.clear();
    }

    fn distance_at(&self, index: usize) -> Option<u32> {
        self.cells[index].distance()
    }
}

/// The router: owns the immutable cost model and commit retry budget,
/// and implements expand, backtrace, and commit.
pub struct Router {
    config: RouterConfig,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Runs expand, then (on success) backtrace and commit, for a
    /// single work item. A collision or contention discards the
    /// candidate path and is reported back to the caller, who moves on
    /// to the next item without retrying this one.
    pub fn attempt(
        &self,
        grid: &Grid,
        scratch: &mut ScratchGrid,
        request: RouteRequest,
    ) -> AttemptOutcome {
        match self.expand(grid, scratch, request) {
            ExpandOutcome::Unreachable => AttemptOutcome::Unreachable,
            ExpandOutcome::Reachable { .. } => {
                let path = self.backtrace(scratch, request);
                match self.commit(grid, &path) {
                    CommitOutcome::Ok => AttemptOutcome::Committed(path),
                    CommitOutcome::Collision => AttemptOutcome::Collision,
                    CommitOutcome::Contention => AttemptOutcome::Contention,
                }
            }
        }
    }

    /// Breadth-first expansion with per-axis costs.
    pub fn expand(
        &self,
        grid: &Grid,
        scratch: &mut ScratchGrid,
        request: RouteRequest,
    ) -> ExpandOutcome {
        scratch.reset_from(grid);
        let dims = scratch.dims;

        let source_idx = dims.flatten(
            request.source.0,
            request.source.1,
            request.source.2,
        );
        let dest_idx = dims.flatten(
            request.destination.0,
            request.destination.1,
            request.destination.2,
        );

        scratch.cells[source_idx] = CellState::Distance(0);
        scratch.incoming_axis[source_idx] = None;
        scratch.queue.push_back(source_idx);

        while let Some(c) = scratch.queue.pop_front() {
            if c == dest_idx {
                let cost = scratch
                    .distance_at(c)
                    .expect("a dequeued cell always carries a finite distance");
                return ExpandOutcome::Reachable { cost };
            }

            let k = scratch
                .distance_at(c)
                .expect("a dequeued cell always carries a finite distance");
            let (cx, cy, cz) = dims.unflatten(c);
            let incoming = scratch.incoming_axis[c];

            for step in NEIGHBOUR_STEPS {
                let (nx, ny, nz) = match step.axis {
                    Axis::X => (cx + step.delta, cy, cz),
                    Axis::Y => (cx, cy + step.delta, cz),
                    Axis::Z => (cx, cy, cz + step.delta),
                };
                if !dims.is_valid(nx, ny, nz) {
                    continue;
                }
                let n = dims.flatten(nx, ny, nz);

                if n != dest_idx {
                    if let CellState::Full | CellState::Wall = scratch.cells[n] {
                        continue;
                    }
                }

                let bend = match incoming {
                    Some(axis) if axis != step.axis => self.config.bend_cost,
                    _ => 0,
                };
                let candidate = k + self.config.axis_cost(step.axis) + bend;

                let relax = match scratch.cells[n] {
                    CellState::Empty => true,
                    CellState::Distance(existing) => existing > candidate,
                    // Only reachable here when n == dest_idx and the
                    // destination hasn't been visited yet: always
                    // relax the first time.
                    CellState::Full | CellState::Wall => true,
                };

                if relax {
                    scratch.cells[n] = CellState::Distance(candidate);
                    scratch.incoming_axis[n] = Some(step.axis);
                    scratch.queue.push_back(n);
                }
            }
        }

        ExpandOutcome::Unreachable
    }

    /// Gradient-descent backtrace from the destination to the source.
    /// Ties are broken deterministically: axes in order x, y, z, and
    /// within an axis, the negative direction before the positive one
    /// — the same order `NEIGHBOUR_STEPS` is defined in.
    pub fn backtrace(&self, scratch: &ScratchGrid, request: RouteRequest) -> Path {
        let dims = scratch.dims;
        let source_idx = dims.flatten(
            request.source.0,
            request.source.1,
            request.source.2,
        );
        let dest_idx = dims.flatten(
            request.destination.0,
            request.destination.1,
            request.destination.2,
        );

        let mut reversed = vec![dest_idx];
        let mut cur = dest_idx;

        while cur != source_idx {
            let k = scratch
                .distance_at(cur)
                .expect("backtrace only visits cells expand proved reachable");
            let (cx, cy, cz) = dims.unflatten(cur);

            let mut predecessor = None;
            for step in NEIGHBOUR_STEPS {
                // `step` is the forward move predecessor -> cur, so
                // the predecessor sits one step back along it.
                let (px, py, pz) = match step.axis {
                    Axis::X => (cx - step.delta, cy, cz),
                    Axis::Y => (cx, cy - step.delta, cz),
                    Axis::Z => (cx, cy, cz - step.delta),
                };
                if !dims.is_valid(px, py, pz) {
                    continue;
                }
                let p = dims.flatten(px, py, pz);
                let Some(pd) = scratch.distance_at(p) else {
                    continue;
                };
                let bend = match scratch.incoming_axis[p] {
                    Some(axis) if axis != step.axis => self.config.bend_cost,
                    _ => 0,
                };
                if pd + self.config.axis_cost(step.axis) + bend == k {
                    predecessor = Some(p);
                    break;
                }
            }

            let p = predecessor
                .expect("expand's distance field always admits a consistent predecessor");
            reversed.push(p);
            cur = p;
        }

        reversed.reverse();
        Path::new(reversed)
    }

    /// The transactional commit protocol: sort interior cells by
    /// ascending flat index (a cycle-free lock order every worker
    /// computes identically), try-acquire with bounded randomized
    /// backoff, validate under lock, apply, release.
    pub fn commit(&self, grid: &Grid, path: &Path) -> CommitOutcome {
        let mut order: Vec<usize> = path.interior().to_vec();
        order.sort_unstable();

        let mut held = Vec::with_capacity(order.len());
        for &cell in &order {
            match self.acquire_with_backoff(grid, cell) {
                Some(guard) => held.push(guard),
                None => {
                    tracing::warn!(cell, tries = self.config.max_tries, "commit contention");
                    drop(held);
                    return CommitOutcome::Contention;
                }
            }
        }

        for &cell in &order {
            if grid.get_index(cell) == CellState::Full {
                drop(held);
                return CommitOutcome::Collision;
            }
        }

        for &cell in &order {
            grid.set_index(cell, CellState::Full);
        }

        drop(held);
        CommitOutcome::Ok
    }

    fn acquire_with_backoff<'a>(
        &self,
        grid: &'a Grid,
        cell: usize,
    ) -> Option<crate::grid::CellGuard<'a>> {
        if let Some(guard) = grid.try_lock_cell(cell) {
            return Some(guard);
        }
        let mut rng = rand::thread_rng();
        for _ in 1..self.config.max_tries {
            if self.config.max_timeout_nanos > 0 {
                let nanos = rng.gen_range(0..self.config.max_timeout_nanos);
                std::thread::sleep(Duration::from_nanos(u64::from(nanos)));
            }
            if let Some(guard) = grid.try_lock_cell(cell) {
                return Some(guard);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn flat_grid(w: i64, h: i64, d: i64) -> Grid {
        Grid::new(w, h, d).unwrap()
    }

    #[test]
    fn e1_straight_shot_path_has_expected_length() {
        let grid = flat_grid(4, 4, 1);
        let router = Router::new(RouterConfig {
            x_cost: 1,
            y_cost: 1,
            z_cost: 1,
            bend_cost: 1,
            ..RouterConfig::default()
        });
        let mut scratch = ScratchGrid::new(&grid);
        let req = RouteRequest::new((0, 0, 0), (3, 3, 0));

        let outcome = router.expand(&grid, &mut scratch, req);
        assert!(matches!(outcome, ExpandOutcome::Reachable { .. }));

        let path = router.backtrace(&scratch, req);
        assert_eq!(path.len(), 7);
        assert_eq!(router.commit(&grid, &path), CommitOutcome::Ok);
    }

    #[test]
    fn e2_two_rows_route_disjointly() {
        let grid = flat_grid(4, 4, 1);
        let router = Router::new(RouterConfig {
            x_cost: 1,
            y_cost: 1,
            z_cost: 1,
            bend_cost: 1,
            ..RouterConfig::default()
        });
        let mut scratch = ScratchGrid::new(&grid);

        let req1 = RouteRequest::new((0, 0, 0), (3, 0, 0));
        let out1 = router.expand(&grid, &mut scratch, req1);
        assert!(matches!(out1, ExpandOutcome::Reachable { .. }));
        let path1 = router.backtrace(&scratch, req1);
        assert_eq!(router.commit(&grid, &path1), CommitOutcome::Ok);

        let req2 = RouteRequest::new((0, 1, 0), (3, 1, 0));
        let out2 = router.expand(&grid, &mut scratch, req2);
        assert!(matches!(out2, ExpandOutcome::Reachable { .. }));
        let path2 = router.backtrace(&scratch, req2);
        assert_eq!(router.commit(&grid, &path2), CommitOutcome::Ok);

        let set1: std::collections::HashSet<_> = path1.interior().iter().collect();
        let set2: std::collections::HashSet<_> = path2.interior().iter().collect();
        assert!(set1.is_disjoint(&set2));
    }

    #[test]
    fn e5_fully_walled_off_is_unreachable_without_error() {
        let grid = flat_grid(4, 4, 1);
        for y in 0..4 {
            grid.set(2, y, 0, CellState::Wall).unwrap();
        }
        let router = Router::new(RouterConfig::default());
        let mut scratch = ScratchGrid::new(&grid);
        let req = RouteRequest::new((0, 0, 0), (3, 3, 0));
        let outcome = router.expand(&grid, &mut scratch, req);
        assert_eq!(outcome, ExpandOutcome::Unreachable);
    }

    #[test]
    fn e9_coincident_endpoints_are_a_zero_interior_path() {
        let grid = flat_grid(4, 4, 1);
        let router = Router::new(RouterConfig::default());
        let mut scratch = ScratchGrid::new(&grid);
        let req = RouteRequest::new((1, 1, 0), (1, 1, 0));
        let outcome = router.expand(&grid, &mut scratch, req);
        assert_eq!(outcome, ExpandOutcome::Reachable { cost: 0 });
        let path = router.backtrace(&scratch, req);
        assert_eq!(path.len(), 1);
        assert!(path.interior().is_empty());
        assert_eq!(router.commit(&grid, &path), CommitOutcome::Ok);
    }

    #[test]
    fn commit_detects_collision() {
        let grid = flat_grid(4, 4, 1);
        let router = Router::new(RouterConfig {
            x_cost: 1,
            y_cost: 1,
            z_cost: 1,
            bend_cost: 1,
            ..RouterConfig::default()
        });
        let mut scratch = ScratchGrid::new(&grid);
        let req = RouteRequest::new((0, 0, 0), (3, 0, 0));
        router.expand(&grid, &mut scratch, req);
        let path = router.backtrace(&scratch, req);

        // Simulate a concurrently committed path through one of the
        // interior cells.
        let occupied = path.interior()[0];
        grid.set_index(occupied, CellState::Full);

        assert_eq!(router.commit(&grid, &path), CommitOutcome::Collision);
    }

    #[test]
    fn contiguity_holds_along_every_committed_path() {
        let grid = flat_grid(4, 4, 1);
        let router = Router::new(RouterConfig {
            x_cost: 1,
            y_cost: 1,
            z_cost: 1,
            bend_cost: 1,
            ..RouterConfig::default()
        });
        let mut scratch = ScratchGrid::new(&grid);
        let req = RouteRequest::new((0, 0, 0), (3, 3, 0));
        router.expand(&grid, &mut scratch, req);
        let path = router.backtrace(&scratch, req);

        let dims = grid.dims();
        for pair in path.cells().windows(2) {
            let (ax, ay, az) = dims.unflatten(pair[0]);
            let (bx, by, bz) = dims.unflatten(pair[1]);
            let manhattan =
                (ax - bx).abs() + (ay - by).abs() + (az - bz).abs();
            assert_eq!(manhattan, 1);
        }
    }
}
