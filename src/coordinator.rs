use std::time::Instant;

use crate::cost::RouterConfig;
use crate::grid::Grid;
use crate::path_list::PathList;
use crate::router::{AttemptOutcome, Router, ScratchGrid};
use crate::work_queue::WorkQueue;

/// The shared state every worker thread reads and writes: the live
/// grid, the pending work, the router's cost model, and the list of
/// committed paths. Each field is independently synchronized, so a
/// plain shared reference suffices — no outer lock is needed.
struct Shared {
    grid: Grid,
    queue: WorkQueue,
    router: Router,
    paths: PathList,
}

/// Spawns `config.threads` workers that drain a `WorkQueue` against a
/// shared `Grid`, each committing successful paths into a shared
/// `PathList`.
pub struct Coordinator {
    shared: Shared,
}

impl Coordinator {
    pub fn new(grid: Grid, queue: WorkQueue, config: RouterConfig) -> Self {
        Self {
            shared: Shared {
                grid,
                queue,
                router: Router::new(config),
                paths: PathList::new(),
            },
        }
    }

    /// Runs every pending request to completion and returns the
    /// resulting grid and committed paths.
    ///
    /// With `threads == 1` this still spawns exactly one worker thread
    /// rather than special-casing a sequential code path: the
    /// transactional commit protocol degenerates safely to uncontended
    /// lock/validate/apply when there is no concurrent writer.
    pub fn run(self) -> (Grid, Vec<crate::path::Path>) {
        let threads = self.shared.router.config().threads.max(1);
        let requests = self.shared.queue.len();
        let started = Instant::now();
        tracing::info!(threads, requests, "starting routing run");

        let shared = &self.shared;
        std::thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(move || Self::worker_loop(shared));
            }
        });

        let committed = shared.paths.len();
        tracing::info!(
            committed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "routing run complete"
        );

        (self.shared.grid, self.shared.paths.into_vec())
    }

    fn worker_loop(shared: &Shared) {
        let mut scratch = ScratchGrid::new(&shared.grid);
        while let Some(request) = shared.queue.pop() {
            tracing::debug!(?request, "dequeued request");
            match shared.router.attempt(&shared.grid, &mut scratch, request) {
                AttemptOutcome::Committed(path) => {
                    tracing::trace!(cells = path.len(), "committed path");
                    shared.paths.append(path);
                }
                AttemptOutcome::Unreachable => {
                    tracing::debug!(?request, "destination unreachable");
                }
                AttemptOutcome::Collision => {
                    tracing::debug!(?request, "commit collision, discarding path");
                }
                AttemptOutcome::Contention => {
                    tracing::warn!(?request, "commit contention exhausted retries");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::RouteRequest;
    use proptest::prelude::*;

    #[test]
    fn single_threaded_run_commits_a_reachable_request() {
        let grid = Grid::new(4, 4, 1).unwrap();
        let queue = WorkQueue::from_requests([RouteRequest::new((0, 0, 0), (3, 0, 0))]);
        let config = RouterConfig {
            x_cost: 1,
            y_cost: 1,
            z_cost: 1,
            bend_cost: 1,
            threads: 1,
            ..RouterConfig::default()
        };
        let coordinator = Coordinator::new(grid, queue, config);
        let (_grid, paths) = coordinator.run();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].source_cell(), Some(0));
    }

    #[test]
    fn many_disjoint_requests_all_commit_under_several_workers() {
        let grid = Grid::new(8, 8, 1).unwrap();
        let requests: Vec<_> = (0..8)
            .map(|y| RouteRequest::new((0, y, 0), (7, y, 0)))
            .collect();
        let queue = WorkQueue::from_requests(requests);
        let config = RouterConfig {
            x_cost: 1,
            y_cost: 1,
            z_cost: 1,
            bend_cost: 1,
            threads: 4,
            ..RouterConfig::default()
        };
        let coordinator = Coordinator::new(grid, queue, config);
        let (_grid, paths) = coordinator.run();
        assert_eq!(paths.len(), 8);
    }

    #[test]
    fn unreachable_request_commits_nothing() {
        let grid = Grid::new(4, 4, 1).unwrap();
        for y in 0..4 {
            grid.set(2, y, 0, crate::cell::CellState::Wall).unwrap();
        }
        let queue = WorkQueue::from_requests([RouteRequest::new((0, 0, 0), (3, 0, 0))]);
        let config = RouterConfig {
            threads: 2,
            ..RouterConfig::default()
        };
        let coordinator = Coordinator::new(grid, queue, config);
        let (_grid, paths) = coordinator.run();
        assert!(paths.is_empty());
    }

    #[test]
    fn single_threaded_run_is_deterministic_across_repeats() {
        fn run_once() -> Vec<Vec<usize>> {
            let grid = Grid::new(6, 5, 1).unwrap();
            let requests: Vec<_> = (0..5)
                .map(|y| RouteRequest::new((0, y, 0), (5, y, 0)))
                .collect();
            let queue = WorkQueue::from_requests(requests);
            let config = RouterConfig {
                x_cost: 1,
                y_cost: 1,
                z_cost: 1,
                bend_cost: 1,
                threads: 1,
                ..RouterConfig::default()
            };
            let coordinator = Coordinator::new(grid, queue, config);
            let (_grid, mut paths) = coordinator.run();
            paths.sort_by_key(|p| p.cells().to_vec());
            paths.into_iter().map(|p| p.cells().to_vec()).collect()
        }

        assert_eq!(run_once(), run_once());
    }

    proptest! {
        // On an otherwise empty grid, one request per row never lets
        // two committed paths share an interior cell, and every
        // claimed interior cell ends up marked FULL.
        #[test]
        fn disjointness_and_legality_hold(
            width in 4i64..12,
            height in 2i64..8,
            threads in 1usize..5,
        ) {
            let grid = Grid::new(width, height, 1).unwrap();
            let requests: Vec<_> = (0..height)
                .map(|y| RouteRequest::new((0, y, 0), (width - 1, y, 0)))
                .collect();
            let queue = WorkQueue::from_requests(requests);
            let config = RouterConfig {
                x_cost: 1,
                y_cost: 1,
                z_cost: 1,
                bend_cost: 1,
                threads,
                ..RouterConfig::default()
            };
            let coordinator = Coordinator::new(grid, queue, config);
            let (grid, paths) = coordinator.run();

            prop_assert_eq!(paths.len(), height as usize);

            let mut claimed = std::collections::HashSet::new();
            for path in &paths {
                for &cell in path.interior() {
                    prop_assert!(claimed.insert(cell), "cell {} claimed by two paths", cell);
                    prop_assert_eq!(grid.get_index(cell), crate::cell::CellState::Full);
                }
            }
        }

        // Every committed path starts and ends at its request's
        // endpoints, and consecutive cells are axis-adjacent.
        #[test]
        fn endpoints_and_contiguity_hold(width in 4i64..12, height in 2i64..8) {
            let grid = Grid::new(width, height, 1).unwrap();
            let requests: Vec<_> = (0..height)
                .map(|y| RouteRequest::new((0, y, 0), (width - 1, y, 0)))
                .collect();
            let queue = WorkQueue::from_requests(requests.clone());
            let config = RouterConfig {
                x_cost: 1,
                y_cost: 1,
                z_cost: 1,
                bend_cost: 1,
                threads: 3,
                ..RouterConfig::default()
            };
            let coordinator = Coordinator::new(grid, queue, config);
            let (grid, paths) = coordinator.run();

            let dims = grid.dims();
            for path in &paths {
                let cells = path.cells();
                let (sx, sy, sz) = dims.unflatten(cells[0]);
                let (dx, dy, dz) = dims.unflatten(*cells.last().unwrap());
                prop_assert!(requests
                    .iter()
                    .any(|r| r.source == (sx, sy, sz) && r.destination == (dx, dy, dz)));

                for pair in cells.windows(2) {
                    let (ax, ay, az) = dims.unflatten(pair[0]);
                    let (bx, by, bz) = dims.unflatten(pair[1]);
                    let manhattan = (ax - bx).abs() + (ay - by).abs() + (az - bz).abs();
                    prop_assert_eq!(manhattan, 1);
                }
            }
        }
    }
}
