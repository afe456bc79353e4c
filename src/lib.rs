//! A parallel maze router based on the Lee algorithm: breadth-first
//! expansion from a source cell followed by gradient-descent
//! backtracking to recover the shortest-cost path, with a
//! transactional expand/backtrace/commit discipline that lets many
//! workers route disjoint paths through a shared grid concurrently.

mod aligned;
mod cell;
mod coordinator;
mod cost;
mod error;
mod grid;
pub mod maze;
mod path;
mod path_list;
mod router;
mod work_queue;

pub use cell::{Axis, CellState};
pub use coordinator::Coordinator;
pub use cost::RouterConfig;
pub use error::RouterError;
pub use grid::Grid;
pub use maze::{load_file, load_str, MazeData};
pub use path::{Path, RouteRequest};
pub use path_list::PathList;
pub use router::{CommitOutcome, ExpandOutcome, Router};
pub use work_queue::WorkQueue;
