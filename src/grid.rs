use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::aligned::CacheAligned;
use crate::cell::CellState;
use crate::error::RouterError;

const RAW_EMPTY: u32 = 0;
const RAW_FULL: u32 = 1;
const RAW_WALL: u32 = 2;
const RAW_DISTANCE_BASE: u32 = 3;

fn encode(state: CellState) -> u32 {
    match state {
        CellState::Empty => RAW_EMPTY,
        CellState::Full => RAW_FULL,
        CellState::Wall => RAW_WALL,
        CellState::Distance(d) => RAW_DISTANCE_BASE.saturating_add(d),
    }
}

fn decode(raw: u32) -> CellState {
    match raw {
        RAW_EMPTY => CellState::Empty,
        RAW_FULL => CellState::Full,
        RAW_WALL => CellState::Wall,
        d => CellState::Distance(d - RAW_DISTANCE_BASE),
    }
}

/// The dimensions shared by the live grid and every worker's scratch
/// copy, and the flattening formula: `(z * height + y) * width + x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub width: i64,
    pub height: i64,
    pub depth: i64,
}

impl GridDims {
    pub fn new(width: i64, height: i64, depth: i64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn len(&self) -> usize {
        (self.width * self.height * self.depth) as usize
    }

    pub fn is_valid(&self, x: i64, y: i64, z: i64) -> bool {
        x >= 0
            && x < self.width
            && y >= 0
            && y < self.height
            && z >= 0
            && z < self.depth
    }

    /// Flattens `(x, y, z)` to an index. Caller must have already
    /// checked `is_valid`.
    pub fn flatten(&self, x: i64, y: i64, z: i64) -> usize {
        ((z * self.height + y) * self.width + x) as usize
    }

    /// The exact inverse of `flatten`.
    pub fn unflatten(&self, index: usize) -> (i64, i64, i64) {
        let area = (self.width * self.height) as usize;
        let index = index as i64;
        let area = area as i64;
        let z = index / area;
        let rem = index % area;
        let y = rem / self.width;
        let x = rem % self.width;
        (x, y, z)
    }
}

/// A per-cell lock handle. Rust's RAII makes dropping it the natural
/// expression of "lock, use, unlock" instead of a separate explicit
/// unlock call.
pub struct CellGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// The shared 3-D grid: a cache-line-aligned array of cell states and
/// a parallel cache-line-aligned array of one lock per cell.
///
/// Both arrays live for the entire router run; individual cell locks
/// are only acquired transiently, at commit time.
pub struct Grid {
    dims: GridDims,
    points: CacheAligned<AtomicU32>,
    locks: CacheAligned<Mutex<()>>,
}

impl Grid {
    pub fn new(width: i64, height: i64, depth: i64) -> Result<Self, RouterError> {
        if width <= 0 || height <= 0 || depth <= 0 {
            return Err(RouterError::OutOfBounds {
                x: width,
                y: height,
                z: depth,
            });
        }
        let dims = GridDims::new(width, height, depth);
        let n = dims.len();
        let points = CacheAligned::new_with(n, |_| AtomicU32::new(RAW_EMPTY))
            .ok_or(RouterError::Alloc)?;
        let locks =
            CacheAligned::new_with(n, |_| Mutex::new(())).ok_or(RouterError::LockInit)?;
        Ok(Self {
            dims,
            points,
            locks,
        })
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn width(&self) -> i64 {
        self.dims.width
    }

    pub fn height(&self) -> i64 {
        self.dims.height
    }

    pub fn depth(&self) -> i64 {
        self.dims.depth
    }

    pub fn is_valid(&self, x: i64, y: i64, z: i64) -> bool {
        self.dims.is_valid(x, y, z)
    }

    fn checked_index(&self, x: i64, y: i64, z: i64) -> Result<usize, RouterError> {
        if !self.dims.is_valid(x, y, z) {
            return Err(RouterError::OutOfBounds { x, y, z });
        }
        Ok(self.dims.flatten(x, y, z))
    }

    /// The exact inverse of the flattening formula.
    pub fn indices_of(&self, index: usize) -> (i64, i64, i64) {
        self.dims.unflatten(index)
    }

    pub fn get(&self, x: i64, y: i64, z: i64) -> Result<CellState, RouterError> {
        let idx = self.checked_index(x, y, z)?;
        Ok(self.get_index(idx))
    }

    pub fn set(&self, x: i64, y: i64, z: i64, state: CellState) -> Result<(), RouterError> {
        let idx = self.checked_index(x, y, z)?;
        self.set_index(idx, state);
        Ok(())
    }

    /// Reads a cell by its already-validated flat index, without a
    /// bounds check. Used internally by the router, which only ever
    /// operates on indices it derived from a prior valid coordinate.
    pub fn get_index(&self, index: usize) -> CellState {
        decode(self.points[index].load(Ordering::Relaxed))
    }

    pub fn set_index(&self, index: usize, state: CellState) {
        self.points[index].store(encode(state), Ordering::Relaxed);
    }

    /// Blocks until the lock for `index` is acquired.
    pub fn lock_cell(&self, index: usize) -> CellGuard<'_> {
        CellGuard {
            _guard: self.locks[index].lock(),
        }
    }

    /// Attempts to acquire the lock for `index` without blocking.
    /// Returns `None` if it is currently held by another thread.
    pub fn try_lock_cell(&self, index: usize) -> Option<CellGuard<'_>> {
        self.locks[index]
            .try_lock()
            .map(|guard| CellGuard { _guard: guard })
    }

    /// A point-in-time, per-cell snapshot of every cell's state, for
    /// seeding a worker's private scratch grid. Each cell is read with
    /// a single relaxed atomic load and no lock is taken: the snapshot
    /// may already be stale by the time expansion uses it, which is
    /// fine, since commit revalidates every interior cell under lock
    /// before applying a path.
    pub fn copy_state_into(&self, out: &mut Vec<CellState>) {
        out.clear();
        out.reserve(self.points.len());
        for i in 0..self.points.len() {
            out.push(self.get_index(i));
        }
    }
}
