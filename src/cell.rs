/// The state of a single grid cell.
///
/// `Empty` and `Full` are reserved sentinels distinguishable from any
/// legal distance; a plain Rust enum expresses that directly instead
/// of reserving integer sentinel values out of the distance range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Empty,
    Full,
    Wall,
    /// A BFS distance written during expansion.
    Distance(u32),
}

impl CellState {
    pub fn is_passable(self) -> bool {
        !matches!(self, CellState::Full | CellState::Wall)
    }

    pub fn distance(self) -> Option<u32> {
        match self {
            CellState::Distance(d) => Some(d),
            _ => None,
        }
    }
}

/// One of the three grid axes, used to charge per-axis step costs and
/// to detect a bend between two consecutive moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A single unit step along an axis, in the negative or positive
/// direction. Backtrace tie-breaking prefers axes in order X, Y, Z,
/// and within an axis prefers the negative direction before the
/// positive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub delta: i64,
}

impl Step {
    pub const fn new(axis: Axis, delta: i64) -> Self {
        Self { axis, delta }
    }
}

/// The six axis-aligned neighbour steps, in the canonical tie-break
/// order used by backtrace: x-, x+, y-, y+, z-, z+.
pub const NEIGHBOUR_STEPS: [Step; 6] = [
    Step::new(Axis::X, -1),
    Step::new(Axis::X, 1),
    Step::new(Axis::Y, -1),
    Step::new(Axis::Y, 1),
    Step::new(Axis::Z, -1),
    Step::new(Axis::Z, 1),
];
