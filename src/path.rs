/// An unordered pair of endpoint coordinates to be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequest {
    pub source: (i64, i64, i64),
    pub destination: (i64, i64, i64),
}

impl RouteRequest {
    pub fn new(source: (i64, i64, i64), destination: (i64, i64, i64)) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// An ordered sequence of cell indices from source to destination,
/// inclusive. The interior (indices `1..len-1`) is what commit claims
/// by writing `Full`; the two endpoints are never overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    cells: Vec<usize>,
}

impl Path {
    pub fn new(cells: Vec<usize>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The path's interior: every cell except the two endpoints. Empty
    /// for a path of length 0, 1, or 2 (a zero-interior path, e.g. a
    /// request whose endpoints coincide, or are adjacent).
    pub fn interior(&self) -> &[usize] {
        if self.cells.len() <= 2 {
            &[]
        } else {
            &self.cells[1..self.cells.len() - 1]
        }
    }

    pub fn source_cell(&self) -> Option<usize> {
        self.cells.first().copied()
    }

    pub fn destination_cell(&self) -> Option<usize> {
        self.cells.last().copied()
    }
}
