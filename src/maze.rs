use std::fs;
use std::path::Path as FsPath;

use crate::cell::CellState;
use crate::error::RouterError;
use crate::grid::Grid;
use crate::path::RouteRequest;
use crate::work_queue::WorkQueue;

/// The parsed result of a maze description: a fully walled-and-sized
/// grid, ready to hand to a `Coordinator` alongside the work it has
/// already been loaded with.
pub struct MazeData {
    pub grid: Grid,
    pub queue: WorkQueue,
}

fn parse_coords<const N: usize>(
    tokens: &[&str],
    line_no: usize,
) -> Result<[i64; N], RouterError> {
    if tokens.len() != N {
        return Err(RouterError::Parse {
            line: line_no,
            reason: format!("expected {N} coordinate values, found {}", tokens.len()),
        });
    }
    let mut out = [0i64; N];
    for (slot, tok) in out.iter_mut().zip(tokens) {
        *slot = tok.parse::<i64>().map_err(|_| RouterError::Parse {
            line: line_no,
            reason: format!("'{tok}' is not an integer"),
        })?;
    }
    Ok(out)
}

/// Parses the line-oriented maze format from a string.
///
/// Grammar, one directive per non-blank, non-comment line:
/// - `d W H D` — grid dimensions; must appear before any coordinate
///   line.
/// - `w x y z` — marks a cell WALL.
/// - `p x1 y1 z1 x2 y2 z2` — a routing request; both endpoints are
///   marked WALL (untouchable by other routes) and enqueued.
/// - `#...` or blank — ignored.
pub fn load_str(input: &str) -> Result<MazeData, RouterError> {
    let mut grid: Option<Grid> = None;
    let mut requests = Vec::new();

    for (offset, raw_line) in input.lines().enumerate() {
        let line_no = offset + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();
        let rest: Vec<&str> = tokens.collect();

        match keyword {
            "d" => {
                let [w, h, d] = parse_coords::<3>(&rest, line_no)?;
                grid = Some(Grid::new(w, h, d)?);
            }
            "w" => {
                let grid_ref = grid.as_ref().ok_or_else(|| RouterError::Parse {
                    line: line_no,
                    reason: "'w' line before 'd' dimensions line".to_string(),
                })?;
                let [x, y, z] = parse_coords::<3>(&rest, line_no)?;
                if !grid_ref.is_valid(x, y, z) {
                    return Err(RouterError::Parse {
                        line: line_no,
                        reason: format!("wall coordinate ({x}, {y}, {z}) is out of bounds"),
                    });
                }
                grid_ref.set(x, y, z, CellState::Wall)?;
            }
            "p" => {
                let grid_ref = grid.as_ref().ok_or_else(|| RouterError::Parse {
                    line: line_no,
                    reason: "'p' line before 'd' dimensions line".to_string(),
                })?;
                let [x1, y1, z1, x2, y2, z2] = parse_coords::<6>(&rest, line_no)?;
                for (x, y, z) in [(x1, y1, z1), (x2, y2, z2)] {
                    if !grid_ref.is_valid(x, y, z) {
                        return Err(RouterError::Parse {
                            line: line_no,
                            reason: format!("request endpoint ({x}, {y}, {z}) is out of bounds"),
                        });
                    }
                }
                grid_ref.set(x1, y1, z1, CellState::Wall)?;
                grid_ref.set(x2, y2, z2, CellState::Wall)?;
                requests.push(RouteRequest::new((x1, y1, z1), (x2, y2, z2)));
            }
            other => {
                return Err(RouterError::Parse {
                    line: line_no,
                    reason: format!("unrecognized directive '{other}'"),
                });
            }
        }
    }

    let grid = grid.ok_or_else(|| RouterError::Parse {
        line: 0,
        reason: "missing 'd W H D' dimensions line".to_string(),
    })?;

    tracing::info!(
        width = grid.width(),
        height = grid.height(),
        depth = grid.depth(),
        requests = requests.len(),
        "parsed maze"
    );

    Ok(MazeData {
        grid,
        queue: WorkQueue::from_requests(requests),
    })
}

/// Reads and parses a maze file from disk.
pub fn load_file(path: impl AsRef<FsPath>) -> Result<MazeData, RouterError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| RouterError::Parse {
        line: 0,
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    load_str(&contents)
}
