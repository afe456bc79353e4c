use crate::cell::Axis;
use serde::{Deserialize, Serialize};

/// The default number of times a worker retries a contended cell lock
/// before giving up on a commit.
pub const DEFAULT_MAX_TRIES: u32 = 1 << 3;
/// The default upper bound, in nanoseconds, on the randomized backoff
/// a worker sleeps between retries.
pub const DEFAULT_MAX_TIMEOUT_NANOS: u32 = 1 << 6;

/// Router construction parameters: per-axis step costs, the cost of a
/// bend between two consecutive moves, the worker pool size, and the
/// commit retry budget.
///
/// Costs and the commit retry budget are configured once and are
/// immutable for the lifetime of the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub x_cost: u32,
    pub y_cost: u32,
    pub z_cost: u32,
    pub bend_cost: u32,
    /// Number of worker threads the coordinator spawns. Defaults to 8;
    /// callers that want "one thread per hardware core" should use
    /// [`RouterConfig::with_host_threads`].
    pub threads: usize,
    pub max_tries: u32,
    pub max_timeout_nanos: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            x_cost: 1,
            y_cost: 1,
            z_cost: 2,
            bend_cost: 1,
            threads: 8,
            max_tries: DEFAULT_MAX_TRIES,
            max_timeout_nanos: DEFAULT_MAX_TIMEOUT_NANOS,
        }
    }
}

impl RouterConfig {
    /// Same defaults, but sized to the number of hardware threads
    /// available on the host, rather than a fixed constant.
    pub fn with_host_threads() -> Self {
        Self {
            threads: num_cpus::get(),
            ..Self::default()
        }
    }

    pub fn axis_cost(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x_cost,
            Axis::Y => self.y_cost,
            Axis::Z => self.z_cost,
        }
    }
}
