use thiserror::Error;

/// Errors that halt the unit of work they occur in.
///
/// Per the router's error design, outcomes that are expected under
/// concurrency (an unreachable destination, a commit collision, a
/// commit running out of try-lock retries) are *not* represented
/// here: those are plain data, returned as [`crate::ExpandOutcome`]
/// and [`crate::CommitOutcome`] values. Only resource and invariant
/// violations are errors.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("coordinate ({x}, {y}, {z}) is out of bounds")]
    OutOfBounds { x: i64, y: i64, z: i64 },

    #[error("failed to allocate cache-aligned grid storage")]
    Alloc,

    #[error("failed to initialize a per-cell lock")]
    LockInit,

    #[error("invalid maze input at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}
