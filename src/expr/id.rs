//! Identifiers for variables and parameters.
//!
//! Identifiers come from a [`VarAllocator`] owned by the caller rather than
//! from global state, so reductions can be tested with deterministic ids and a
//! compiler can partition id ranges between independent allocators.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier of a variable or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(u64);

impl ExprId {
    /// Wrap a raw id value.
    pub fn from_raw(raw: u64) -> Self {
        ExprId(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Incrementing identifier allocator.
///
/// Safe to share between threads: every call to [`VarAllocator::fresh`]
/// returns an id never handed out before by the same allocator.
#[derive(Debug, Default)]
pub struct VarAllocator {
    next: AtomicU64,
}

impl VarAllocator {
    /// Create an allocator whose first id is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator whose first id is `start`.
    pub fn starting_at(start: u64) -> Self {
        VarAllocator {
            next: AtomicU64::new(start),
        }
    }

    /// Allocate a new identifier.
    pub fn fresh(&self) -> ExprId {
        ExprId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The id the next call to `fresh` would return.
    pub fn peek(&self) -> ExprId {
        ExprId(self.next.load(Ordering::Relaxed))
    }
}
