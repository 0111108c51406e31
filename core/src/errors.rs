//! Error types for the arena and network layer.

use std::fmt;

/// Errors raised by [`crate::pool::Pool`] allocation and eviction.
#[derive(Debug)]
pub enum PoolError {
    /// The arena's fixed capacity was exceeded.
    OutOfMemory { requested: usize, available: usize },
    /// An eviction was attempted that did not target the current tail.
    NotTail,
    /// The optional memory-mapped backing file could not be opened or sized.
    Io(std::io::Error),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::OutOfMemory { requested, available } => write!(
                f,
                "pool exhausted: requested {requested} bytes, {available} available"
            ),
            PoolError::NotTail => write!(f, "evict() target is not the current tail allocation"),
            PoolError::Io(e) => write!(f, "pool backing store error: {e}"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoolError {
    fn from(e: std::io::Error) -> Self {
        PoolError::Io(e)
    }
}
