//! Error types for equivalence reduction.

use std::collections::TryReserveError;
use std::fmt;

use snafu::Snafu;

/// Result type for reduction operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Convergence loop that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Sort, dedup and forward-decay loop.
    Compact,
    /// Rule flattening loop.
    Flatten,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compact => f.write_str("compact"),
            Stage::Flatten => f.write_str("flatten"),
        }
    }
}

/// Errors that can occur while reducing a relation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// `from` and `to` must be indexed identically.
    #[snafu(display("length mismatch: from has {from} entries, to has {to}"))]
    LengthMismatch { from: usize, to: usize },

    /// Scratch buffers for the call could not be reserved.
    #[snafu(display("failed to reserve scratch buffers for {requested} pairs: {source}"))]
    ScratchAllocation {
        requested: usize,
        source: TryReserveError,
    },

    /// The worker pool backing an execution context failed to start.
    #[snafu(display("failed to build execution context: {source}"))]
    #[cfg(feature = "parallel")]
    ContextBuild { source: rayon::ThreadPoolBuildError },

    /// A convergence loop hit its iteration cap.
    ///
    /// This is how cyclic relations (`a -> b`, `b -> a`) surface.
    #[snafu(display("{stage} loop did not converge after {iterations} iterations"))]
    DidNotConverge { stage: Stage, iterations: usize },
}
