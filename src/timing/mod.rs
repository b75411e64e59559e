//! Zero-cost phase timing for the reduction loops.
//!
//! When the `timing` feature is enabled, this module accumulates wall time
//! per phase across all iterations of a call. When disabled, all types
//! become zero-sized and all methods compile away.

/// Phase of a convergence iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Sort,
    Mark,
    Scan,
    Partition,
    Decay,
    Flatten,
}

#[cfg(feature = "timing")]
mod real;
#[cfg(not(feature = "timing"))]
mod stub;

#[cfg(feature = "timing")]
pub use real::*;
#[cfg(not(feature = "timing"))]
pub use stub::*;
