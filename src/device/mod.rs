//! Execution context and data-parallel dispatch.
//!
//! Every pass over the relation is a grid-strided dispatch: the live range is
//! split into at most `compute_units` contiguous groups and each group is
//! handled by one worker. The end of a dispatch is the barrier between passes.

/// Conditionally parallel iterator over mutable chunks of a slice.
macro_rules! maybe_par_chunks_mut {
    ($slice:expr, $size:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_chunks_mut($size)
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.chunks_mut($size)
        }
    }};
}

/// Conditionally parallel iterator over chunks of a slice.
macro_rules! maybe_par_chunks {
    ($slice:expr, $size:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_chunks($size)
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.chunks($size)
        }
    }};
}

/// Conditionally parallel iterator over a slice.
macro_rules! maybe_par_iter {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter()
        }
    }};
}

/// Conditionally parallel mutable iterator over a slice.
macro_rules! maybe_par_iter_mut {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter_mut()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter_mut()
        }
    }};
}

/// Conditionally parallel consuming iterator.
macro_rules! maybe_par_into_iter {
    ($v:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $v.into_par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $v.into_iter()
        }
    }};
}

pub(crate) mod scratch;

use std::ops::Range;

#[cfg(feature = "parallel")]
use snafu::ResultExt;

use crate::error::Result;

/// Supplies the workers that run each pass and the number of work-groups a
/// pass is split into.
///
/// With the `parallel` feature this wraps a rayon pool: either the global one
/// or a dedicated pool with a fixed thread count. Without it, passes run on
/// the calling thread over the same group decomposition.
#[derive(Debug)]
pub struct ExecutionContext {
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
    compute_units: usize,
}

impl ExecutionContext {
    /// Context backed by the global pool, one unit per worker thread.
    pub fn global() -> Self {
        #[cfg(feature = "parallel")]
        let compute_units = rayon::current_num_threads().max(1);
        #[cfg(not(feature = "parallel"))]
        let compute_units = 1;

        Self {
            #[cfg(feature = "parallel")]
            pool: None,
            compute_units,
        }
    }

    /// Context with a dedicated pool of `units` worker threads.
    #[cfg(feature = "parallel")]
    pub fn with_units(units: usize) -> Result<Self> {
        let units = units.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(units)
            .thread_name(|i| format!("qtreduce-{i}"))
            .build()
            .context(crate::error::ContextBuildSnafu)?;
        Ok(Self {
            pool: Some(pool),
            compute_units: units,
        })
    }

    /// Context that splits every pass into `units` groups, run sequentially.
    #[cfg(not(feature = "parallel"))]
    pub fn with_units(units: usize) -> Result<Self> {
        Ok(Self {
            compute_units: units.max(1),
        })
    }

    /// Number of work-groups dispatched per pass.
    #[inline]
    pub fn compute_units(&self) -> usize {
        self.compute_units
    }

    /// Run `op` on this context's workers.
    pub(crate) fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            return pool.install(op);
        }
        op()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::global()
    }
}

/// Decomposition of `[0, len)` into contiguous work-groups.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Grid {
    len: usize,
    chunk: usize,
}

impl Grid {
    pub(crate) fn new(len: usize, units: usize) -> Self {
        let groups = units.clamp(1, len.max(1));
        Self {
            len,
            chunk: len.div_ceil(groups).max(1),
        }
    }

    /// Elements handled by each group (the last may get fewer).
    #[inline]
    pub(crate) fn chunk_len(&self) -> usize {
        self.chunk
    }

    /// Number of non-empty groups.
    #[inline]
    pub(crate) fn groups(&self) -> usize {
        self.len.div_ceil(self.chunk)
    }

    #[inline]
    pub(crate) fn group_range(&self, group: usize) -> Range<usize> {
        let start = (group * self.chunk).min(self.len);
        start..(start + self.chunk).min(self.len)
    }
}
