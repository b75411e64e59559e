//! Parallel fixpoint reduction of quadtree cell equivalences.
//!
//! Input is a relation of candidate equivalences between cell addresses,
//! stored as two parallel arrays `from[i] -> to[i]`. Reduction runs two
//! convergence loops:
//!
//! 1. **Compaction** sorts by key, removes exact duplicate pairs and performs
//!    one forward-decay step (a pair inherits the target of the preceding
//!    pair with the same key) until nothing changes. Keys end up unique.
//! 2. **Flattening** resolves every target through the relation by binary
//!    search until no target is itself a key.
//!
//! Every pass is data-parallel over a fixed number of work-groups, with the
//! end of each dispatch acting as the barrier to the next.
//!
//! # Example
//!
//! ```
//! use quadtree_reduce::reduce_equivalences;
//!
//! // 2 -> 1 -> 0 and 3 -> 1 -> 0
//! let mut from = vec![2, 3, 1];
//! let mut to = vec![1, 1, 0];
//!
//! let live = reduce_equivalences(&mut from, &mut to).expect("acyclic relation converges");
//! assert_eq!(live, 3);
//! assert_eq!(&from[..live], &[1, 2, 3]);
//! assert_eq!(&to[..live], &[0, 0, 0]);
//! ```

#[macro_use]
mod device;
mod compact;
mod error;
mod flatten;
mod primitives;
mod timing;
mod types;
pub mod validation;

use snafu::ensure;

use device::scratch::ScratchPool;
use error::LengthMismatchSnafu;

pub use compact::CompactOutcome;
pub use device::ExecutionContext;
pub use error::{Error, Result, Stage};
pub use timing::ReduceTimings;
pub use types::{CellAddress, MAX_DEPTH};

const ENV_MAX_ITERATIONS: &str = "QTREDUCE_MAX_ITERATIONS";
const ENV_COMPUTE_UNITS: &str = "QTREDUCE_COMPUTE_UNITS";

/// Configuration for a reduction.
#[derive(Debug, Clone, Default)]
pub struct ReduceConfig {
    /// Cap on iterations of each convergence loop.
    ///
    /// Cyclic relations (`a -> b`, `b -> a`) never reach a fixpoint; hitting
    /// the cap turns that into [`Error::DidNotConverge`]. `None` derives a cap
    /// of `2n + 2` from the pair count, which no acyclic input reaches.
    pub max_iterations: Option<usize>,
    /// Work-groups per pass. `None` uses the context's unit count.
    pub compute_units: Option<usize>,
}

impl ReduceConfig {
    /// Defaults overridden by `QTREDUCE_MAX_ITERATIONS` and
    /// `QTREDUCE_COMPUTE_UNITS` when set.
    pub fn from_env() -> Self {
        Self {
            max_iterations: env_usize(ENV_MAX_ITERATIONS),
            compute_units: env_usize(ENV_COMPUTE_UNITS),
        }
    }

    /// Iteration cap for a relation of `n` pairs.
    pub fn iteration_cap(&self, n: usize) -> usize {
        self.max_iterations
            .unwrap_or_else(|| n.saturating_mul(2).saturating_add(2))
    }
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable override");
            None
        }
    }
}

/// Counters from a full reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceStats {
    /// Iterations of the compaction loop.
    pub compact_iterations: usize,
    /// Passes of the flattening loop.
    pub flatten_passes: usize,
    /// Pairs dropped as duplicates (`n - live`).
    pub removed: usize,
    /// Per-phase wall time (zero-sized without the `timing` feature).
    pub timings: ReduceTimings,
}

/// Output of [`Reducer::reduce`].
#[derive(Debug, Clone, Copy)]
pub struct ReduceOutput {
    /// Live pair count. Entries at or past it are unspecified.
    pub live: usize,
    pub stats: ReduceStats,
}

/// Drives the convergence loops on an execution context.
///
/// Scratch buffers are acquired per call, sized once to the input, and
/// released when the call returns. On error the contents of the caller's
/// arrays are unspecified.
#[derive(Debug)]
pub struct Reducer<'ctx> {
    ctx: &'ctx ExecutionContext,
    config: ReduceConfig,
}

impl<'ctx> Reducer<'ctx> {
    pub fn new(ctx: &'ctx ExecutionContext, config: ReduceConfig) -> Self {
        Self { ctx, config }
    }

    pub fn config(&self) -> &ReduceConfig {
        &self.config
    }

    fn units(&self) -> usize {
        self.config
            .compute_units
            .unwrap_or_else(|| self.ctx.compute_units())
            .max(1)
    }

    /// Run the compaction loop alone.
    ///
    /// On success `from[..live]` is sorted with unique keys and no duplicate
    /// pairs. When a key had several targets, the first after a stable sort
    /// by key wins.
    pub fn compact(&self, from: &mut [u64], to: &mut [u64]) -> Result<CompactOutcome> {
        check_lengths(from, to)?;
        let n = from.len();
        let units = self.units();
        let cap = self.config.iteration_cap(n);
        let mut scratch = ScratchPool::for_compaction(n, units)?;
        let mut timings = ReduceTimings::default();

        self.ctx.install(|| {
            compact::compact_relation(from, to, &mut scratch, units, cap, &mut timings)
        })
    }

    /// Run the flattening loop alone over sorted `keys`.
    ///
    /// Every value is rewritten to its terminal representative. Returns the
    /// number of passes.
    pub fn flatten(&self, keys: &[u64], values: &mut [u64]) -> Result<usize> {
        check_lengths(keys, values)?;
        let n = keys.len();
        let units = self.units();
        let cap = self.config.iteration_cap(n);
        let mut scratch = ScratchPool::for_flattening(n)?;
        let mut timings = ReduceTimings::default();

        self.ctx.install(|| {
            flatten::flatten_rules(keys, values, &mut scratch.updated, units, cap, &mut timings)
        })
    }

    /// Compact, then flatten the surviving pairs.
    pub fn reduce(&self, from: &mut [u64], to: &mut [u64]) -> Result<ReduceOutput> {
        check_lengths(from, to)?;
        let n = from.len();
        let units = self.units();
        let cap = self.config.iteration_cap(n);
        let mut scratch = ScratchPool::for_compaction(n, units)?;
        let mut timings = ReduceTimings::default();

        let (compacted, flatten_passes) = self.ctx.install(|| -> Result<_> {
            let compacted =
                compact::compact_relation(from, to, &mut scratch, units, cap, &mut timings)?;
            let live = compacted.live;
            let passes = flatten::flatten_rules(
                &from[..live],
                &mut to[..live],
                &mut scratch.updated,
                units,
                cap,
                &mut timings,
            )?;
            Ok((compacted, passes))
        })?;

        let stats = ReduceStats {
            compact_iterations: compacted.iterations,
            flatten_passes,
            removed: n - compacted.live,
            timings,
        };
        timings.report(n);
        tracing::info!(
            n,
            live = compacted.live,
            compact_iterations = stats.compact_iterations,
            flatten_passes,
            "relation reduced"
        );

        Ok(ReduceOutput {
            live: compacted.live,
            stats,
        })
    }
}

fn check_lengths(from: &[u64], to: &[u64]) -> Result<()> {
    ensure!(
        from.len() == to.len(),
        LengthMismatchSnafu {
            from: from.len(),
            to: to.len()
        }
    );
    Ok(())
}

/// Reduce a relation with default settings on the global pool.
///
/// Returns the live pair count `n'`; `from[..n']` is sorted with unique keys
/// and every `to[i]` is a terminal representative.
pub fn reduce_equivalences(from: &mut [u64], to: &mut [u64]) -> Result<usize> {
    let ctx = ExecutionContext::global();
    Reducer::new(&ctx, ReduceConfig::default())
        .reduce(from, to)
        .map(|out| out.live)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_iteration_cap() {
        let config = ReduceConfig::default();
        assert_eq!(config.iteration_cap(0), 2);
        assert_eq!(config.iteration_cap(10), 22);
        assert_eq!(config.iteration_cap(usize::MAX), usize::MAX);

        let config = ReduceConfig {
            max_iterations: Some(5),
            ..Default::default()
        };
        assert_eq!(config.iteration_cap(1000), 5);
    }

    #[test]
    fn test_env_usize_ignores_garbage() {
        std::env::set_var("QTREDUCE_TEST_GARBAGE", "many");
        assert_eq!(env_usize("QTREDUCE_TEST_GARBAGE"), None);
        std::env::set_var("QTREDUCE_TEST_NUMBER", " 12 ");
        assert_eq!(env_usize("QTREDUCE_TEST_NUMBER"), Some(12));
        assert_eq!(env_usize("QTREDUCE_TEST_UNSET"), None);
    }

    #[test]
    fn test_length_mismatch() {
        let err = reduce_equivalences(&mut [1, 2], &mut [0]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { from: 2, to: 1 }));
    }

    #[test]
    fn test_reduce_stats() {
        let ctx = ExecutionContext::with_units(2).unwrap();
        let reducer = Reducer::new(&ctx, ReduceConfig::default());
        let mut from = vec![5, 5, 7, 9];
        let mut to = vec![2, 2, 9, 1];
        let out = reducer.reduce(&mut from, &mut to).unwrap();
        assert_eq!(out.live, 3);
        assert_eq!(out.stats.removed, 1);
        assert_eq!(out.stats.compact_iterations, 1);
        assert_eq!(out.stats.flatten_passes, 2);
        assert_eq!(&from[..3], &[5, 7, 9]);
        assert_eq!(&to[..3], &[2, 1, 1]);
    }
}
