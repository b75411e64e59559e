//! Rule flattener: resolve every target through the relation until no
//! target is itself a key.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::device::Grid;
use crate::error::{DidNotConvergeSnafu, Result, Stage};
use crate::primitives::{any_changed, binary_search, commit_updates};
use crate::timing::{Phase, ReduceTimings, Timer};

/// Run hop resolution to a fixpoint over `keys` (sorted) and `values`.
///
/// Returns the number of passes. A key that already maps to itself is
/// terminal. A pass that would map any other key to itself has found a cycle
/// and fails right away; longer cycles fail at the iteration cap.
pub(crate) fn flatten_rules(
    keys: &[u64],
    values: &mut [u64],
    updated: &mut [u64],
    units: usize,
    max_iterations: usize,
    timings: &mut ReduceTimings,
) -> Result<usize> {
    debug_assert_eq!(keys.len(), values.len());
    debug_assert!(keys.windows(2).all(|w| w[0] <= w[1]), "keys must be sorted");
    let n = keys.len();
    let grid = Grid::new(n, units);
    let updated = &mut updated[..n];
    let mut passes = 0usize;
    let mut changed = n > 0;

    while changed {
        if passes >= max_iterations {
            tracing::warn!(passes, n, "flattening hit its iteration cap");
            return DidNotConvergeSnafu {
                stage: Stage::Flatten,
                iterations: passes,
            }
            .fail();
        }
        passes += 1;

        let t = Timer::start();
        resolve_one_hop(keys, values, updated, &grid);
        if closes_cycle(keys, values, updated) {
            tracing::warn!(pass = passes, n, "cyclic relation detected while flattening");
            return DidNotConvergeSnafu {
                stage: Stage::Flatten,
                iterations: passes,
            }
            .fail();
        }
        commit_updates(values, updated, &grid);
        changed = any_changed(updated);
        timings.add(Phase::Flatten, t.elapsed());

        tracing::debug!(pass = passes, n, changed, "flatten pass");
    }

    Ok(passes)
}

/// `updated[i]` = target of `values[i]` if it is a key, else `values[i]`.
fn resolve_one_hop(keys: &[u64], values: &[u64], updated: &mut [u64], grid: &Grid) {
    let n = keys.len();
    let chunk = grid.chunk_len();
    maybe_par_chunks_mut!(updated, chunk)
        .enumerate()
        .for_each(|(g, out)| {
            let base = g * chunk;
            for (j, u) in out.iter_mut().enumerate() {
                let v = values[base + j];
                let hit = binary_search(keys, 0, n, v);
                *u = if hit != n { values[hit] } else { v };
            }
        });
}

/// Whether any entry is about to resolve to its own key without already
/// being a self-loop.
fn closes_cycle(keys: &[u64], values: &[u64], updated: &[u64]) -> bool {
    maybe_par_iter!(keys)
        .zip(maybe_par_iter!(values))
        .zip(maybe_par_iter!(updated))
        .any(|((&k, &v), &u)| u == k && v != k)
}
