//! Relation compactor.
//!
//! Each iteration sorts the pairs by key, drops exact adjacent duplicates by
//! prefix-sum partitioning, and runs one forward-decay step: a pair whose key
//! matches its predecessor's inherits the predecessor's target. The loop ends
//! when decay changes nothing, at which point every key is unique.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::device::scratch::ScratchPool;
use crate::device::Grid;
use crate::error::{DidNotConvergeSnafu, Result, Stage};
use crate::primitives::{any_changed, commit_updates, inclusive_scan, sort_by_key};
use crate::timing::{Phase, ReduceTimings, Timer};

/// Result of running the compactor to convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactOutcome {
    /// Live pair count; entries at or past it are unspecified.
    pub live: usize,
    /// Sort/dedup/decay iterations run.
    pub iterations: usize,
}

pub(crate) fn compact_relation(
    from: &mut [u64],
    to: &mut [u64],
    scratch: &mut ScratchPool,
    units: usize,
    max_iterations: usize,
    timings: &mut ReduceTimings,
) -> Result<CompactOutcome> {
    debug_assert_eq!(from.len(), to.len());
    let mut n = from.len();
    let mut iterations = 0usize;
    let mut changed = n > 0;

    while changed {
        if iterations >= max_iterations {
            tracing::warn!(iterations, n, "compaction hit its iteration cap");
            return DidNotConvergeSnafu {
                stage: Stage::Compact,
                iterations,
            }
            .fail();
        }
        iterations += 1;

        let grid = Grid::new(n, units);
        let keys = &mut from[..n];
        let values = &mut to[..n];
        let flags = &mut scratch.updated[..n];

        let t = Timer::start();
        sort_by_key(keys, values, &mut scratch.pairs[..n], &grid);
        timings.add(Phase::Sort, t.elapsed());

        let t = Timer::start();
        mark_adjacent_duplicates(keys, values, flags, &grid);
        timings.add(Phase::Mark, t.elapsed());

        let t = Timer::start();
        inclusive_scan(flags, &mut scratch.block_sums, &grid);
        timings.add(Phase::Scan, t.elapsed());

        let t = Timer::start();
        let removed = partition_duplicates(
            keys,
            values,
            flags,
            &mut scratch.temp_keys,
            &mut scratch.temp_values,
            &grid,
        );
        timings.add(Phase::Partition, t.elapsed());
        n -= removed;

        let t = Timer::start();
        let grid = Grid::new(n, units);
        changed = forward_decay(&from[..n], &mut to[..n], &mut scratch.updated[..n], &grid);
        timings.add(Phase::Decay, t.elapsed());

        tracing::debug!(iteration = iterations, n, removed, changed, "compaction pass");
    }

    Ok(CompactOutcome {
        live: n,
        iterations,
    })
}

/// `equal[i] = 1` iff pair `i` is identical to pair `i - 1`.
pub(crate) fn mark_adjacent_duplicates(
    keys: &[u64],
    values: &[u64],
    equal: &mut [u64],
    grid: &Grid,
) {
    let chunk = grid.chunk_len();
    maybe_par_chunks_mut!(equal, chunk)
        .enumerate()
        .for_each(|(g, out)| {
            let base = g * chunk;
            for (j, e) in out.iter_mut().enumerate() {
                let i = base + j;
                *e = (i > 0 && keys[i] == keys[i - 1] && values[i] == values[i - 1]) as u64;
            }
        });
}

/// Stable partition driven by the running duplicate count in `prefix`.
///
/// Kept pairs shift left by their own prefix value; a duplicate with prefix
/// `p` goes to `n - p`. Returns the number of duplicates, which now occupy
/// the tail. The scatter lands in the scratch buffers and a second dispatch
/// copies them back.
pub(crate) fn partition_duplicates(
    keys: &mut [u64],
    values: &mut [u64],
    prefix: &[u64],
    temp_keys: &mut [u64],
    temp_values: &mut [u64],
    grid: &Grid,
) -> usize {
    let n = keys.len();
    let Some(&last) = prefix.last() else {
        return 0;
    };
    let removed = last as usize;
    if removed == 0 {
        return 0;
    }
    let live = n - removed;
    let chunk = grid.chunk_len();
    let groups = grid.groups();

    // Duplicates strictly before index i.
    let dups_before = |i: usize| if i == 0 { 0 } else { prefix[i - 1] as usize };

    let mut kept_lens = Vec::with_capacity(groups);
    let mut dup_lens = Vec::with_capacity(groups);
    for g in 0..groups {
        let r = grid.group_range(g);
        let d = dups_before(r.end) - dups_before(r.start);
        dup_lens.push(d);
        kept_lens.push(r.len() - d);
    }

    // Every group writes disjoint, contiguous output ranges.
    let (kept_keys, dup_keys) = temp_keys[..n].split_at_mut(live);
    let (kept_values, dup_values) = temp_values[..n].split_at_mut(live);
    let kept_keys = split_by_lengths(kept_keys, kept_lens.iter().copied());
    let kept_values = split_by_lengths(kept_values, kept_lens.iter().copied());
    // The tail fills back to front, so later groups sit lower.
    let mut dup_keys = split_by_lengths(dup_keys, dup_lens.iter().rev().copied());
    let mut dup_values = split_by_lengths(dup_values, dup_lens.iter().rev().copied());
    dup_keys.reverse();
    dup_values.reverse();

    let src_keys: &[u64] = &*keys;
    let src_values: &[u64] = &*values;
    maybe_par_into_iter!(kept_keys)
        .zip(kept_values)
        .zip(dup_keys)
        .zip(dup_values)
        .enumerate()
        .for_each(|(g, (((kk, kv), dk), dv))| {
            let range = grid.group_range(g);
            let kept_base = range.start - dups_before(range.start);
            let dup_top = dups_before(range.end);
            for i in range {
                let p = prefix[i] as usize;
                if p != dups_before(i) {
                    let slot = dup_top - p;
                    dk[slot] = src_keys[i];
                    dv[slot] = src_values[i];
                } else {
                    let slot = i - p - kept_base;
                    kk[slot] = src_keys[i];
                    kv[slot] = src_values[i];
                }
            }
        });

    maybe_par_chunks_mut!(keys, chunk)
        .zip(maybe_par_chunks!(temp_keys[..n], chunk))
        .for_each(|(dst, src)| dst.copy_from_slice(src));
    maybe_par_chunks_mut!(values, chunk)
        .zip(maybe_par_chunks!(temp_values[..n], chunk))
        .for_each(|(dst, src)| dst.copy_from_slice(src));

    removed
}

/// One pointer-jump: `to[i] := to[i - 1]` where keys match and targets differ.
///
/// Reads only pre-pass values. Returns whether any target changed.
pub(crate) fn forward_decay(
    keys: &[u64],
    values: &mut [u64],
    updated: &mut [u64],
    grid: &Grid,
) -> bool {
    let chunk = grid.chunk_len();
    {
        let current: &[u64] = &*values;
        maybe_par_chunks_mut!(updated, chunk)
            .enumerate()
            .for_each(|(g, out)| {
                let base = g * chunk;
                for (j, u) in out.iter_mut().enumerate() {
                    let i = base + j;
                    *u = if i > 0 && keys[i] == keys[i - 1] && current[i] != current[i - 1] {
                        current[i - 1]
                    } else {
                        current[i]
                    };
                }
            });
    }
    commit_updates(values, updated, grid);
    any_changed(updated)
}

fn split_by_lengths<'a>(
    mut rest: &'a mut [u64],
    lens: impl Iterator<Item = usize>,
) -> Vec<&'a mut [u64]> {
    let mut parts = Vec::new();
    for len in lens {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
        parts.push(head);
        rest = tail;
    }
    debug_assert!(rest.is_empty());
    parts
}
