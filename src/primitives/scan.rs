//! Inclusive prefix sum (block scan).

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::device::Grid;

/// Replace `values[i]` with `values[0] + ... + values[i]`, returning the total.
///
/// Each group scans its own chunk, the per-group totals are scanned on the
/// calling thread, and a second dispatch adds each group's carry-in.
/// `block_sums` needs one slot per group.
pub(crate) fn inclusive_scan(values: &mut [u64], block_sums: &mut [u64], grid: &Grid) -> u64 {
    let blocks = grid.groups();
    debug_assert!(block_sums.len() >= blocks);
    if blocks == 0 {
        return 0;
    }
    let chunk = grid.chunk_len();
    let sums = &mut block_sums[..blocks];

    maybe_par_chunks_mut!(values, chunk)
        .zip(maybe_par_iter_mut!(sums))
        .for_each(|(block, total)| {
            let mut acc = 0u64;
            for v in block.iter_mut() {
                acc += *v;
                *v = acc;
            }
            *total = acc;
        });

    let mut carry = 0u64;
    for s in sums.iter_mut() {
        let block_total = *s;
        *s = carry;
        carry += block_total;
    }

    maybe_par_chunks_mut!(values, chunk)
        .zip(maybe_par_iter!(sums))
        .for_each(|(block, &offset)| {
            if offset != 0 {
                for v in block.iter_mut() {
                    *v += offset;
                }
            }
        });

    carry
}
