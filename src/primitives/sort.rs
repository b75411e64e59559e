//! Stable key-value sort over two parallel arrays.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::device::Grid;

/// Stable sort of `keys` ascending, carrying `values` through the same
/// permutation. `pairs` is staging space of the same length.
///
/// Entries with equal keys keep their relative order; forward decay relies
/// on this to pick the first surviving target for a key.
pub(crate) fn sort_by_key(
    keys: &mut [u64],
    values: &mut [u64],
    pairs: &mut [(u64, u64)],
    grid: &Grid,
) {
    debug_assert_eq!(keys.len(), values.len());
    debug_assert_eq!(keys.len(), pairs.len());
    if keys.len() < 2 {
        return;
    }
    let chunk = grid.chunk_len();

    maybe_par_chunks_mut!(pairs, chunk)
        .zip(maybe_par_chunks!(keys, chunk))
        .zip(maybe_par_chunks!(values, chunk))
        .for_each(|((out, ks), vs)| {
            for ((p, &k), &v) in out.iter_mut().zip(ks).zip(vs) {
                *p = (k, v);
            }
        });

    #[cfg(feature = "parallel")]
    pairs.par_sort_by_key(|p| p.0);
    #[cfg(not(feature = "parallel"))]
    pairs.sort_by_key(|p| p.0);

    maybe_par_chunks!(pairs, chunk)
        .zip(maybe_par_chunks_mut!(keys, chunk))
        .zip(maybe_par_chunks_mut!(values, chunk))
        .for_each(|((src, ks), vs)| {
            for ((&(k, v), ko), vo) in src.iter().zip(ks.iter_mut()).zip(vs.iter_mut()) {
                *ko = k;
                *vo = v;
            }
        });
}
