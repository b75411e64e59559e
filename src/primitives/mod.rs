//! Data-parallel building blocks shared by both convergence loops.

mod scan;
mod search;
mod sort;

pub(crate) use scan::inclusive_scan;
pub(crate) use search::binary_search;
pub(crate) use sort::sort_by_key;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::device::Grid;

/// Global logical-OR over per-entry change flags.
#[inline]
pub(crate) fn any_changed(flags: &[u64]) -> bool {
    maybe_par_iter!(flags).any(|&f| f != 0)
}

/// Second half of a two-phase pass: move candidates from `updated` into
/// `values`, leaving a 0/1 change flag per entry behind in `updated`.
pub(crate) fn commit_updates(values: &mut [u64], updated: &mut [u64], grid: &Grid) {
    debug_assert_eq!(values.len(), updated.len());
    let chunk = grid.chunk_len();
    maybe_par_chunks_mut!(values, chunk)
        .zip(maybe_par_chunks_mut!(updated, chunk))
        .for_each(|(vals, upd)| {
            for (v, u) in vals.iter_mut().zip(upd.iter_mut()) {
                if *u != *v {
                    *v = *u;
                    *u = 1;
                } else {
                    *u = 0;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_changed() {
        assert!(!any_changed(&[]));
        assert!(!any_changed(&[0, 0, 0]));
        assert!(any_changed(&[0, 0, 1]));
    }

    #[test]
    fn test_commit_updates_flags() {
        let mut values = vec![1, 2, 3, 4];
        let mut updated = vec![1, 5, 3, 0];
        commit_updates(&mut values, &mut updated, &Grid::new(4, 3));
        assert_eq!(values, vec![1, 5, 3, 0]);
        assert_eq!(updated, vec![0, 1, 0, 1]);
    }
}
