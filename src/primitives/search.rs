//! Exact-match search over sorted keys.

/// Find `x` in the sorted range `arr[first..last]`.
///
/// Returns the index of a matching element, or `last` if there is none.
/// With repeated keys any matching index may be returned.
#[inline]
pub(crate) fn binary_search(arr: &[u64], mut first: usize, mut last: usize, x: u64) -> usize {
    debug_assert!(last <= arr.len());
    let not_found = last;
    while first < last {
        let mid = first + (last - first) / 2;
        let m = arr[mid];
        if m > x {
            last = mid;
        } else if m < x {
            first = mid + 1;
        } else {
            return mid;
        }
    }
    not_found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_every_key() {
        let keys = [1, 3, 5, 7, 9, 11];
        for (i, &k) in keys.iter().enumerate() {
            assert_eq!(binary_search(&keys, 0, keys.len(), k), i);
        }
    }

    #[test]
    fn test_missing_returns_last() {
        let keys = [1, 3, 5, 7];
        for x in [0, 2, 4, 6, 8, u64::MAX] {
            assert_eq!(binary_search(&keys, 0, keys.len(), x), keys.len());
        }
        assert_eq!(binary_search(&keys, 0, 2, 5), 2);
        assert_eq!(binary_search(&[], 0, 0, 5), 0);
    }

    #[test]
    fn test_subrange() {
        let keys = [1, 3, 5, 7, 9];
        assert_eq!(binary_search(&keys, 2, 4, 7), 3);
        assert_eq!(binary_search(&keys, 2, 4, 3), 4);
    }

    #[test]
    fn test_repeated_keys_hit_some_match() {
        let keys = [2, 4, 4, 4, 8];
        let i = binary_search(&keys, 0, keys.len(), 4);
        assert_eq!(keys[i], 4);
    }
}
