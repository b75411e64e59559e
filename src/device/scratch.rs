//! Per-call scratch buffers.

use snafu::ResultExt;

use crate::error::{Result, ScratchAllocationSnafu};

/// Working buffers owned by one reduction call.
///
/// Sized once to the caller's pair count and dropped when the call returns.
/// Passes only ever use the `[0, n)` prefix for the current live count `n`.
pub(crate) struct ScratchPool {
    /// Per-entry flags: duplicate marks, their running sum, then change flags.
    pub(crate) updated: Vec<u64>,
    /// Partition targets for keys.
    pub(crate) temp_keys: Vec<u64>,
    /// Partition targets for values.
    pub(crate) temp_values: Vec<u64>,
    /// Key-value staging for the stable sort.
    pub(crate) pairs: Vec<(u64, u64)>,
    /// One running total per work-group for the block scan.
    pub(crate) block_sums: Vec<u64>,
}

impl ScratchPool {
    /// Buffers for the full compact-then-flatten pipeline.
    pub(crate) fn for_compaction(n: usize, units: usize) -> Result<Self> {
        Ok(Self {
            updated: zeroed(n)?,
            temp_keys: zeroed(n)?,
            temp_values: zeroed(n)?,
            pairs: zeroed(n)?,
            block_sums: zeroed(units.max(1))?,
        })
    }

    /// Buffers for flattening alone, which only needs the update flags.
    pub(crate) fn for_flattening(n: usize) -> Result<Self> {
        Ok(Self {
            updated: zeroed(n)?,
            temp_keys: Vec::new(),
            temp_values: Vec::new(),
            pairs: Vec::new(),
            block_sums: Vec::new(),
        })
    }
}

fn zeroed<T: Copy + Default>(n: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .context(ScratchAllocationSnafu { requested: n })?;
    v.resize(n, T::default());
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compaction_pool_sizes() {
        let pool = ScratchPool::for_compaction(10, 4).unwrap();
        assert_eq!(pool.updated.len(), 10);
        assert_eq!(pool.temp_keys.len(), 10);
        assert_eq!(pool.temp_values.len(), 10);
        assert_eq!(pool.pairs.len(), 10);
        assert_eq!(pool.block_sums.len(), 4);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let result = ScratchPool::for_flattening(usize::MAX / 2);
        assert!(matches!(
            result,
            Err(crate::Error::ScratchAllocation { .. })
        ));
    }
}
