//! Structural validation for equivalence relations.
//!
//! Provides functions to check whether a relation is compacted (sorted, no
//! duplicate pairs, one target per key) and flat (no target is itself a key).
//! Useful for debugging, testing, and checking externally produced relations.

use rustc_hash::{FxHashMap, FxHashSet};

/// Detailed validation report for a relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationReport {
    /// Number of pairs checked.
    pub len: usize,
    /// Positions `i` with `from[i] < from[i - 1]`.
    pub unsorted_positions: usize,
    /// Pairs identical to an earlier pair.
    pub exact_duplicates: usize,
    /// Keys mapped to more than one distinct target.
    pub conflicting_keys: usize,
    /// Pairs whose target is a key that maps somewhere else.
    pub residual_indirections: usize,
    /// Pairs mapping a key to itself.
    pub self_loops: usize,
}

impl RelationReport {
    /// Sorted by key, no duplicate pairs, one target per key.
    pub fn is_compacted(&self) -> bool {
        self.unsorted_positions == 0 && self.exact_duplicates == 0 && self.conflicting_keys == 0
    }

    /// Compacted, and every target is terminal.
    pub fn is_flat(&self) -> bool {
        self.is_compacted() && self.residual_indirections == 0
    }

    /// Format a summary of any issues found.
    pub fn summary(&self) -> String {
        if self.is_flat() {
            return "Flat".to_string();
        }

        let mut issues = Vec::new();
        if self.unsorted_positions > 0 {
            issues.push(format!("{} unsorted positions", self.unsorted_positions));
        }
        if self.exact_duplicates > 0 {
            issues.push(format!("{} duplicate pairs", self.exact_duplicates));
        }
        if self.conflicting_keys > 0 {
            issues.push(format!("{} conflicting keys", self.conflicting_keys));
        }
        if self.residual_indirections > 0 {
            issues.push(format!(
                "{} residual indirections",
                self.residual_indirections
            ));
        }
        issues.join(", ")
    }
}

impl std::fmt::Display for RelationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RelationReport {{ n={}, self_loops={}, {} }}",
            self.len,
            self.self_loops,
            self.summary()
        )
    }
}

/// Validate a relation given as parallel `from`/`to` arrays.
///
/// Only the common prefix is examined if the lengths differ. A key mapped to
/// itself is terminal: pointing at it is not a residual indirection.
pub fn validate(from: &[u64], to: &[u64]) -> RelationReport {
    let len = from.len().min(to.len());
    let from = &from[..len];
    let to = &to[..len];

    let unsorted_positions = from.windows(2).filter(|w| w[1] < w[0]).count();

    let mut seen_pairs: FxHashSet<(u64, u64)> =
        FxHashSet::with_capacity_and_hasher(len, Default::default());
    let mut first_target: FxHashMap<u64, u64> =
        FxHashMap::with_capacity_and_hasher(len, Default::default());
    let mut conflicting: FxHashSet<u64> = FxHashSet::default();
    let mut exact_duplicates = 0usize;

    for (&k, &v) in from.iter().zip(to) {
        if !seen_pairs.insert((k, v)) {
            exact_duplicates += 1;
            continue;
        }
        match first_target.get(&k) {
            Some(&t) if t != v => {
                conflicting.insert(k);
            }
            Some(_) => {}
            None => {
                first_target.insert(k, v);
            }
        }
    }

    let mut residual_indirections = 0usize;
    let mut self_loops = 0usize;
    for (&k, &v) in from.iter().zip(to) {
        if k == v {
            self_loops += 1;
        } else if first_target.get(&v).is_some_and(|&t| t != v) {
            residual_indirections += 1;
        }
    }

    RelationReport {
        len,
        unsorted_positions,
        exact_duplicates,
        conflicting_keys: conflicting.len(),
        residual_indirections,
        self_loops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_relation() {
        let report = validate(&[1, 2, 3], &[0, 0, 0]);
        assert!(report.is_flat());
        assert_eq!(report.summary(), "Flat");
    }

    #[test]
    fn test_detects_each_issue() {
        let report = validate(&[2, 1, 1, 4, 4], &[1, 0, 0, 5, 6]);
        assert_eq!(report.unsorted_positions, 1);
        assert_eq!(report.exact_duplicates, 1);
        assert_eq!(report.conflicting_keys, 1);
        assert_eq!(report.residual_indirections, 1);
        assert!(!report.is_compacted());
        assert!(report.summary().contains("conflicting"));
    }

    #[test]
    fn test_self_loop_not_indirection() {
        let report = validate(&[3, 5], &[3, 3]);
        assert_eq!(report.self_loops, 1);
        assert_eq!(report.residual_indirections, 0);
        assert!(report.is_flat());

        let report = validate(&[3, 5], &[5, 3]);
        assert_eq!(report.residual_indirections, 2);
        assert!(!report.is_flat());
    }
}
