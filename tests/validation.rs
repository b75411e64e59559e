mod support;

use quadtree_reduce::reduce_equivalences;
use quadtree_reduce::validation::validate;
use support::relations::random_forest;

#[test]
fn test_validation_basic() {
    let (mut from, mut to) = random_forest(1_000, 0.8, 2, 0);
    let before = validate(&from, &to);
    assert!(!before.is_compacted(), "expected a raw relation: {}", before);

    let live = reduce_equivalences(&mut from, &mut to).unwrap();
    let report = validate(&from[..live], &to[..live]);

    assert!(report.is_flat(), "expected flat relation: {}", report);
    assert_eq!(report.len, live);
    assert_eq!(report.summary(), "Flat");
}

#[test]
fn test_validation_flags_conflicts() {
    let report = validate(&[4, 4, 6], &[1, 2, 4]);
    assert_eq!(report.conflicting_keys, 1);
    assert_eq!(report.residual_indirections, 1);
    assert!(!report.is_compacted());
    eprintln!("conflicts: {}", report);
}
