mod common;

use common::{complete_samples, init_log, test_cfg};
use latency_learner::global;

#[test]
fn test_global_init_once() {
    init_log();
    assert!(global::try_learner().is_none());

    let first = global::init_with_cfg(test_cfg("global"), &["declared-first"]);
    let second = global::init(&["declared-second"]);
    let third = global::learner();

    complete_samples(first, "declared-first", None, &[10]);
    complete_samples(second, "declared-first", None, &[20]);
    complete_samples(third, "declared-first", None, &[30]);

    let v = global::learner().values("declared-first");
    assert_eq!(v.weight, 3, "all handles share one engine");
    assert_eq!(v.cumulative, 60);

    assert!(
        !global::learner().values("declared-second").found,
        "later declarations are ignored"
    );
    assert!(global::try_learner().is_some());
}
