mod common;

use common::{complete_samples, test_learner};
use proptest::prelude::*;
use rand::Rng;
use std::{sync::Arc, thread};
use tokio::sync::Barrier;

fn arb_thread_durations() -> impl Strategy<Value = Vec<Vec<u64>>> {
    prop::collection::vec(prop::collection::vec(1u64..1_000_000, 1..50), 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every completion is folded exactly once, whatever the interleaving.
    #[test]
    fn concurrent_ends_fold_exactly_once(per_thread in arb_thread_durations()) {
        let ll = test_learner("prop", &["shared"]);

        thread::scope(|s| {
            for durs in per_thread.iter() {
                let ll = ll.clone();
                s.spawn(move || complete_samples(&ll, "shared", None, durs));
            }
        });

        let all: Vec<u64> = per_thread.iter().flatten().copied().collect();
        let v = ll.values("shared");
        prop_assert_eq!(v.weight, all.len() as i64);
        prop_assert_eq!(v.cumulative, all.iter().sum::<u64>() as i64);
        prop_assert_eq!(v.min, *all.iter().min().expect("non-empty") as i64);
        prop_assert_eq!(v.max, *all.iter().max().expect("non-empty") as i64);

        ll.shutdown();
    }
}

#[test]
fn test_threads_with_variants() {
    let ll = test_learner("threads", &["work"]);
    let n_threads = 8;
    let n_per_thread = 200;

    let handles: Vec<_> = (0..n_threads)
        .map(|i| {
            let ll = ll.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                let variant = format!("t{}", i % 2);
                let durs: Vec<u64> = (0..n_per_thread)
                    .map(|_| rng.gen_range(1..10_000))
                    .collect();
                complete_samples(&ll, "work", Some(&variant), &durs);
                durs.iter().sum::<u64>()
            })
        })
        .collect();
    let total: u64 = handles
        .into_iter()
        .map(|h| h.join().expect("thread finished"))
        .sum();

    let parent = ll.values("work");
    assert_eq!(parent.weight, (n_threads * n_per_thread) as i64);
    assert_eq!(parent.cumulative, total as i64);

    let t0 = ll.variant_values("work", "t0");
    let t1 = ll.variant_values("work", "t1");
    assert_eq!(t0.weight + t1.weight, parent.weight);
    assert_eq!(t0.cumulative + t1.cumulative, parent.cumulative);

    ll.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tokio_tasks() {
    let ll = test_learner("tokio", &["task"]);
    let n_tasks = 8;
    let n_per_task = 50;
    let barrier = Arc::new(Barrier::new(n_tasks));

    let handles: Vec<_> = (0..n_tasks)
        .map(|_| {
            let ll = ll.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                for _ in 0..n_per_task {
                    let _guard = ll.enter("task");
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for h in handles {
        h.await.expect("task finished");
    }

    let v = ll.values_async("task").await;
    assert_eq!(v.weight, (n_tasks * n_per_task) as i64);

    ll.shutdown();
}

#[test]
fn test_outer_queue_backpressure() {
    let cfg = common::test_cfg("backpressure").with_outer_capacity(4);
    let ll = latency_learner::LatencyLearner::new(cfg, &["bp"]);

    thread::scope(|s| {
        for _ in 0..4 {
            let ll = ll.clone();
            s.spawn(move || complete_samples(&ll, "bp", None, &[1; 500]));
        }
    });

    assert_eq!(ll.values("bp").weight, 2000);
    ll.shutdown();
}
