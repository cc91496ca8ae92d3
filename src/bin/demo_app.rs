//! Demo application exercising the process-wide latency learner: scoped and explicit spans,
//! variants, alternate outcomes, benchmarks and reports.

use latency_learner::{global, LatencyLearnerCfg};
use std::{
    env::set_var,
    panic::{self, AssertUnwindSafe},
    thread,
    time::Duration,
};

const N: usize = 200;

fn sum_to(n: usize) -> usize {
    let _guard = global::learner().enter("sum-to");
    (0..n).sum()
}

fn checked_parse(s: &str) -> Option<i64> {
    let guard = global::learner().enter("checked-parse");
    let Ok(v) = s.parse::<i64>() else {
        guard.end_as("earlyreturn");
        return None;
    };
    Some(v)
}

fn fragile(fail: bool) {
    let ll = global::learner();
    let guard = ll.enter("fragile");
    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        if fail {
            panic!("fragile failed");
        }
    }));
    if res.is_err() {
        guard.end_as("panic");
    }
}

fn sleepy(millis: u64) {
    let ll = global::learner();
    let sample = ll.start_variant("sleepy", &format!("ms={millis}"));
    thread::sleep(Duration::from_millis(millis));
    ll.end(sample);
}

fn main() {
    set_var("RUST_LOG", "latency_learner=debug");
    _ = env_logger::try_init();

    let cfg = LatencyLearnerCfg::default()
        .with_report_path("latlearn-demo-report.txt")
        .with_outer_capacity(100_000)
        .with_self_sample_count(100_000)
        .with_benchmark_iterations(100);
    let ll = global::init_with_cfg(cfg, &["sum-to", "checked-parse", "fragile", "sleepy"]);

    ll.measure_self_sample(None);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                for j in 0..N {
                    sum_to(j * 10);
                    checked_parse(if j % 7 == 0 { "x" } else { "42" });
                    fragile(i == 0 && j % 50 == 0);
                }
                sleepy(1 + i as u64);
            })
        })
        .collect();
    for h in handles {
        _ = h.join();
    }

    // Ad hoc span, registered on first completion.
    ll.measure("startup-tail", || thread::sleep(Duration::from_millis(3)));

    if let Err(err) = ll.run_benchmarks() {
        log::error!("benchmarks failed: {err}");
    }

    let params = [format!("N={N}"), "threads=4".to_owned(), "demo=true".to_owned()];
    match ll.generate_report(&params) {
        Ok(()) => println!("report written to latlearn-demo-report.txt"),
        Err(err) => eprintln!("report failed: {err}"),
    }

    ll.set_report_builtins(false);
    ll.set_subtract_overhead(true);
    ll.set_report_path("latlearn-demo-report-net.txt");
    match ll.generate_report(&params) {
        Ok(()) => println!("report written to latlearn-demo-report-net.txt"),
        Err(err) => eprintln!("report failed: {err}"),
    }

    let v = ll.values("checked-parse");
    println!(
        "checked-parse: weight={}, min={} ns, mean={} ns, overhead estimate={:?} ns",
        v.weight,
        v.min,
        v.mean,
        ll.overhead_estimate()
    );

    ll.shutdown();
}
