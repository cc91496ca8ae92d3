#![allow(dead_code)]

use latency_learner::{no_host_info, LatencyLearner, LatencyLearnerCfg};
use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

pub fn init_log() {
    std::env::set_var("RUST_LOG", "latency_learner=debug");
    _ = env_logger::try_init();
}

/// Unique path under the system temp dir, so parallel tests never share a report file.
pub fn temp_report_path(tag: &str) -> PathBuf {
    static SEQ: AtomicUsize = AtomicUsize::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "latlearn-test-{tag}-{}-{seq}.txt",
        std::process::id()
    ))
}

/// Configuration sized for tests: small queues, short benchmark runs and no host facts.
pub fn test_cfg(tag: &str) -> LatencyLearnerCfg {
    LatencyLearnerCfg::default()
        .with_report_path(temp_report_path(tag))
        .with_outer_capacity(10_000)
        .with_self_sample_count(100)
        .with_benchmark_iterations(10)
        .with_host_info(no_host_info)
}

pub fn test_learner(tag: &str, declared: &[&str]) -> LatencyLearner {
    init_log();
    LatencyLearner::new(test_cfg(tag), declared)
}

/// Completes one sample of `name` (or of its `variant`) per entry of `durs_ns`, with
/// exactly that duration.
pub fn complete_samples(ll: &LatencyLearner, name: &str, variant: Option<&str>, durs_ns: &[u64]) {
    for &ns in durs_ns {
        let sample = match variant {
            Some(variant) => ll.start_variant(name, variant),
            None => ll.start(name),
        };
        ll.end(sample.with_duration(Duration::from_nanos(ns)));
    }
}

/// Cells of the report row for `name`: min, last, max, mean, weight, time fraction, name.
pub fn report_row(report: &str, name: &str) -> Option<Vec<String>> {
    let line = report.lines().find(|l| {
        l.split_once(':')
            .map(|(n, _)| n.trim_end() == name)
            .unwrap_or(false)
    })?;
    let (_, rest) = line.split_once(": ")?;
    let cells = rest
        .split(" | ")
        .map(|c| {
            c.trim()
                .trim_start_matches("w ")
                .trim_start_matches("tf ")
                .trim()
                .to_owned()
        })
        .collect();
    Some(cells)
}
