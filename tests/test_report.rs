mod common;

use common::{complete_samples, report_row, temp_report_path, test_cfg, test_learner};
use latency_learner::{LatencyLearner, ReportError, NOOP_SPAN, REPORT_SPAN};
use std::{fs, path::Path};

fn write_and_read(ll: &LatencyLearner, path: &Path, params: &[&str]) -> String {
    ll.set_report_path(path);
    ll.generate_report(params).expect("report written");
    fs::read_to_string(path).expect("report readable")
}

#[test]
fn test_report_rows_in_tracked_order() {
    let ll = test_learner("order", &["alpha", "beta"]);
    complete_samples(&ll, "zeta", None, &[9]);
    complete_samples(&ll, "alpha", Some("v1"), &[100, 300]);

    let path = temp_report_path("order");
    let report = write_and_read(&ll, &path, &["ver=1"]);

    let pos = |name: &str| {
        report
            .lines()
            .position(|l| l.starts_with(&format!("{name} ")) || l.starts_with(&format!("{name}:")))
            .unwrap_or_else(|| panic!("row for {name} in\n{report}"))
    };
    assert!(pos("alpha") < pos("beta"));
    assert!(pos("beta") < pos(NOOP_SPAN), "declared before built-ins");
    assert!(pos(NOOP_SPAN) < pos(REPORT_SPAN));
    assert!(pos(REPORT_SPAN) < pos("zeta"), "ad hoc after built-ins");
    assert!(pos("zeta") < pos("alpha(v1)"), "registration order");

    let alpha = report_row(&report, "alpha").expect("alpha row");
    assert_eq!(alpha[0], "100", "min");
    assert_eq!(alpha[1], "300", "last");
    assert_eq!(alpha[2], "300", "max");
    assert_eq!(alpha[3], "200", "mean");
    assert_eq!(alpha[4], "2", "weight");

    let beta = report_row(&report, "beta").expect("beta row");
    assert!(beta[0].contains("???"), "{beta:?}");

    assert!(report.starts_with("Latency Report"));
    assert!(report.contains("subtract_overhead: false"));
    assert!(report.contains("since init: "));
    assert!(report.contains("ver=1"));

    ll.shutdown();
    _ = fs::remove_file(path);
}

#[test]
fn test_report_excludes_builtins() {
    let ll = LatencyLearner::new(test_cfg("nobuiltins").with_report_builtins(false), &["alpha"]);
    complete_samples(&ll, "alpha", None, &[1]);

    let path = temp_report_path("nobuiltins");
    let report = write_and_read(&ll, &path, &[] as &[&str]);
    assert!(report_row(&report, "alpha").is_some());
    assert!(!report.contains("LL."), "{report}");

    ll.set_report_builtins(true);
    let report = write_and_read(&ll, &path, &[] as &[&str]);
    assert!(report_row(&report, NOOP_SPAN).is_some());

    ll.shutdown();
    _ = fs::remove_file(path);
}

#[test]
fn test_report_subtracts_overhead() {
    let ll = test_learner("subtract", &["tiny"]);
    ll.set_subtract_overhead(true);
    complete_samples(&ll, NOOP_SPAN, None, &[5, 8]);
    complete_samples(&ll, "tiny", None, &[3, 20]);
    assert_eq!(ll.overhead_estimate(), Some(5));

    let path = temp_report_path("subtract");
    let report = write_and_read(&ll, &path, &[] as &[&str]);
    assert!(report.contains("subtract_overhead: true"));
    assert!(report.contains("metric treated as overhead: LL.no-op, min"));

    let tiny = report_row(&report, "tiny").expect("tiny row");
    assert_eq!(&tiny[..5], &["0", "15", "20", "6", "2"], "min floored, max raw");

    let noop = report_row(&report, NOOP_SPAN).expect("no-op row");
    assert_eq!(noop[0], "5", "no-op min shown raw");
    assert_eq!(noop[2], "8", "max raw");

    // Stored statistics are untouched.
    assert_eq!(ll.values("tiny").min, 3);

    ll.shutdown();
    _ = fs::remove_file(path);
}

#[test]
fn test_report_params_four_per_line() {
    let ll = test_learner("params", &[]);
    let path = temp_report_path("params");
    let report = write_and_read(&ll, &path, &["a=1", "b=2", "c=3", "d=4", "e=5"]);
    assert!(report.contains("a=1, b=2, c=3, d=4\ne=5\n"), "{report}");

    ll.shutdown();
    _ = fs::remove_file(path);
}

#[test]
fn test_report_times_itself() {
    let ll = test_learner("self", &["alpha"]);
    assert!(!ll.values(REPORT_SPAN).pair_ever_completed);

    let path = temp_report_path("self");
    write_and_read(&ll, &path, &[] as &[&str]);
    assert_eq!(ll.values(REPORT_SPAN).weight, 1);

    write_and_read(&ll, &path, &[] as &[&str]);
    assert_eq!(ll.values(REPORT_SPAN).weight, 2);

    ll.shutdown();
    _ = fs::remove_file(path);
}

#[test]
fn test_report_overwrites_file() {
    let ll = test_learner("overwrite", &[]);
    let path = temp_report_path("overwrite");

    write_and_read(&ll, &path, &["run=first"]);
    let report = write_and_read(&ll, &path, &["run=second"]);
    assert!(report.contains("run=second"));
    assert!(!report.contains("run=first"));

    ll.shutdown();
    _ = fs::remove_file(path);
}

#[test]
fn test_report_unwritable_path() {
    let ll = test_learner("unwritable", &["alpha"]);
    complete_samples(&ll, "alpha", None, &[10]);

    let path = std::env::temp_dir()
        .join("latlearn-no-such-dir")
        .join("nested")
        .join("report.txt");
    ll.set_report_path(&path);

    let res = ll.generate_report(&["x=1"]);
    assert!(matches!(res, Err(ReportError::Io(_))), "{res:?}");

    assert_eq!(ll.values("alpha").weight, 1, "state unchanged");
    assert!(
        !ll.values(REPORT_SPAN).pair_ever_completed,
        "failed report is not timed"
    );

    ll.shutdown();
}

#[test]
fn test_report_sees_prior_ends() {
    let ll = test_learner("prior", &["alpha"]);
    let path = temp_report_path("prior");

    for i in 1..=50 {
        complete_samples(&ll, "alpha", None, &[i]);
    }
    let report = write_and_read(&ll, &path, &[] as &[&str]);
    let alpha = report_row(&report, "alpha").expect("alpha row");
    assert_eq!(alpha[4], "50");

    ll.shutdown();
    _ = fs::remove_file(path);
}

#[tokio::test]
async fn test_report_async() {
    let ll = test_learner("async", &["alpha"]);
    let path = temp_report_path("async");
    ll.set_report_path(&path);
    complete_samples(&ll, "alpha", None, &[10]);

    ll.generate_report_async(vec!["mode=async".to_owned()])
        .await
        .expect("report written");
    let report = fs::read_to_string(&path).expect("report readable");
    assert!(report.contains("mode=async"));

    ll.shutdown();
    _ = fs::remove_file(path);
}

#[test]
fn test_report_with_panicking_host_info() {
    let cfg = test_cfg("hostpanic").with_host_info(|| panic!("host facts unavailable"));
    let ll = LatencyLearner::new(cfg, &["alpha"]);
    complete_samples(&ll, "alpha", None, &[10, 20]);

    let path = temp_report_path("hostpanic");
    let report = write_and_read(&ll, &path, &["x=1"]);
    let alpha = report_row(&report, "alpha").expect("alpha row");
    assert_eq!(alpha[4], "2");

    complete_samples(&ll, "alpha", None, &[30]);
    let v = ll.values("alpha");
    assert!(v.found);
    assert_eq!(v.weight, 3, "statistics survive");
    assert_eq!(ll.values(REPORT_SPAN).weight, 1);

    ll.shutdown();
    _ = fs::remove_file(path);
}
