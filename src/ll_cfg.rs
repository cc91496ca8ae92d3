//! Configuration of a [`LatencyLearner`](crate::LatencyLearner).

use crate::{
    benchmarks::{default_benchmarks, BenchmarkProvider},
    host_info::{default_host_info, HostInfoProvider},
    Benchmark,
};
use std::{path::PathBuf, sync::Arc};

/// Configuration for [`LatencyLearner`](crate::LatencyLearner). It is instantiated with its
/// [`LatencyLearnerCfg::default`] method and can be customized with its other methods.
///
/// Settings take effect when the engine is created. The report settings can also be
/// changed later with the engine's setters.
#[derive(Clone)]
pub struct LatencyLearnerCfg {
    pub(crate) report_path: PathBuf,
    pub(crate) report_builtins: bool,
    pub(crate) subtract_overhead: bool,
    pub(crate) outer_capacity: usize,
    pub(crate) inner_capacity: usize,
    pub(crate) self_sample_count: usize,
    pub(crate) benchmark_iterations: usize,
    pub(crate) benchmarks: BenchmarkProvider,
    pub(crate) host_info: HostInfoProvider,
}

impl Default for LatencyLearnerCfg {
    /// Instantiates a default [`LatencyLearnerCfg`]. The defaults are:
    /// - `report_path` of `latlearn-report.txt`, in the current directory.
    /// - `report_builtins` of `true`.
    /// - `subtract_overhead` of `false`.
    /// - `outer_capacity` of `1,000,000` messages. The queue's buffer is allocated up front,
    ///   so lower this for short-lived engines.
    /// - `inner_capacity` of `50` messages.
    /// - `self_sample_count` of `1,000,000` back-to-back samples of [`NOOP_SPAN`](crate::NOOP_SPAN).
    /// - `benchmark_iterations` of `1,000` per benchmark body.
    /// - the [`default_benchmarks`] suite and the [`default_host_info`] facts.
    fn default() -> Self {
        LatencyLearnerCfg {
            report_path: PathBuf::from("latlearn-report.txt"),
            report_builtins: true,
            subtract_overhead: false,
            outer_capacity: 1_000_000,
            inner_capacity: 50,
            self_sample_count: 1_000_000,
            benchmark_iterations: 1000,
            benchmarks: Arc::new(default_benchmarks),
            host_info: Arc::new(default_host_info),
        }
    }
}

impl LatencyLearnerCfg {
    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given report file path.
    pub fn with_report_path(&self, report_path: impl Into<PathBuf>) -> Self {
        LatencyLearnerCfg {
            report_path: report_path.into(),
            ..self.clone()
        }
    }

    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given `report_builtins`,
    /// which controls whether spans in the built-in namespace are rendered in reports.
    pub fn with_report_builtins(&self, report_builtins: bool) -> Self {
        LatencyLearnerCfg {
            report_builtins,
            ..self.clone()
        }
    }

    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given `subtract_overhead`,
    /// which controls whether reports subtract the overhead estimate from min, last and mean.
    pub fn with_subtract_overhead(&self, subtract_overhead: bool) -> Self {
        LatencyLearnerCfg {
            subtract_overhead,
            ..self.clone()
        }
    }

    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given capacity for the
    /// application-facing queue. Senders block while the queue is full.
    pub fn with_outer_capacity(&self, outer_capacity: usize) -> Self {
        LatencyLearnerCfg {
            outer_capacity,
            ..self.clone()
        }
    }

    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given capacity for the
    /// engine-internal queue. A capacity of `0` is raised to `1`.
    pub fn with_inner_capacity(&self, inner_capacity: usize) -> Self {
        LatencyLearnerCfg {
            inner_capacity: inner_capacity.max(1),
            ..self.clone()
        }
    }

    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given number of
    /// overhead self-samples taken by default.
    pub fn with_self_sample_count(&self, self_sample_count: usize) -> Self {
        LatencyLearnerCfg {
            self_sample_count,
            ..self.clone()
        }
    }

    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given default number of
    /// iterations per benchmark body.
    pub fn with_benchmark_iterations(&self, benchmark_iterations: usize) -> Self {
        LatencyLearnerCfg {
            benchmark_iterations,
            ..self.clone()
        }
    }

    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given benchmark suite provider.
    pub fn with_benchmarks(
        &self,
        benchmarks: impl Fn() -> Vec<Benchmark> + Send + Sync + 'static,
    ) -> Self {
        LatencyLearnerCfg {
            benchmarks: Arc::new(benchmarks),
            ..self.clone()
        }
    }

    /// Creates a new [`LatencyLearnerCfg`] the same as `self` but with the given host facts provider.
    pub fn with_host_info(
        &self,
        host_info: impl Fn() -> Vec<(String, String)> + Send + Sync + 'static,
    ) -> Self {
        LatencyLearnerCfg {
            host_info: Arc::new(host_info),
            ..self.clone()
        }
    }
}
