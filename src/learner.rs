//! [`LatencyLearner`], the application-facing handle that turns caller intent into actor messages.

use crate::{
    actor::{Actor, ActorCfg, Msg},
    error::{ReportError, RequestError},
    ll_cfg::LatencyLearnerCfg,
    overhead::self_sample,
    registry::{variant_name, Registry, NOOP_SPAN},
    report::ReportSettings,
    sample::{Completion, SpanGuard, SpanSample},
    span_record::SpanValues,
};
use crossbeam_channel::{bounded, Sender};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};

struct LearnerInner {
    outer_tx: Sender<Msg>,
    report: Mutex<ReportSettings>,
    stopped: AtomicBool,
    self_sample_count: usize,
    init_time: Instant,
}

/// Handle to a latency-learning engine.
///
/// Creating one spawns the actor thread that owns every span's statistics; all methods
/// reach that state only through messages. Clones share the same engine.
///
/// Ending a span is asynchronous (it only blocks while the outer queue is full).
/// [`Self::values`], [`Self::run_benchmarks`] and [`Self::generate_report`] block until the actor
/// has handled the request. They must not be called from a benchmark body, which runs on the actor.
#[derive(Clone)]
pub struct LatencyLearner {
    inner: Arc<LearnerInner>,
}

impl Default for LatencyLearner {
    /// Engine with the default configuration and no declared spans.
    fn default() -> Self {
        Self::new(LatencyLearnerCfg::default(), &[] as &[&str])
    }
}

impl LatencyLearner {
    /// Creates an engine tracking the `declared` spans, in report order, followed by the built-in spans.
    /// The actor is spawned last, once the registry and both queues exist.
    pub fn new<S: AsRef<str>>(config: LatencyLearnerCfg, declared: &[S]) -> Self {
        let init_time = Instant::now();
        let registry = Registry::new(declared);
        let (outer_tx, outer_rx) = bounded(config.outer_capacity);

        let actor = Actor::new(
            registry,
            init_time,
            outer_rx,
            ActorCfg {
                inner_capacity: config.inner_capacity,
                self_sample_count: config.self_sample_count,
                benchmark_iterations: config.benchmark_iterations,
                benchmarks: config.benchmarks.clone(),
                host_info: config.host_info.clone(),
            },
        );

        let learner = LatencyLearner {
            inner: Arc::new(LearnerInner {
                outer_tx,
                report: Mutex::new(ReportSettings {
                    path: config.report_path,
                    include_builtins: config.report_builtins,
                    subtract_overhead: config.subtract_overhead,
                }),
                stopped: AtomicBool::new(false),
                self_sample_count: config.self_sample_count,
                init_time,
            }),
        };

        actor.spawn();
        log::debug!("latency learner initialized");
        learner
    }

    /// Time at which the engine was created; reports compute time fractions against it.
    pub fn init_time(&self) -> Instant {
        self.inner.init_time
    }

    //=================
    // Spans

    /// Starts a sample of span `name`. Does not touch the engine.
    pub fn start(&self, name: &str) -> SpanSample {
        SpanSample::new(name, None)
    }

    /// Starts a sample of the `variant` of span `name`. Ending it records into both
    /// `name(variant)` and `name`. An empty `variant` is the same as [`Self::start`].
    pub fn start_variant(&self, name: &str, variant: &str) -> SpanSample {
        SpanSample::new(name, Some(variant.to_owned()))
    }

    /// Ends `sample`, sending its completion to the actor.
    pub fn end(&self, sample: SpanSample) {
        let completion = sample.complete(None);
        self.send_end(completion);
    }

    /// Ends `sample` under the `outcome` variant of its base name, in place of its own variant.
    pub fn end_as(&self, sample: SpanSample, outcome: &str) {
        let completion = sample.complete(Some(outcome));
        self.send_end(completion);
    }

    fn send_end(&self, completion: Completion) {
        if self.is_stopped() {
            return;
        }
        if self.inner.outer_tx.send(Msg::End(completion)).is_err() {
            log::trace!("completion dropped, engine stopped");
        }
    }

    /// Starts a scoped sample that ends when the returned guard is dropped.
    pub fn enter(&self, name: &str) -> SpanGuard {
        SpanGuard::new(self.clone(), self.start(name))
    }

    /// Scoped form of [`Self::start_variant`].
    pub fn enter_variant(&self, name: &str, variant: &str) -> SpanGuard {
        SpanGuard::new(self.clone(), self.start_variant(name, variant))
    }

    /// Runs `f` inside a scoped sample of span `name` and returns its result.
    pub fn measure<R>(&self, name: &str, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter(name);
        f()
    }

    //=================
    // Queries

    /// Snapshot of span `name`. A name the engine has never seen, or a stopped engine,
    /// yields a snapshot with `found == false`.
    pub fn values(&self, name: &str) -> SpanValues {
        if self.is_stopped() {
            return SpanValues::not_found(name);
        }
        let (reply, rx) = bounded(1);
        let msg = Msg::Query {
            name: name.to_owned(),
            reply,
        };
        if self.inner.outer_tx.send(msg).is_err() {
            log::warn!("query for {name:?} not sent, engine stopped");
            return SpanValues::not_found(name);
        }
        rx.recv().unwrap_or_else(|_| {
            log::warn!("query for {name:?} not answered, engine stopped");
            SpanValues::not_found(name)
        })
    }

    /// Snapshot of variant `variant` of span `name`.
    pub fn variant_values(&self, name: &str, variant: &str) -> SpanValues {
        self.values(&variant_name(name, variant))
    }

    /// Snapshot of [`NOOP_SPAN`], whose `min` is the overhead estimate.
    pub fn overhead_values(&self) -> SpanValues {
        self.values(NOOP_SPAN)
    }

    /// Overhead estimate in nanoseconds, `None` until [`NOOP_SPAN`] has been sampled.
    pub fn overhead_estimate(&self) -> Option<i64> {
        let values = self.overhead_values();
        values.pair_ever_completed.then_some(values.min)
    }

    //=================
    // Overhead, benchmarks, reports

    /// Samples [`NOOP_SPAN`] back-to-back on the calling thread, `n` times or the configured
    /// `self_sample_count` when `n` is `None`.
    pub fn measure_self_sample(&self, n: Option<usize>) {
        let n = n.unwrap_or(self.inner.self_sample_count);
        self_sample(n, |completion| self.send_end(completion));
    }

    /// Runs the benchmark suite on the actor and blocks until it is done.
    pub fn run_benchmarks(&self) -> Result<(), RequestError> {
        if self.is_stopped() {
            return Err(RequestError::Stopped);
        }
        let (done, rx) = bounded(1);
        self.inner
            .outer_tx
            .send(Msg::RunBenchmarks { done })
            .map_err(|_| RequestError::Stopped)?;
        rx.recv().map_err(|_| RequestError::Stopped)
    }

    /// Writes a report, with `params` as context lines, and blocks until it is written.
    pub fn generate_report<S: AsRef<str>>(&self, params: &[S]) -> Result<(), ReportError> {
        if self.is_stopped() {
            return Err(ReportError::Stopped);
        }
        let settings = self.report_settings();
        let params = params.iter().map(|p| p.as_ref().to_owned()).collect();
        let (done, rx) = bounded(1);
        self.inner
            .outer_tx
            .send(Msg::GenerateReport {
                settings,
                params,
                done,
            })
            .map_err(|_| ReportError::Stopped)?;
        rx.recv().map_err(|_| ReportError::Stopped)?
    }

    fn report_settings(&self) -> ReportSettings {
        match self.inner.report.lock() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update_report_settings(&self, f: impl FnOnce(&mut ReportSettings)) {
        match self.inner.report.lock() {
            Ok(mut settings) => f(&mut settings),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Sets the destination of subsequent reports.
    pub fn set_report_path(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.update_report_settings(|s| s.path = path);
    }

    /// Sets whether subsequent reports render the built-in spans.
    pub fn set_report_builtins(&self, report_builtins: bool) {
        self.update_report_settings(|s| s.include_builtins = report_builtins);
    }

    /// Sets whether subsequent reports subtract the overhead estimate.
    pub fn set_subtract_overhead(&self, subtract_overhead: bool) {
        self.update_report_settings(|s| s.subtract_overhead = subtract_overhead);
    }

    //=================
    // Lifecycle

    /// Asks the actor to stop after the messages queued ahead of the request.
    ///
    /// Returns `true` if this call stopped a running engine, `false` if it was already stopped.
    pub fn shutdown(&self) -> bool {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return false;
        }
        let sent = self.inner.outer_tx.send(Msg::Shutdown).is_ok();
        log::debug!("shutdown sent: {sent}");
        sent
    }

    /// Whether [`Self::shutdown`] has been called on this engine.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    //=================
    // Async

    /// [`Self::values`] for async callers, run on tokio's blocking pool.
    pub async fn values_async(&self, name: &str) -> SpanValues {
        let learner = self.clone();
        let name = name.to_owned();
        let fallback = SpanValues::not_found(&name);
        tokio::task::spawn_blocking(move || learner.values(&name))
            .await
            .unwrap_or(fallback)
    }

    /// [`Self::run_benchmarks`] for async callers, run on tokio's blocking pool.
    pub async fn run_benchmarks_async(&self) -> Result<(), RequestError> {
        let learner = self.clone();
        tokio::task::spawn_blocking(move || learner.run_benchmarks())
            .await
            .unwrap_or(Err(RequestError::Stopped))
    }

    /// [`Self::generate_report`] for async callers, run on tokio's blocking pool.
    pub async fn generate_report_async(&self, params: Vec<String>) -> Result<(), ReportError> {
        let learner = self.clone();
        tokio::task::spawn_blocking(move || learner.generate_report(&params))
            .await
            .unwrap_or(Err(ReportError::Stopped))
    }
}
