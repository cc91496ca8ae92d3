//! The single-writer actor owning all span state.
//!
//! The actor drains two bounded queues: the outer one, fed by application callers, and the
//! inner one, fed by the actor itself while it runs benchmarks or times its own reports.
//! The inner queue is folded in-line while a benchmark or report request is being handled:
//! whenever it fills up, and always before the request is answered. The outer queue is
//! therefore the only one the main loop ever finds non-empty.
//!
//! Injected collaborators (benchmark bodies and providers, the host facts provider) run on
//! the actor thread. A panic in one of them is caught and logged so the span state survives.

use crate::{
    benchmarks::{BenchmarkProvider, Stopwatch},
    error::ReportError,
    host_info::HostInfoProvider,
    overhead::self_sample,
    registry::{Registry, BENCHMARKS_TOTAL_SPAN, NOOP_SPAN, REPORT_SPAN, SPAN_MAP_LOOKUP_SPAN},
    report::{write_report, ReportInput, ReportSettings},
    sample::{Completion, SpanSample},
    span_record::SpanValues,
};
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::{
    hint::black_box,
    panic::{self, AssertUnwindSafe},
    thread,
    time::Instant,
};

//=================
// Messages

pub(crate) enum Msg {
    /// Fold one completed sample. No reply.
    End(Completion),
    Query {
        name: String,
        reply: Sender<SpanValues>,
    },
    RunBenchmarks {
        done: Sender<()>,
    },
    GenerateReport {
        settings: ReportSettings,
        params: Vec<String>,
        done: Sender<Result<(), ReportError>>,
    },
    Shutdown,
}

//=================
// Actor

pub(crate) struct ActorCfg {
    pub(crate) inner_capacity: usize,
    pub(crate) self_sample_count: usize,
    pub(crate) benchmark_iterations: usize,
    pub(crate) benchmarks: BenchmarkProvider,
    pub(crate) host_info: HostInfoProvider,
}

pub(crate) struct Actor {
    registry: Registry,
    init_time: Instant,
    outer_rx: Receiver<Msg>,
    inner_tx: Sender<Msg>,
    inner_rx: Receiver<Msg>,
    cfg: ActorCfg,
}

impl Actor {
    /// The registry must be fully populated before the actor is spawned.
    pub(crate) fn new(
        registry: Registry,
        init_time: Instant,
        outer_rx: Receiver<Msg>,
        cfg: ActorCfg,
    ) -> Self {
        let (inner_tx, inner_rx) = bounded(cfg.inner_capacity.max(1));
        Self {
            registry,
            init_time,
            outer_rx,
            inner_tx,
            inner_rx,
            cfg,
        }
    }

    /// Starts the loop on its own thread. The thread exits on shutdown or once every
    /// application handle has been dropped, so it is never joined.
    pub(crate) fn spawn(self) {
        thread::Builder::new()
            .name("latency-learner".to_owned())
            .spawn(move || self.run())
            .expect("failed to spawn the latency-learner actor thread");
    }

    fn run(mut self) {
        log::debug!("actor loop started");
        loop {
            let msg = select! {
                recv(self.outer_rx) -> msg => msg,
                recv(self.inner_rx) -> msg => msg,
            };
            match msg {
                Ok(msg) => {
                    if !self.handle(msg) {
                        break;
                    }
                }
                Err(_) => {
                    log::debug!("all application handles dropped");
                    break;
                }
            }
        }

        // Queued requests are dropped with their reply senders, so waiting callers get an error.
        let dropped = self.outer_rx.try_iter().count();
        log::debug!("actor loop exited, {dropped} queued messages dropped");
    }

    /// Processes one message. Returns `false` when the loop must stop.
    fn handle(&mut self, msg: Msg) -> bool {
        match msg {
            Msg::End(completion) => self.complete(completion),

            Msg::Query { name, reply } => {
                log::trace!("query for {name:?}");
                _ = reply.send(self.registry.values(&name));
            }

            Msg::RunBenchmarks { done } => {
                self.run_benchmarks();
                self.drain_inner();
                _ = done.send(());
            }

            Msg::GenerateReport {
                settings,
                params,
                done,
            } => {
                let res = self.generate_report(&settings, &params);
                self.drain_inner();
                _ = done.send(res);
            }

            Msg::Shutdown => {
                log::debug!("shutdown requested");
                return false;
            }
        }
        true
    }

    fn complete(&mut self, completion: Completion) {
        let dur = completion.duration();
        self.registry
            .complete(&completion.name, completion.variant.as_deref(), dur);
    }

    /// Queues a sample produced by the actor itself on the inner queue. When that queue is
    /// full the actor drains it first, since nobody else will.
    fn record_internal(&mut self, completion: Completion) {
        let mut msg = Msg::End(completion);
        for _ in 0..2 {
            match self.inner_tx.try_send(msg) {
                Ok(()) => return,
                Err(TrySendError::Full(m)) | Err(TrySendError::Disconnected(m)) => {
                    msg = m;
                    self.drain_inner();
                }
            }
        }
        self.handle(msg);
    }

    fn drain_inner(&mut self) {
        while let Ok(msg) = self.inner_rx.try_recv() {
            self.handle(msg);
        }
    }

    fn run_benchmarks(&mut self) {
        log::debug!("running benchmarks");
        let total = SpanSample::new(BENCHMARKS_TOTAL_SPAN, None);

        self_sample(self.cfg.self_sample_count, |c| self.record_internal(c));

        let benchmarks = match panic::catch_unwind(AssertUnwindSafe(|| (self.cfg.benchmarks)())) {
            Ok(benchmarks) => benchmarks,
            Err(_) => {
                log::warn!("benchmark provider panicked, no benchmark bodies run");
                Vec::new()
            }
        };
        for mut bench in benchmarks {
            let iterations = bench.iterations.unwrap_or(self.cfg.benchmark_iterations);
            log::trace!("benchmark {:?} x {iterations}", bench.name);
            let mut sw = Stopwatch::new();
            for i in 0..iterations {
                let t1 = Instant::now();
                let run = panic::catch_unwind(AssertUnwindSafe(|| (bench.body)(&mut sw)));
                let t2 = Instant::now();
                if run.is_err() {
                    log::warn!(
                        "benchmark {:?} panicked in iteration {i}, remaining iterations skipped",
                        bench.name
                    );
                    break;
                }
                let (t1, t2) = sw.take_window().unwrap_or((t1, t2));
                self.record_internal(Completion {
                    name: bench.name.clone(),
                    variant: None,
                    t1,
                    t2,
                });
            }
        }

        for _ in 0..self.cfg.benchmark_iterations {
            let sample = SpanSample::new(SPAN_MAP_LOOKUP_SPAN, None);
            black_box(self.registry.get(NOOP_SPAN));
            self.record_internal(sample.complete(None));
        }

        self.record_internal(total.complete(None));
        log::debug!("benchmarks done");
    }

    /// Writes the report. On failure the report's own sample is abandoned.
    fn generate_report(
        &mut self,
        settings: &ReportSettings,
        params: &[String],
    ) -> Result<(), ReportError> {
        let sample = SpanSample::new(REPORT_SPAN, None);
        let host_facts = match panic::catch_unwind(AssertUnwindSafe(|| (self.cfg.host_info)())) {
            Ok(facts) => facts,
            Err(_) => {
                log::warn!("host info provider panicked, report written without host facts");
                Vec::new()
            }
        };
        let input = ReportInput {
            registry: &self.registry,
            since_init: self.init_time.elapsed(),
            settings,
            host_facts: &host_facts,
            params,
        };

        match write_report(&input) {
            Ok(()) => {
                log::debug!("report written to {:?}", settings.path);
                self.record_internal(sample.complete(None));
                Ok(())
            }
            Err(err) => {
                log::warn!("could not write report to {:?}: {err}", settings.path);
                Err(err.into())
            }
        }
    }
}
