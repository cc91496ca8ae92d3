//! Built-in benchmark task bodies, timed on the actor to give reference points for the
//! application's own span metrics.

use std::{collections::HashMap, hint::black_box, sync::Arc, time::Instant};

//=================
// Stopwatch

/// Lets a benchmark body time only part of its work, excluding per-iteration setup.
///
/// If the body never calls [`Self::time`], the whole body is timed.
#[derive(Debug, Default)]
pub struct Stopwatch {
    window: Option<(Instant, Instant)>,
}

impl Stopwatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Runs `f`, timing it as the measured part of the current iteration.
    pub fn time<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let t1 = Instant::now();
        let res = f();
        let t2 = Instant::now();
        self.window = Some((t1, t2));
        res
    }

    pub(crate) fn take_window(&mut self) -> Option<(Instant, Instant)> {
        self.window.take()
    }
}

//=================
// Benchmark

/// A named task body timed repeatedly by [`LatencyLearner::run_benchmarks`](crate::LatencyLearner::run_benchmarks).
pub struct Benchmark {
    pub(crate) name: String,
    pub(crate) iterations: Option<usize>,
    pub(crate) body: Box<dyn FnMut(&mut Stopwatch) + Send>,
}

impl Benchmark {
    /// The body runs [`LatencyLearnerCfg::benchmark_iterations`](crate::LatencyLearnerCfg) times.
    pub fn new(name: impl Into<String>, body: impl FnMut(&mut Stopwatch) + Send + 'static) -> Self {
        Self {
            name: name.into(),
            iterations: None,
            body: Box::new(body),
        }
    }

    /// Overrides the configured iteration count for this benchmark.
    pub fn with_iterations(self, iterations: usize) -> Self {
        Self {
            iterations: Some(iterations),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Provider of the benchmark suite, called once per benchmark run.
pub type BenchmarkProvider = Arc<dyn Fn() -> Vec<Benchmark> + Send + Sync + 'static>;

#[inline(never)]
fn noop_fn() {}

/// The default suite. Each body records under a name in the built-in namespace.
pub fn default_benchmarks() -> Vec<Benchmark> {
    let keys: Vec<String> = (0..100).map(|k| format!("key{k}")).collect();
    let strs = [
        "Zelda", "Hoth", "Abro", "Daneel", "Tempest", "Cthulhu", "Bonk", "Arky", "Ys", "Jude Law",
    ];

    let map_get = |key_idx: usize| {
        let keys = keys.clone();
        move |sw: &mut Stopwatch| {
            let m: HashMap<&str, i32> = keys.iter().map(|k| (k.as_str(), 5)).collect();
            let key = keys[key_idx].as_str();
            sw.time(|| black_box(m.get(key)));
        }
    };

    vec![
        Benchmark::new("LL.fn-call-return", |_| noop_fn()),
        Benchmark::new("LL.for-iters(n=1000)", |_| {
            for j in 0..1000 {
                black_box(j);
            }
        }),
        Benchmark::new("LL.accum-ints(n=1000)", |_| {
            let mut v = 0u64;
            for j in 0..1000 {
                v += black_box(j);
            }
            black_box(v);
        }),
        Benchmark::new("LL.add-int-literals(n=2)", |_| {
            black_box(black_box(1) + black_box(2));
        }),
        Benchmark::new("LL.add-str-literals(n=2)", |_| {
            black_box(String::from(black_box("a")) + black_box("b"));
        }),
        Benchmark::new("LL.map-str-int-set", |sw| {
            let mut m: HashMap<&str, i32> = HashMap::new();
            sw.time(|| m.insert("foo", 5));
            black_box(m);
        }),
        Benchmark::new("LL.map-str-int-get(k=100,key0)", map_get(0)),
        Benchmark::new("LL.map-str-int-get(k=100,key49)", map_get(49)),
        Benchmark::new("LL.map-str-int-get(k=100,key99)", map_get(99)),
        Benchmark::new("LL.sort-strs(n=10)", move |sw| {
            let mut strs2 = strs.to_vec();
            sw.time(|| strs2.sort_unstable());
            black_box(strs2);
        }),
        Benchmark::new("LL.log-hellos(n=10)", |_| {
            for _ in 0..10 {
                log::info!("latency_learner benchmarks: log measure test");
            }
        })
        .with_iterations(1),
        Benchmark::new("LL.byte-array-make(n=1)", |_| {
            black_box(vec![0u8; 1]);
        }),
        Benchmark::new("LL.byte-array-make(n=1k)", |_| {
            black_box(vec![0u8; 1000]);
        }),
        Benchmark::new("LL.byte-array-make(n=100k)", |_| {
            black_box(vec![0u8; 100_000]);
        }),
    ]
}
