//! In-process latency learning for named spans of code.
//!
//! Callers mark the start and end of named spans; a single actor thread owns all span
//! statistics (min, max, last, cumulative, sample count) and folds completions into them in
//! the order it receives them, so any number of threads can measure concurrently without
//! locks around the statistics. Reports are written to a file on demand.
//!
//! Latencies are collected in **nanoseconds**.
//!
//! ```no_run
//! use latency_learner::{LatencyLearner, LatencyLearnerCfg};
//!
//! let ll = LatencyLearner::new(LatencyLearnerCfg::default(), &["parse", "render"]);
//!
//! let sample = ll.start("parse");
//! // ... work ...
//! ll.end(sample);
//!
//! {
//!     let _guard = ll.enter_variant("render", "n=200");
//!     // ... work, ended when the guard drops ...
//! }
//!
//! ll.generate_report(&["ver=1.2", "N=200"]).expect("report written");
//! ll.shutdown();
//! ```
#![deny(clippy::unwrap_used)]

mod actor;
mod error;
mod overhead;
mod report;
mod sample;
mod span_record;

mod benchmarks;
pub use benchmarks::*;

mod host_info;
pub use host_info::*;

mod ll_cfg;
pub use ll_cfg::*;

mod learner;
pub use learner::*;

mod layer;
pub use layer::*;

mod registry;
pub use registry::{
    is_builtin, variant_name, BENCHMARKS_TOTAL_SPAN, BUILTIN_PREFIX, NOOP_SPAN, REPORT_SPAN,
    SPAN_MAP_LOOKUP_SPAN,
};

pub mod global;

pub use error::{ReportError, RequestError};
pub use sample::{SpanGuard, SpanSample};
pub use span_record::{SpanValues, NO_VALUE};
