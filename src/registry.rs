//! Ordered collection of tracked spans and their records.

use crate::span_record::{SpanRecord, SpanValues};
use std::{collections::HashMap, time::Duration};

//=================
// Built-in span names

/// Prefix reserved for the engine's own spans.
pub const BUILTIN_PREFIX: &str = "LL.";

/// Span sampled back-to-back to estimate the measurement overhead.
pub const NOOP_SPAN: &str = "LL.no-op";

/// Span timing a whole [`run_benchmarks`](crate::LatencyLearner::run_benchmarks) call.
pub const BENCHMARKS_TOTAL_SPAN: &str = "LL.benchmarks-total";

/// Span timing report generation.
pub const REPORT_SPAN: &str = "LL.lat-report";

/// Span timing a lookup in the engine's own record map.
pub const SPAN_MAP_LOOKUP_SPAN: &str = "LL.span-map-lookup";

/// Built-in spans, registered after the declared ones in this order.
pub(crate) const BUILTIN_SPANS: [&str; 18] = [
    NOOP_SPAN,
    "LL.fn-call-return",
    "LL.for-iters(n=1000)",
    "LL.accum-ints(n=1000)",
    "LL.add-int-literals(n=2)",
    "LL.add-str-literals(n=2)",
    "LL.map-str-int-set",
    "LL.map-str-int-get(k=100,key0)",
    "LL.map-str-int-get(k=100,key49)",
    "LL.map-str-int-get(k=100,key99)",
    SPAN_MAP_LOOKUP_SPAN,
    "LL.sort-strs(n=10)",
    "LL.log-hellos(n=10)",
    "LL.byte-array-make(n=1)",
    "LL.byte-array-make(n=1k)",
    "LL.byte-array-make(n=100k)",
    BENCHMARKS_TOTAL_SPAN,
    REPORT_SPAN,
];

/// Returns `true` if `name` lies in the reserved built-in namespace.
pub fn is_builtin(name: &str) -> bool {
    name.starts_with(BUILTIN_PREFIX)
}

/// Composite key of a variant span, e.g. `"parse(n=200)"`.
pub fn variant_name(name: &str, variant: &str) -> String {
    format!("{name}({variant})")
}

//=================
// Registry

/// Tracked span names in report order plus the name-to-record map.
///
/// `tracked` and the keys of `records` always hold the same set of names.
#[derive(Debug)]
pub(crate) struct Registry {
    tracked: Vec<String>,
    records: HashMap<String, SpanRecord>,
}

impl Registry {
    /// Registers the `declared` names, in order, followed by the built-in spans.
    pub(crate) fn new<S: AsRef<str>>(declared: &[S]) -> Self {
        let mut registry = Self {
            tracked: Vec::new(),
            records: HashMap::new(),
        };
        let names = declared
            .iter()
            .map(|s| s.as_ref())
            .chain(BUILTIN_SPANS.iter().copied());
        for name in names {
            registry.ensure(name, None);
        }
        registry
    }

    /// Returns the record for `name`, appending it to the tracked list if unseen.
    fn ensure(&mut self, name: &str, parent: Option<&str>) -> &mut SpanRecord {
        let tracked = &mut self.tracked;
        let record = self.records.entry(name.to_owned()).or_insert_with(|| {
            log::trace!("registering span {name:?}");
            tracked.push(name.to_owned());
            match parent {
                Some(parent) => SpanRecord::new_variant(name, parent),
                None => SpanRecord::new(name),
            }
        });
        if let Some(parent) = parent {
            record.set_parent(parent);
        }
        record
    }

    /// Folds `dur` into `name`, and also into `name(variant)` when a variant is given.
    /// Unseen names are registered on the spot, parent before variant.
    pub(crate) fn complete(&mut self, name: &str, variant: Option<&str>, dur: Duration) {
        self.ensure(name, None).fold(dur);
        if let Some(variant) = variant {
            let key = variant_name(name, variant);
            self.ensure(&key, Some(name)).fold(dur);
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&SpanRecord> {
        self.records.get(name)
    }

    pub(crate) fn values(&self, name: &str) -> SpanValues {
        match self.records.get(name) {
            Some(record) => record.values(),
            None => SpanValues::not_found(name),
        }
    }

    /// Tracked names in report order.
    pub(crate) fn tracked(&self) -> &[String] {
        &self.tracked
    }

    /// Records in report order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &SpanRecord> {
        self.tracked.iter().filter_map(|name| self.records.get(name))
    }
}
