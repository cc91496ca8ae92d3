//! Per-span latency accumulator and the immutable snapshot handed out to callers.

use std::time::Duration;

//=================
// SpanRecord

/// Accumulated latency statistics for one span name.
///
/// Only the actor ever holds a `SpanRecord`; callers see [`SpanValues`] snapshots.
#[derive(Debug, Clone)]
pub(crate) struct SpanRecord {
    name: String,
    parent: Option<String>,
    last: Duration,
    cumulative: Duration,
    weight: u64,
    min: Duration,
    max: Duration,
    pair_ever_completed: bool,
}

impl SpanRecord {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            last: Duration::ZERO,
            cumulative: Duration::ZERO,
            weight: 0,
            min: Duration::ZERO,
            max: Duration::ZERO,
            pair_ever_completed: false,
        }
    }

    /// Record of a variant span, whose samples are also folded into `parent`.
    pub(crate) fn new_variant(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Self::new(name)
        }
    }

    /// Folds one completed sample into the aggregates.
    pub(crate) fn fold(&mut self, dur: Duration) {
        self.last = dur;
        self.cumulative += dur;
        self.weight += 1;

        if self.pair_ever_completed {
            self.min = self.min.min(dur);
            self.max = self.max.max(dur);
        } else {
            self.min = dur;
            self.max = dur;
        }

        self.pair_ever_completed = true;
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_parent(&mut self, parent: &str) {
        if self.parent.is_none() {
            self.parent = Some(parent.to_owned());
        }
    }

    pub(crate) fn weight(&self) -> u64 {
        self.weight
    }

    pub(crate) fn last(&self) -> Duration {
        self.last
    }

    pub(crate) fn cumulative(&self) -> Duration {
        self.cumulative
    }

    /// Smallest completed sample, `None` before the first completion.
    pub(crate) fn min(&self) -> Option<Duration> {
        self.pair_ever_completed.then_some(self.min)
    }

    /// Largest completed sample, `None` before the first completion.
    pub(crate) fn max(&self) -> Option<Duration> {
        self.pair_ever_completed.then_some(self.max)
    }

    /// Integer mean in nanoseconds, `None` before the first completion.
    pub(crate) fn mean_nanos(&self) -> Option<i64> {
        if self.weight == 0 {
            return None;
        }
        Some(nanos(self.cumulative) / self.weight as i64)
    }

    pub(crate) fn values(&self) -> SpanValues {
        if !self.pair_ever_completed {
            return SpanValues {
                found: true,
                parent: self.parent.clone(),
                ..SpanValues::not_found(&self.name)
            };
        }

        SpanValues {
            name: self.name.clone(),
            found: true,
            parent: self.parent.clone(),
            pair_ever_completed: true,
            min: nanos(self.min),
            last: nanos(self.last),
            max: nanos(self.max),
            mean: self.mean_nanos().unwrap_or(NO_VALUE),
            cumulative: nanos(self.cumulative),
            weight: self.weight as i64,
        }
    }
}

/// Converts a duration to signed nanoseconds, saturating at `i64::MAX`.
pub(crate) fn nanos(dur: Duration) -> i64 {
    i64::try_from(dur.as_nanos()).unwrap_or(i64::MAX)
}

//=================
// SpanValues

/// Sentinel used in [`SpanValues`] numeric fields when there is no data.
pub const NO_VALUE: i64 = -1;

/// Immutable snapshot of a span's statistics, as returned by
/// [`LatencyLearner::values`](crate::LatencyLearner::values).
///
/// All durations are in **nanoseconds**. When `pair_ever_completed` is `false`
/// every numeric field holds [`NO_VALUE`]. `found` is `false` only when the name has
/// never been declared nor completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanValues {
    pub name: String,
    pub found: bool,
    pub parent: Option<String>,
    pub pair_ever_completed: bool,
    pub min: i64,
    pub last: i64,
    pub max: i64,
    pub mean: i64,
    pub cumulative: i64,
    pub weight: i64,
}

impl SpanValues {
    /// Snapshot returned for a name the engine has never seen.
    pub fn not_found(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            found: false,
            parent: None,
            pair_ever_completed: false,
            min: NO_VALUE,
            last: NO_VALUE,
            max: NO_VALUE,
            mean: NO_VALUE,
            cumulative: NO_VALUE,
            weight: NO_VALUE,
        }
    }
}
