//! Sample tokens carried across the start/end boundary of a measured span.

use crate::LatencyLearner;
use std::time::{Duration, Instant};

//=================
// SpanSample

/// Token created when a span starts. It holds no reference into the engine's state,
/// only the span identity and its timestamps.
///
/// Ending a sample consumes it, so the same sample can never be folded twice.
/// Dropping a sample without ending it abandons the measurement; the engine never
/// hears about it.
#[derive(Debug)]
pub struct SpanSample {
    name: String,
    variant: Option<String>,
    t1: Instant,
    t2: Option<Instant>,
}

impl SpanSample {
    pub(crate) fn new(name: impl Into<String>, variant: Option<String>) -> Self {
        Self {
            name: name.into(),
            variant: variant.filter(|v| !v.is_empty()),
            t1: Instant::now(),
            t2: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Start time.
    pub fn t1(&self) -> Instant {
        self.t1
    }

    /// End time, if it has been fixed in advance with [`Self::set_t2`].
    pub fn t2(&self) -> Option<Instant> {
        self.t2
    }

    /// Fixes the end time so that ending the sample does not read the clock.
    /// Meant for deterministic tests.
    pub fn set_t2(&mut self, t2: Instant) {
        self.t2 = Some(t2);
    }

    /// Same as [`Self::set_t2`] with `t1 + dur`. If `t1 + dur` is not a representable
    /// instant the end time is left as it was.
    pub fn with_duration(mut self, dur: Duration) -> Self {
        if let Some(t2) = self.t1.checked_add(dur) {
            self.t2 = Some(t2);
        }
        self
    }

    /// Stamps the end time (unless fixed earlier) and turns the sample into the
    /// payload of an end message. `outcome`, when given, replaces the variant.
    pub(crate) fn complete(self, outcome: Option<&str>) -> Completion {
        let t2 = self.t2.unwrap_or_else(Instant::now);
        let variant = match outcome {
            Some(outcome) if !outcome.is_empty() => Some(outcome.to_owned()),
            Some(_) => None,
            None => self.variant,
        };
        Completion {
            name: self.name,
            variant,
            t1: self.t1,
            t2,
        }
    }
}

//=================
// Completion

/// A finished sample on its way to the actor.
#[derive(Debug)]
pub(crate) struct Completion {
    pub(crate) name: String,
    pub(crate) variant: Option<String>,
    pub(crate) t1: Instant,
    pub(crate) t2: Instant,
}

impl Completion {
    pub(crate) fn duration(&self) -> Duration {
        self.t2.saturating_duration_since(self.t1)
    }
}

//=================
// SpanGuard

/// Scoped form of [`SpanSample`]: the span is ended when the guard is dropped,
/// including on early return and panic unwinding.
///
/// Calling [`Self::end_as`] first records the sample under an alternate outcome
/// instead, and the drop then does nothing.
#[must_use = "the span ends as soon as the guard is dropped"]
pub struct SpanGuard {
    learner: LatencyLearner,
    sample: Option<SpanSample>,
}

impl SpanGuard {
    pub(crate) fn new(learner: LatencyLearner, sample: SpanSample) -> Self {
        Self {
            learner,
            sample: Some(sample),
        }
    }

    /// Ends the span with the default outcome.
    pub fn end(mut self) {
        if let Some(sample) = self.sample.take() {
            self.learner.end(sample);
        }
    }

    /// Ends the span under the `outcome` variant of its base name, e.g. `"earlyreturn"`
    /// records into `name(earlyreturn)` and `name`.
    pub fn end_as(mut self, outcome: &str) {
        if let Some(sample) = self.sample.take() {
            self.learner.end_as(sample, outcome);
        }
    }

    /// Drops the span without recording anything.
    pub fn abandon(mut self) {
        self.sample.take();
    }

    /// Access to the underlying sample, e.g. to fix its end time.
    pub fn sample_mut(&mut self) -> Option<&mut SpanSample> {
        self.sample.as_mut()
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let Some(sample) = self.sample.take() {
            self.learner.end(sample);
        }
    }
}
