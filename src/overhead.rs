//! Self-calibration of the engine's per-measurement cost.
//!
//! [`NOOP_SPAN`] is sampled back-to-back, with nothing between start and end. The smallest
//! observed duration is taken as the estimate: larger samples are assumed to include host
//! noise rather than measurement cost.

use crate::{
    registry::{Registry, NOOP_SPAN},
    sample::{Completion, SpanSample},
};
use std::time::Duration;

/// Takes `n` back-to-back samples of [`NOOP_SPAN`], handing each completion to `record`.
/// Runs synchronously on the calling context.
pub(crate) fn self_sample(n: usize, mut record: impl FnMut(Completion)) {
    log::debug!("taking {n} overhead self-samples");
    for _ in 0..n {
        let sample = SpanSample::new(NOOP_SPAN, None);
        record(sample.complete(None));
    }
}

/// Minimum observed [`NOOP_SPAN`] duration, `None` if it was never sampled.
pub(crate) fn overhead_estimate(registry: &Registry) -> Option<Duration> {
    registry.get(NOOP_SPAN).and_then(|record| record.min())
}
