//! Process-wide [`LatencyLearner`] with init-once semantics.

use crate::{LatencyLearner, LatencyLearnerCfg};
use once_cell::sync::OnceCell;

static LEARNER: OnceCell<LatencyLearner> = OnceCell::new();

/// Initializes the process-wide engine with the default configuration and returns it.
///
/// Only the first initialization in a process takes effect; later and concurrent calls
/// get the same engine and their `declared` spans are ignored.
pub fn init<S: AsRef<str>>(declared: &[S]) -> &'static LatencyLearner {
    init_with_cfg(LatencyLearnerCfg::default(), declared)
}

/// Same as [`init`] with the given configuration, which is also ignored after the first call.
pub fn init_with_cfg<S: AsRef<str>>(
    config: LatencyLearnerCfg,
    declared: &[S],
) -> &'static LatencyLearner {
    LEARNER.get_or_init(|| LatencyLearner::new(config, declared))
}

/// Returns the process-wide engine, initializing it with no declared spans on first use.
pub fn learner() -> &'static LatencyLearner {
    init(&[] as &[&str])
}

/// Returns the process-wide engine if it has been initialized.
pub fn try_learner() -> Option<&'static LatencyLearner> {
    LEARNER.get()
}
