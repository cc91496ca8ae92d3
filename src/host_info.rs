//! Host facts written into the report header.

use std::{env, process, sync::Arc, thread};

/// Provider of `(key, value)` facts about the host, called once per report.
pub type HostInfoProvider = Arc<dyn Fn() -> Vec<(String, String)> + Send + Sync + 'static>;

/// Default host facts: platform constants, available parallelism, process id, and a few
/// terminal-related environment variables.
pub fn default_host_info() -> Vec<(String, String)> {
    let parallelism = thread::available_parallelism()
        .map(|n| n.get().to_string())
        .unwrap_or_else(|_| "?".to_owned());

    let mut facts = vec![
        ("os".to_owned(), env::consts::OS.to_owned()),
        ("os family".to_owned(), env::consts::FAMILY.to_owned()),
        ("arch".to_owned(), env::consts::ARCH.to_owned()),
        ("parallelism".to_owned(), parallelism),
        ("pid".to_owned(), process::id().to_string()),
    ];

    for key in ["LINES", "COLUMNS", "HOST", "TERM"] {
        let value = env::var(key).unwrap_or_else(|_| "?".to_owned());
        facts.push((key.to_owned(), value));
    }

    facts
}

/// Provider that reports no host facts.
pub fn no_host_info() -> Vec<(String, String)> {
    Vec::new()
}
