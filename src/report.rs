//! Rendering of the latency report file.

use crate::{
    overhead::overhead_estimate,
    registry::{is_builtin, Registry, NOOP_SPAN},
    span_record::{nanos, SpanRecord},
};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    time::Duration,
};

/// Report settings captured when a report is requested.
#[derive(Debug, Clone)]
pub(crate) struct ReportSettings {
    pub(crate) path: PathBuf,
    pub(crate) include_builtins: bool,
    pub(crate) subtract_overhead: bool,
}

/// Everything the renderer reads, borrowed from the actor.
pub(crate) struct ReportInput<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) since_init: Duration,
    pub(crate) settings: &'a ReportSettings,
    pub(crate) host_facts: &'a [(String, String)],
    pub(crate) params: &'a [String],
}

const NO_DATA_NS: &str = "???,???,???,???";
const NO_DATA_WEIGHT: &str = "???,???,???";
const NO_DATA_FRAC: &str = "????????";
const PARAMS_PER_LINE: usize = 4;

/// Creates (or truncates) the report file and writes the report into it.
pub(crate) fn write_report(input: &ReportInput) -> io::Result<()> {
    let file = File::create(&input.settings.path)?;
    let mut w = BufWriter::new(file);
    render(&mut w, input)?;
    w.flush()
}

/// Writes the full report text to `w`.
pub(crate) fn render(w: &mut impl Write, input: &ReportInput) -> io::Result<()> {
    let ReportInput {
        registry,
        since_init,
        settings,
        host_facts,
        params,
    } = input;

    writeln!(w, "Latency Report\n")?;
    writeln!(w, "subtract_overhead: {}", settings.subtract_overhead)?;
    if settings.subtract_overhead {
        writeln!(w, "metric treated as overhead: {NOOP_SPAN}, min")?;
    }
    writeln!(
        w,
        "since init: {} ns\n",
        group_digits(nanos(*since_init), ',')
    )?;

    for (key, value) in host_facts.iter() {
        writeln!(w, "{key:<15}: {value}")?;
    }
    writeln!(w)?;

    for (i, param) in params.iter().enumerate() {
        if i == 0 {
            write!(w, "{param}")?;
        } else if i % PARAMS_PER_LINE == 0 {
            write!(w, "\n{param}")?;
        } else {
            write!(w, ", {param}")?;
        }
    }
    if !params.is_empty() {
        writeln!(w)?;
    }
    writeln!(w)?;

    let name_width = registry
        .tracked()
        .iter()
        .map(|name| name.len())
        .max()
        .unwrap_or(0)
        .max("span".len());

    writeln!(
        w,
        "{:<name_width$}: {:>15} | {:>15} | {:>15} | {:>15} | {:>13} | {:>11} | span",
        "span", "min (ns)", "last (ns)", "max (ns)", "mean (ns)", "weight", "time frac"
    )?;

    let overhead = match settings.subtract_overhead {
        true => overhead_estimate(registry).map(nanos),
        false => None,
    };

    for record in registry.iter() {
        if !settings.include_builtins && is_builtin(record.name()) {
            continue;
        }
        writeln!(w, "{}", row(record, name_width, *since_init, overhead))?;
    }

    Ok(())
}

/// One report line. `overhead`, when present, is subtracted from min, last and mean,
/// floored at zero; the [`NOOP_SPAN`] min is always shown raw.
fn row(record: &SpanRecord, name_width: usize, since_init: Duration, overhead: Option<i64>) -> String {
    let name = record.name();

    let (Some(min), Some(max), Some(mean)) = (record.min(), record.max(), record.mean_nanos())
    else {
        return format!(
            "{name:<name_width$}: {NO_DATA_NS:>15} | {NO_DATA_NS:>15} | {NO_DATA_NS:>15} | {NO_DATA_NS:>15} | w {NO_DATA_WEIGHT:>11} | tf {NO_DATA_FRAC:>8} | {name}"
        );
    };
    let (min, last, max) = (nanos(min), nanos(record.last()), nanos(max));

    let comp = |v: i64| match overhead {
        Some(o) => (v - o).max(0),
        None => v,
    };
    let min = if name == NOOP_SPAN { min } else { comp(min) };
    let last = comp(last);
    let mean = comp(mean);

    let time_frac = nanos(record.cumulative()) as f64 / nanos(since_init).max(1) as f64;

    format!(
        "{name:<name_width$}: {:>15} | {:>15} | {:>15} | {:>15} | w {:>11} | tf {:>8.6} | {name}",
        group_digits(min, ','),
        group_digits(last, ','),
        group_digits(max, ','),
        group_digits(mean, ','),
        group_digits(record.weight() as i64, ','),
        time_frac,
    )
}

/// Formats `val` with `sep` between groups of three digits, e.g. `1222333` as `1,222,333`.
pub(crate) fn group_digits(val: i64, sep: char) -> String {
    let digits = val.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if val < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}
