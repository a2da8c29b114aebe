//! Flat key/value data references for the typesetting pipeline.
//!
//! Every value becomes one `\drefset[unit=U]{/path/key}{value}` statement.
//! The file is appended to so several plot runs can share it.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::analysis::Analysis;
use crate::error::{Error, Result};
use crate::relative::RelativeReport;

/// Physical unit attached to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Memory in mebibytes.
    Mebibyte,
    /// Time in seconds.
    Second,
    /// Dimensionless ratio.
    Times,
}

impl Unit {
    fn macro_name(self) -> &'static str {
        match self {
            Self::Mebibyte => "\\mebi\\byte",
            Self::Second => "\\second",
            Self::Times => "\\times",
        }
    }
}

/// One data-reference statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Slash-separated key.
    pub key: String,
    /// Optional unit.
    pub unit: Option<Unit>,
    /// Formatted value.
    pub value: String,
}

impl Entry {
    fn new(key: String, unit: Option<Unit>, value: String) -> Self {
        Self { key, unit, value }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(
                f,
                "\\drefset[unit={}]{{{}}}{{{}}}",
                unit.macro_name(),
                self.key,
                self.value
            ),
            None => write!(f, "\\drefset{{{}}}{{{}}}", self.key, self.value),
        }
    }
}

/// Turn a runtime display name into a key segment.
///
/// TeX macro syntax and slashes are dropped and the result is lower-cased,
/// so `\libgomp{}` becomes `libgomp`.
pub fn key_segment(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\\' | '{' | '}' | '/'))
        .collect::<String>()
        .to_lowercase()
}

/// Key segment for a runtime, preferring a configured alias over the name.
pub fn runtime_key(name: &str, aliases: &BTreeMap<String, String>) -> String {
    key_segment(aliases.get(name).map_or(name, String::as_str))
}

/// Build all statements for a relative report, in output order.
pub fn entries(
    analysis: &Analysis,
    report: &RelativeReport,
    aliases: &BTreeMap<String, String>,
) -> Vec<Entry> {
    let mut out = vec![Entry::new(
        "/meta/maxruns".into(),
        None,
        report.max_runs.to_string(),
    )];
    let reference = runtime_key(&report.reference, aliases);

    for runtime in &analysis.runtimes {
        let rt = runtime_key(&runtime.name, aliases);

        for peak in report.peaks_for(&runtime.name) {
            let b = &peak.benchmark;
            out.push(Entry::new(
                format!("/mem/rss/{rt}/{b}"),
                Some(Unit::Mebibyte),
                format!("{:.0}", peak.rss_mib),
            ));
            out.push(Entry::new(
                format!("/mem/maxrss/{rt}/{b}"),
                Some(Unit::Mebibyte),
                format!("{:.0}", peak.maxrss_mib),
            ));
            out.push(Entry::new(
                format!("/perf/abs/time/mean/{rt}/{b}"),
                Some(Unit::Second),
                format!("{:.3}", peak.time_mean),
            ));
            out.push(Entry::new(
                format!("/perf/abs/time/stdev/{rt}/{b}"),
                Some(Unit::Second),
                format!("{:.3}", peak.time_stdev),
            ));
            out.push(Entry::new(
                format!("/perf/abs/speedup/mean/{rt}/{b}"),
                None,
                format!("{:.3}", peak.speedup.mean),
            ));
            out.push(Entry::new(
                format!("/perf/abs/speedup/stdev/{rt}/{b}"),
                None,
                format!("{:.3}", peak.speedup.stdev),
            ));
        }

        let Some(summary) = report.summary_for(&runtime.name) else {
            continue;
        };
        let prefix = format!("/perf/rel/{reference} {rt}");
        let ratio = |suffix: &str, value: f64| {
            Entry::new(format!("{prefix}/{suffix}"), Some(Unit::Times), format!("{value:.2}"))
        };

        out.push(ratio("max", summary.all.best.ratio));
        out.push(ratio("min", summary.all.worst.ratio));
        if let Some(without) = &summary.without {
            out.push(ratio("max wo", without.best.ratio));
            out.push(ratio("min wo", without.worst.ratio));
        }
        out.push(ratio("avg", summary.all.average));
        if let Some(without) = &summary.without {
            out.push(ratio("avg wo", without.average));
        }

        for r in &summary.ratios {
            out.push(ratio(&r.benchmark, r.ratio));
        }
    }

    out
}

/// Render every statement, one per line.
pub fn render(
    analysis: &Analysis,
    report: &RelativeReport,
    aliases: &BTreeMap<String, String>,
) -> String {
    let mut text = String::new();
    for entry in entries(analysis, report, aliases) {
        text.push_str(&entry.to_string());
        text.push('\n');
    }
    text
}

/// Append the rendered statements to `path`, creating it if needed.
pub fn append(
    path: &Path,
    analysis: &Analysis,
    report: &RelativeReport,
    aliases: &BTreeMap<String, String>,
) -> Result<()> {
    let context = || format!("appending data references to {}", path.display());
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(context(), e))?;
    file.write_all(render(analysis, report, aliases).as_bytes())
        .map_err(|e| Error::io(context(), e))?;
    Ok(())
}
