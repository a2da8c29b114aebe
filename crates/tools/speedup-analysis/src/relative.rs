//! Relative performance between the reference runtime and the others.
//!
//! Each runtime's peak speedup is compared with the reference runtime's
//! speedup at a fixed series index: one less than the length of the
//! reference series of the first benchmark. The denominator is always the
//! other runtime's own last (highest core count) point, whether or not the
//! core counts line up.
//!
//! Missing entries never abort the report. They are collected as
//! [`DataGap`]s, logged, and the affected entry is skipped.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::analysis::{Analysis, BenchmarkData, RuntimeData};
use crate::speedup::SpeedupPoint;
use crate::stats;

/// What was missing for a skipped entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Missing {
    /// No samples at the peak core count.
    Cores(u32),
    /// The reference series is shorter than the fixed comparison index.
    SeriesIndex(usize),
    /// The runtime has no speedup points at all.
    Series,
    /// The reference runtime has no data for the first benchmark, so there
    /// is neither a peak core count nor a comparison index.
    EmptyReference,
}

/// A (runtime, benchmark) entry skipped for lack of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataGap {
    /// Runtime lacking the data.
    pub runtime: String,
    /// Benchmark lacking the data.
    pub benchmark: String,
    /// What is missing.
    pub missing: Missing,
}

impl fmt::Display for DataGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (runtime, benchmark) = (&self.runtime, &self.benchmark);
        match self.missing {
            Missing::Cores(cores) => {
                write!(f, "no data available for {runtime}/{benchmark}/{cores} cores")
            }
            Missing::SeriesIndex(index) => write!(
                f,
                "reference series for {benchmark} has no point #{index} to compare {runtime} against"
            ),
            Missing::Series => write!(f, "no speedup values for {runtime}/{benchmark}"),
            Missing::EmptyReference => write!(
                f,
                "reference runtime has no data for the first benchmark, skipping {runtime}/{benchmark}"
            ),
        }
    }
}

/// Absolute numbers of one runtime on one benchmark at the peak core count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakMetrics {
    /// Runtime name.
    pub runtime: String,
    /// Benchmark name.
    pub benchmark: String,
    /// Core count the memory and time numbers were taken at.
    pub cores: u32,
    /// Summed `rss` over all runs, divided by 1024.
    pub rss_mib: f64,
    /// `maxrss` of the highest-numbered run, divided by 1024.
    pub maxrss_mib: f64,
    /// Mean run time.
    pub time_mean: f64,
    /// Sample stdev of run times around the mean rounded to 3 places.
    pub time_stdev: f64,
    /// The runtime's last speedup point.
    pub speedup: SpeedupPoint,
}

impl PeakMetrics {
    fn measure(runtime: &str, data: &BenchmarkData, cores: u32) -> Option<Self> {
        let group = data.table.group(cores)?;
        let speedup = *data.series.last()?;

        let times = group.times();
        let time_mean = stats::mean(&times)?;
        let time_stdev = stats::stdev_around(&times, round_to(time_mean, 3)).unwrap_or(0.0);
        let rss: u64 = group.samples().iter().map(|s| s.rss).sum();

        Some(Self {
            runtime: runtime.to_string(),
            benchmark: data.benchmark.clone(),
            cores,
            rss_mib: rss as f64 / 1024.0,
            maxrss_mib: group.last_run().maxrss as f64 / 1024.0,
            time_mean,
            time_stdev,
            speedup,
        })
    }
}

/// Peak-speedup ratio for one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRatio {
    /// Benchmark name.
    pub benchmark: String,
    /// Reference speedup divided by the other runtime's speedup.
    pub ratio: f64,
}

/// Summary of a set of ratios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioView {
    /// Largest ratio (first benchmark attaining it).
    pub best: BenchmarkRatio,
    /// Smallest ratio (first benchmark attaining it).
    pub worst: BenchmarkRatio,
    /// Geometric mean of all ratios.
    pub average: f64,
}

impl RatioView {
    /// Summarize ratios; `None` if there are none.
    pub fn from_ratios<'a>(ratios: impl IntoIterator<Item = &'a BenchmarkRatio>) -> Option<Self> {
        let ratios: Vec<&BenchmarkRatio> = ratios.into_iter().collect();
        let (first, rest) = ratios.split_first()?;

        let mut best = *first;
        let mut worst = *first;
        for &ratio in rest {
            if ratio.ratio > best.ratio {
                best = ratio;
            }
            if ratio.ratio < worst.ratio {
                worst = ratio;
            }
        }

        let values: Vec<f64> = ratios.iter().map(|r| r.ratio).collect();
        let average = stats::geometric_mean(&values)?;

        Some(Self {
            best: best.clone(),
            worst: worst.clone(),
            average,
        })
    }
}

/// Reference runtime compared against one other runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeSummary {
    /// Reference runtime name.
    pub reference: String,
    /// Compared runtime name.
    pub runtime: String,
    /// Per-benchmark ratios in benchmark order (gaps omitted).
    pub ratios: Vec<BenchmarkRatio>,
    /// Summary over all ratios.
    pub all: RatioView,
    /// Summary without the excluded benchmark; `None` if nothing remains.
    pub without: Option<RatioView>,
    /// Benchmark left out of `without`.
    pub excluded: String,
}

impl RelativeSummary {
    /// Ratio for a benchmark.
    pub fn ratio(&self, benchmark: &str) -> Option<f64> {
        self.ratios
            .iter()
            .find(|r| r.benchmark == benchmark)
            .map(|r| r.ratio)
    }
}

/// Everything needed for the data-reference file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeReport {
    /// Reference runtime name.
    pub reference: String,
    /// Serial runs of the first benchmark.
    pub max_runs: usize,
    /// Highest core count of the reference runtime on the first benchmark.
    pub peak_cores: Option<u32>,
    /// Fixed index into the reference series used as ratio numerator.
    pub series_index: Option<usize>,
    /// Absolute numbers per runtime and benchmark, in configuration order.
    pub peaks: Vec<PeakMetrics>,
    /// One summary per non-reference runtime, in configuration order.
    pub summaries: Vec<RelativeSummary>,
    /// Entries skipped for lack of data.
    pub gaps: Vec<DataGap>,
}

impl RelativeReport {
    /// Compare every runtime against the first one.
    pub fn compute(analysis: &Analysis, excluded: &str) -> Self {
        let mut gaps = Vec::new();
        let mut record_gap = |runtime: &str, benchmark: &str, missing: Missing| {
            let gap = DataGap {
                runtime: runtime.to_string(),
                benchmark: benchmark.to_string(),
                missing,
            };
            warn!("{gap}");
            gaps.push(gap);
        };

        let reference = analysis.reference();
        let first_benchmark = analysis.benchmarks.first().map(String::as_str);
        let reference_first =
            reference.and_then(|r| first_benchmark.and_then(|b| r.benchmark(b)));

        let peak_cores = reference_first.and_then(|d| d.table.max_cores());
        let series_index = reference_first.and_then(|d| d.series.len().checked_sub(1));
        let max_runs = first_benchmark
            .and_then(|b| analysis.baseline(b))
            .map_or(0, |b| b.samples);

        let mut peaks = Vec::new();
        let mut summaries = Vec::new();

        for runtime in &analysis.runtimes {
            for data in &runtime.benchmarks {
                let metrics = peak_cores.and_then(|c| PeakMetrics::measure(&runtime.name, data, c));
                match (metrics, peak_cores) {
                    (Some(m), _) => peaks.push(m),
                    (None, Some(cores)) if data.table.group(cores).is_none() => {
                        record_gap(&runtime.name, &data.benchmark, Missing::Cores(cores));
                    }
                    (None, Some(_)) => record_gap(&runtime.name, &data.benchmark, Missing::Series),
                    (None, None) => {
                        record_gap(&runtime.name, &data.benchmark, Missing::EmptyReference);
                    }
                }
            }

            let Some(reference) = reference else { continue };
            if runtime.name == reference.name {
                continue;
            }

            let mut ratios = Vec::new();
            for data in &runtime.benchmarks {
                match peak_ratio(reference, data, series_index) {
                    Ok(ratio) => ratios.push(BenchmarkRatio {
                        benchmark: data.benchmark.clone(),
                        ratio,
                    }),
                    Err(missing) => record_gap(&runtime.name, &data.benchmark, missing),
                }
            }

            let Some(all) = RatioView::from_ratios(&ratios) else {
                warn!(runtime = %runtime.name, "ignoring runtime without comparable speedups");
                continue;
            };
            let without = RatioView::from_ratios(ratios.iter().filter(|r| r.benchmark != excluded));

            summaries.push(RelativeSummary {
                reference: reference.name.clone(),
                runtime: runtime.name.clone(),
                ratios,
                all,
                without,
                excluded: excluded.to_string(),
            });
        }

        Self {
            reference: reference.map(|r| r.name.clone()).unwrap_or_default(),
            max_runs,
            peak_cores,
            series_index,
            peaks,
            summaries,
            gaps,
        }
    }

    /// Absolute numbers of one runtime, in benchmark order.
    pub fn peaks_for<'a>(&'a self, runtime: &'a str) -> impl Iterator<Item = &'a PeakMetrics> + 'a {
        self.peaks.iter().filter(move |p| p.runtime == runtime)
    }

    /// Summary comparing the reference with `runtime`.
    pub fn summary_for(&self, runtime: &str) -> Option<&RelativeSummary> {
        self.summaries.iter().find(|s| s.runtime == runtime)
    }
}

/// Reference speedup at `index` over the runtime's last speedup point.
fn peak_ratio(
    reference: &RuntimeData,
    data: &BenchmarkData,
    index: Option<usize>,
) -> Result<f64, Missing> {
    let index = index.ok_or(Missing::EmptyReference)?;
    let numerator = reference
        .benchmark(&data.benchmark)
        .and_then(|d| d.series.get(index))
        .ok_or(Missing::SeriesIndex(index))?;
    let denominator = data.series.last().ok_or(Missing::Series)?;
    Ok(numerator.mean / denominator.mean)
}

/// Round to `places` decimals.
///
/// Rounds the exact binary value with ties to even, so `2.675` (stored
/// slightly below) gives `2.67`.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}
