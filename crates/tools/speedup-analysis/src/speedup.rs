//! Per-core-count speedup aggregation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::baseline::BaselineStats;
use crate::stats;
use crate::table::{SampleGroup, SampleTable};

/// Aggregated speedup of all runs at one core count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedupPoint {
    /// Core count of the runs.
    pub cores: u32,
    /// Geometric mean of the per-run speedups.
    pub mean: f64,
    /// Sample standard deviation of the per-run speedups around `mean`.
    /// Zero when only one run exists.
    pub stdev: f64,
    /// Number of runs aggregated.
    pub runs: usize,
}

impl SpeedupPoint {
    /// Aggregate one sample group against the serial baseline mean.
    ///
    /// Returns `None` only if a speedup is not a positive finite number.
    pub fn from_group(group: &SampleGroup, baseline: &BaselineStats) -> Option<Self> {
        let speedups: Vec<f64> = group.samples().iter().map(|s| baseline.mean / s.time).collect();
        let mean = stats::geometric_mean(&speedups)?;
        let stdev = stats::stdev_around(&speedups, mean).unwrap_or(0.0);
        Some(Self {
            cores: group.cores(),
            mean,
            stdev,
            runs: speedups.len(),
        })
    }
}

/// Speedup points of one (runtime, benchmark), ascending by core count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedupSeries {
    points: Vec<SpeedupPoint>,
}

impl SpeedupSeries {
    /// Aggregate every core-count group of a measurement table.
    pub fn from_table(table: &SampleTable, baseline: &BaselineStats) -> Self {
        let mut points: Vec<SpeedupPoint> = table
            .groups()
            .iter()
            .filter_map(|group| {
                let point = SpeedupPoint::from_group(group, baseline);
                if point.is_none() {
                    warn!(cores = group.cores(), "skipping core count with non-positive speedup");
                }
                point
            })
            .collect();

        points.sort_by_key(|p| p.cores);
        Self { points }
    }

    /// Points in ascending core-count order.
    pub fn points(&self) -> &[SpeedupPoint] {
        &self.points
    }

    /// Point at a position in the series.
    pub fn get(&self, index: usize) -> Option<&SpeedupPoint> {
        self.points.get(index)
    }

    /// The point with the highest core count.
    pub fn last(&self) -> Option<&SpeedupPoint> {
        self.points.last()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the series holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
