//! Serial baseline estimation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats;
use crate::table::SampleTable;

/// Central tendency and dispersion of the serial run times of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    /// Mean serial time. Always the speedup denominator.
    pub mean: f64,
    /// Sample standard deviation around the mean.
    pub stdev_from_mean: f64,
    /// Median serial time.
    pub median: f64,
    /// Sample standard deviation around the median.
    pub stdev_from_median: f64,
    /// Number of serial runs.
    pub samples: usize,
}

impl BaselineStats {
    /// Estimate the baseline from serial run times.
    ///
    /// Fails with [`Error::InsufficientSamples`] for fewer than two times.
    pub fn from_times(benchmark: &str, times: &[f64]) -> Result<Self> {
        let insufficient = || Error::InsufficientSamples {
            benchmark: benchmark.to_string(),
            found: times.len(),
        };
        if times.len() < 2 {
            return Err(insufficient());
        }

        let mean = stats::mean(times).ok_or_else(insufficient)?;
        let median = stats::median(times).ok_or_else(insufficient)?;
        let stdev_from_mean = stats::stdev_around(times, mean).ok_or_else(insufficient)?;
        let stdev_from_median = stats::stdev_around(times, median).ok_or_else(insufficient)?;

        Ok(Self {
            mean,
            stdev_from_mean,
            median,
            stdev_from_median,
            samples: times.len(),
        })
    }

    /// Estimate the baseline from every sample of a serial table,
    /// regardless of the core counts recorded in it.
    pub fn from_table(benchmark: &str, table: &SampleTable) -> Result<Self> {
        let times: Vec<f64> = table.samples().map(|s| s.time).collect();
        Self::from_times(benchmark, &times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawSample;

    fn serial(times: &[f64]) -> SampleTable {
        SampleTable::from_samples(times.iter().enumerate().map(|(i, &time)| RawSample {
            cores: 1,
            time,
            run: u32::try_from(i).unwrap(),
            rss: 0,
            maxrss: 0,
        }))
    }

    #[test]
    fn closed_form_example() {
        let base =
            BaselineStats::from_times("b", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((base.mean - 5.0).abs() < 1e-12);
        assert!((base.stdev_from_mean - 2.138).abs() < 1e-3);
        assert!((base.median - 4.5).abs() < 1e-12);
        assert!((base.stdev_from_median - (34.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(base.samples, 8);
    }

    #[test]
    fn single_sample_is_insufficient() {
        match BaselineStats::from_table("fib", &serial(&[1.5])) {
            Err(Error::InsufficientSamples { benchmark, found }) => {
                assert_eq!(benchmark, "fib");
                assert_eq!(found, 1);
            }
            other => panic!("expected InsufficientSamples, got {other:?}"),
        }
    }

    #[test]
    fn empty_table_is_insufficient() {
        assert!(matches!(
            BaselineStats::from_table("fib", &SampleTable::default()),
            Err(Error::InsufficientSamples { found: 0, .. })
        ));
    }

    #[test]
    fn table_samples_across_core_counts_are_pooled() {
        let mut table_samples: Vec<RawSample> = Vec::new();
        for (cores, time) in [(1, 2.0), (2, 4.0)] {
            table_samples.push(RawSample { cores, time, run: 0, rss: 0, maxrss: 0 });
        }
        let base = BaselineStats::from_table("b", &SampleTable::from_samples(table_samples)).unwrap();
        assert!((base.mean - 3.0).abs() < 1e-12);
    }
}
