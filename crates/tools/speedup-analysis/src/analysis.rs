//! Pipeline driver: load every table, estimate baselines, aggregate series.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::baseline::BaselineStats;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::relative::RelativeReport;
use crate::speedup::SpeedupSeries;
use crate::table::{self, SampleTable, TableKind};

/// Raw tables of one runtime, in benchmark order.
#[derive(Debug, Clone)]
pub struct RuntimeTables {
    /// Runtime name.
    pub name: String,
    /// One table per benchmark, parallel to [`Inputs::benchmarks`].
    pub tables: Vec<SampleTable>,
}

/// Everything read from disk before any statistics are computed.
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Benchmarks in configuration order.
    pub benchmarks: Vec<String>,
    /// Serial tables, parallel to `benchmarks`.
    pub serial: Vec<SampleTable>,
    /// Measurement tables per runtime, in configuration order.
    pub runtimes: Vec<RuntimeTables>,
}

impl Inputs {
    /// Read the serial and measurement tables named by the configuration.
    ///
    /// Any missing or malformed table aborts the load.
    pub fn load(config: &Config) -> Result<Self> {
        let mut runtimes = Vec::with_capacity(config.runtimes().len());
        for runtime in config.runtimes() {
            let tables = config
                .benchmarks()
                .iter()
                .map(|b| table::load_table(&runtime.path, b, TableKind::Measurement))
                .collect::<Result<Vec<_>>>()?;
            runtimes.push(RuntimeTables {
                name: runtime.name.clone(),
                tables,
            });
        }

        let serial = config
            .benchmarks()
            .iter()
            .map(|b| table::load_table(config.serial_path(), b, TableKind::Serial))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            benchmarks: config.benchmarks().to_vec(),
            serial,
            runtimes,
        })
    }
}

/// Baseline of one benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkBaseline {
    /// Benchmark name.
    pub benchmark: String,
    /// Serial statistics.
    #[serde(flatten)]
    pub stats: BaselineStats,
}

/// Measurements and speedups of one runtime on one benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkData {
    /// Benchmark name.
    pub benchmark: String,
    /// Raw samples grouped by core count.
    #[serde(skip)]
    pub table: SampleTable,
    /// Aggregated speedups, ascending by core count.
    pub series: SpeedupSeries,
}

/// All benchmarks of one runtime.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeData {
    /// Runtime name.
    pub name: String,
    /// Per-benchmark data in benchmark order.
    pub benchmarks: Vec<BenchmarkData>,
}

impl RuntimeData {
    /// Data for a benchmark.
    pub fn benchmark(&self, name: &str) -> Option<&BenchmarkData> {
        self.benchmarks.iter().find(|b| b.benchmark == name)
    }
}

/// Aggregated result of the pipeline; read-only once computed.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Benchmarks in configuration order.
    pub benchmarks: Vec<String>,
    /// Serial baselines in benchmark order.
    pub baselines: Vec<BenchmarkBaseline>,
    /// Runtimes in configuration order; the first is the reference.
    pub runtimes: Vec<RuntimeData>,
}

impl Analysis {
    /// Load the configured tables and aggregate them.
    pub fn run(config: &Config) -> Result<Self> {
        info!(
            benchmarks = config.benchmarks().len(),
            runtimes = config.runtimes().len(),
            "loading timing tables"
        );
        Self::compute(Inputs::load(config)?)
    }

    /// Aggregate already-loaded tables.
    ///
    /// Fails with [`Error::InsufficientSamples`] when a serial table has
    /// fewer than two runs.
    pub fn compute(inputs: Inputs) -> Result<Self> {
        let Inputs {
            benchmarks,
            serial,
            runtimes,
        } = inputs;

        if serial.len() != benchmarks.len()
            || runtimes.iter().any(|r| r.tables.len() != benchmarks.len())
        {
            return Err(Error::Configuration(
                "every runtime needs exactly one table per benchmark".into(),
            ));
        }

        let baselines = benchmarks
            .iter()
            .zip(&serial)
            .map(|(benchmark, table)| {
                let stats = BaselineStats::from_table(benchmark, table)?;
                debug!(
                    benchmark = %benchmark,
                    mean = stats.mean,
                    stdev = stats.stdev_from_mean,
                    "serial baseline"
                );
                Ok(BenchmarkBaseline {
                    benchmark: benchmark.clone(),
                    stats,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let runtimes = runtimes
            .into_iter()
            .map(|runtime| {
                let benchmarks = runtime
                    .tables
                    .into_iter()
                    .zip(&baselines)
                    .map(|(table, baseline)| BenchmarkData {
                        benchmark: baseline.benchmark.clone(),
                        series: SpeedupSeries::from_table(&table, &baseline.stats),
                        table,
                    })
                    .collect();
                RuntimeData {
                    name: runtime.name,
                    benchmarks,
                }
            })
            .collect();

        Ok(Self {
            benchmarks,
            baselines,
            runtimes,
        })
    }

    /// Baseline of a benchmark.
    pub fn baseline(&self, benchmark: &str) -> Option<&BaselineStats> {
        self.baselines
            .iter()
            .find(|b| b.benchmark == benchmark)
            .map(|b| &b.stats)
    }

    /// Data of a runtime.
    pub fn runtime(&self, name: &str) -> Option<&RuntimeData> {
        self.runtimes.iter().find(|r| r.name == name)
    }

    /// The reference runtime (first in configuration order).
    pub fn reference(&self) -> Option<&RuntimeData> {
        self.runtimes.first()
    }

    /// Write the aggregated data, and the relative report if one was
    /// computed, as pretty-printed JSON.
    pub fn write_json(&self, relative: Option<&RelativeReport>, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct Export<'a> {
            #[serde(flatten)]
            analysis: &'a Analysis,
            #[serde(skip_serializing_if = "Option::is_none")]
            relative: Option<&'a RelativeReport>,
        }

        let context = || format!("writing JSON to {}", path.display());
        let file = File::create(path).map_err(|e| Error::io(context(), e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &Export { analysis: self, relative })
            .map_err(|e| Error::io(context(), e.into()))?;
        writer.flush().map_err(|e| Error::io(context(), e))?;
        Ok(())
    }
}
