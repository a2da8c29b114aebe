//! Immutable run configuration.
//!
//! Built once through [`ConfigBuilder`], validated, then passed by reference
//! to every pipeline stage. Ordering is explicit: the first runtime is the
//! reference system for relative numbers and the first benchmark provides
//! the legend and the peak core count.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Benchmarks used when none are given.
pub const DEFAULT_BENCHMARKS: [&str; 12] = [
    "cholesky",
    "fft",
    "fib",
    "heat",
    "integrate",
    "knapsack",
    "lu",
    "matmul",
    "nqueens",
    "quicksort",
    "rectmul",
    "strassen",
];

/// Benchmark left out of the "without" relative views by default.
pub const DEFAULT_EXCLUDED_BENCHMARK: &str = "knapsack";

/// Runtime names whose data-reference key is not derived from the name.
pub const DEFAULT_KEY_ALIASES: [(&str, &str); 1] = [("\\ourWaitFreeAlgo{}", "nowa")];

/// File the data references are appended to by default.
pub const DEFAULT_DATA_FILE: &str = "data.tex";

/// A named system under test and the directory holding its tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    /// Display name, also used (sanitized) in data-reference keys.
    pub name: String,
    /// Directory containing `{benchmark}.csv` tables.
    pub path: PathBuf,
}

impl Runtime {
    /// Create a runtime entry.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl FromStr for Runtime {
    type Err = Error;

    /// Parse `NAME:PATH`, splitting at the first colon.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => {
                Ok(Self::new(name, path))
            }
            _ => Err(Error::Configuration(format!(
                "runtime '{s}' is not of the form NAME:PATH"
            ))),
        }
    }
}

/// Axis scaling of the speedup plots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// Linear core-count and speedup axes starting at zero.
    #[default]
    Linear,
    /// Logarithmic core-count and speedup axes.
    Logarithmic,
}

impl fmt::Display for AxisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Logarithmic => f.write_str("logarithmic"),
        }
    }
}

/// Validated configuration of one plotting run.
///
/// Only [`ConfigBuilder::build`] creates one, so the benchmark and runtime
/// lists are never empty and the column counts are positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    output: PathBuf,
    serial_path: PathBuf,
    benchmarks: Vec<String>,
    runtimes: Vec<Runtime>,
    columns: usize,
    legend_columns: usize,
    relative: bool,
    axis: AxisMode,
    uniform_points: bool,
    data_file: PathBuf,
    excluded_benchmark: String,
    json: Option<PathBuf>,
    key_aliases: BTreeMap<String, String>,
}

impl Config {
    /// Start building a configuration.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Plot document to write.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Directory with the serial baseline tables.
    pub fn serial_path(&self) -> &Path {
        &self.serial_path
    }

    /// Benchmarks in plot order.
    pub fn benchmarks(&self) -> &[String] {
        &self.benchmarks
    }

    /// Runtimes in plot order; the first is the reference.
    pub fn runtimes(&self) -> &[Runtime] {
        &self.runtimes
    }

    /// Columns of the plot grid.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Columns of the shared legend.
    pub fn legend_columns(&self) -> usize {
        self.legend_columns
    }

    /// Also append relative numbers to the data file.
    pub fn relative(&self) -> bool {
        self.relative
    }

    /// Axis scaling.
    pub fn axis(&self) -> AxisMode {
        self.axis
    }

    /// Only plot core counts measured for every runtime.
    pub fn uniform_points(&self) -> bool {
        self.uniform_points
    }

    /// Data-reference file (appended to).
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Benchmark dropped from the "without" relative views.
    pub fn excluded_benchmark(&self) -> &str {
        &self.excluded_benchmark
    }

    /// Optional JSON dump of the aggregated data.
    pub fn json(&self) -> Option<&Path> {
        self.json.as_deref()
    }

    /// Runtime display names with a fixed data-reference key.
    pub fn key_aliases(&self) -> &BTreeMap<String, String> {
        &self.key_aliases
    }

    /// Rows of the plot grid (benchmarks per column, rounded down).
    pub fn rows(&self) -> usize {
        self.benchmarks.len() / self.columns
    }

    /// Group-plot name: the output file name without extension.
    pub fn plot_name(&self) -> String {
        self.output
            .file_stem()
            .map_or_else(|| "plot".to_string(), |s| s.to_string_lossy().into_owned())
    }

    /// The runtime all others are compared against.
    pub fn reference_runtime(&self) -> &Runtime {
        &self.runtimes[0]
    }

    /// The benchmark that provides the legend and the peak core count.
    pub fn first_benchmark(&self) -> &str {
        &self.benchmarks[0]
    }

    /// Returns `true` for one of the built-in benchmark names.
    pub fn is_default_benchmark(name: &str) -> bool {
        DEFAULT_BENCHMARKS.contains(&name)
    }
}

/// Collects options from the command line or a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    output: Option<PathBuf>,
    serial_path: Option<PathBuf>,
    benchmarks: Option<Vec<String>>,
    runtimes: Vec<Runtime>,
    columns: Option<usize>,
    legend_columns: Option<usize>,
    relative: bool,
    axis: AxisMode,
    uniform_points: bool,
    data_file: Option<PathBuf>,
    excluded_benchmark: Option<String>,
    json: Option<PathBuf>,
    key_aliases: BTreeMap<String, String>,
}

impl ConfigBuilder {
    /// Plot document path.
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Serial baseline directory.
    #[must_use]
    pub fn serial_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.serial_path = Some(path.into());
        self
    }

    /// Replace the benchmark list.
    #[must_use]
    pub fn benchmarks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.benchmarks = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Append a runtime. The first one added becomes the reference.
    #[must_use]
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtimes.push(runtime);
        self
    }

    /// Plot grid columns.
    #[must_use]
    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Legend columns.
    #[must_use]
    pub fn legend_columns(mut self, columns: usize) -> Self {
        self.legend_columns = Some(columns);
        self
    }

    /// Emit relative numbers.
    #[must_use]
    pub fn relative(mut self, enabled: bool) -> Self {
        self.relative = enabled;
        self
    }

    /// Axis scaling.
    #[must_use]
    pub fn axis(mut self, axis: AxisMode) -> Self {
        self.axis = axis;
        self
    }

    /// Restrict plotted points to common core counts.
    #[must_use]
    pub fn uniform_points(mut self, enabled: bool) -> Self {
        self.uniform_points = enabled;
        self
    }

    /// Data-reference output file.
    #[must_use]
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Benchmark excluded from the "without" views.
    #[must_use]
    pub fn excluded_benchmark(mut self, name: impl Into<String>) -> Self {
        self.excluded_benchmark = Some(name.into());
        self
    }

    /// JSON dump path.
    #[must_use]
    pub fn json(mut self, path: impl Into<PathBuf>) -> Self {
        self.json = Some(path.into());
        self
    }

    /// Use `key` for `name` in data-reference keys.
    #[must_use]
    pub fn key_alias(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.key_aliases.insert(name.into(), key.into());
        self
    }

    /// Validate and fill in derived defaults.
    pub fn build(self) -> Result<Config> {
        let output = self
            .output
            .ok_or_else(|| Error::Configuration("no output file given".into()))?;
        let serial_path = self
            .serial_path
            .ok_or_else(|| Error::Configuration("no serial data path given".into()))?;

        let benchmarks = self
            .benchmarks
            .unwrap_or_else(|| DEFAULT_BENCHMARKS.iter().map(|b| (*b).to_string()).collect());
        if benchmarks.is_empty() {
            return Err(Error::Configuration("benchmark list is empty".into()));
        }
        if let Some(empty) = benchmarks.iter().position(String::is_empty) {
            return Err(Error::Configuration(format!(
                "benchmark name #{} is empty",
                empty + 1
            )));
        }

        if self.runtimes.is_empty() {
            return Err(Error::Configuration(
                "at least one NAME:PATH runtime is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for runtime in &self.runtimes {
            if !seen.insert(runtime.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "runtime '{}' given more than once",
                    runtime.name
                )));
            }
        }

        let columns = match self.columns {
            Some(0) => return Err(Error::Configuration("column count must be positive".into())),
            Some(c) => c,
            None if benchmarks.len() <= 6 => 1,
            None => 2,
        };
        if columns > benchmarks.len() {
            return Err(Error::Configuration(format!(
                "{columns} columns requested for {} benchmark(s)",
                benchmarks.len()
            )));
        }
        if benchmarks.len() % columns != 0 {
            warn!("not all columns of plots are filled");
        }

        let legend_columns = match self.legend_columns {
            Some(0) => {
                return Err(Error::Configuration(
                    "legend column count must be positive".into(),
                ));
            }
            Some(c) => c,
            None => 2 * columns,
        };

        let mut key_aliases: BTreeMap<String, String> = DEFAULT_KEY_ALIASES
            .iter()
            .map(|(name, key)| ((*name).to_string(), (*key).to_string()))
            .collect();
        for (name, key) in self.key_aliases {
            if key.is_empty() {
                return Err(Error::Configuration(format!(
                    "empty data-reference key for runtime '{name}'"
                )));
            }
            key_aliases.insert(name, key);
        }

        Ok(Config {
            output,
            serial_path,
            benchmarks,
            runtimes: self.runtimes,
            columns,
            legend_columns,
            relative: self.relative,
            axis: self.axis,
            uniform_points: self.uniform_points,
            data_file: self.data_file.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
            excluded_benchmark: self
                .excluded_benchmark
                .unwrap_or_else(|| DEFAULT_EXCLUDED_BENCHMARK.to_string()),
            json: self.json,
            key_aliases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ConfigBuilder {
        Config::builder()
            .output("plots/speedup.tex")
            .serial_path("serial")
            .runtime(Runtime::new("a", "data/a"))
    }

    #[test]
    fn defaults_for_twelve_benchmarks() {
        let config = base().build().unwrap();
        assert_eq!(config.benchmarks().len(), 12);
        assert_eq!(config.columns(), 2);
        assert_eq!(config.rows(), 6);
        assert_eq!(config.legend_columns(), 4);
        assert_eq!(config.axis(), AxisMode::Linear);
        assert_eq!(config.data_file(), Path::new("data.tex"));
        assert_eq!(config.excluded_benchmark(), "knapsack");
        assert_eq!(config.plot_name(), "speedup");
    }

    #[test]
    fn small_suites_use_one_column() {
        let config = base().benchmarks(["fib", "fft"]).build().unwrap();
        assert_eq!(config.columns(), 1);
        assert_eq!(config.rows(), 2);
        assert_eq!(config.legend_columns(), 2);
    }

    #[test]
    fn explicit_columns_kept() {
        let config = base().columns(3).legend_columns(5).build().unwrap();
        assert_eq!(config.columns(), 3);
        assert_eq!(config.rows(), 4);
        assert_eq!(config.legend_columns(), 5);
    }

    #[test]
    fn missing_required_options() {
        let err = Config::builder()
            .serial_path("s")
            .runtime(Runtime::new("a", "p"))
            .build()
            .unwrap_err();
        assert!(err.is_configuration());

        let err = Config::builder().output("o.tex").serial_path("s").build().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(base().columns(0).build().unwrap_err().is_configuration());
        assert!(base().legend_columns(0).build().unwrap_err().is_configuration());
        assert!(base().benchmarks(Vec::<String>::new()).build().unwrap_err().is_configuration());
        assert!(base().benchmarks(["fib"]).columns(2).build().unwrap_err().is_configuration());
        assert!(
            base()
                .runtime(Runtime::new("a", "other"))
                .build()
                .unwrap_err()
                .is_configuration()
        );
    }

    #[test]
    fn runtime_parsing() {
        let rt: Runtime = "nowa:/data/nowa:v2".parse().unwrap();
        assert_eq!(rt.name, "nowa");
        assert_eq!(rt.path, PathBuf::from("/data/nowa:v2"));
        assert!("nopath".parse::<Runtime>().is_err());
        assert!(":path".parse::<Runtime>().is_err());
        assert!("name:".parse::<Runtime>().is_err());
    }

    #[test]
    fn key_aliases_extend_defaults() {
        let config = base().key_alias("Fibril", "fib-rt").build().unwrap();
        assert_eq!(config.key_aliases()["\\ourWaitFreeAlgo{}"], "nowa");
        assert_eq!(config.key_aliases()["Fibril"], "fib-rt");
        assert!(base().key_alias("x", "").build().unwrap_err().is_configuration());
    }

    #[test]
    fn reference_is_first_runtime() {
        let config = base().runtime(Runtime::new("b", "data/b")).build().unwrap();
        assert_eq!(config.reference_runtime().name, "a");
        assert_eq!(config.first_benchmark(), "cholesky");
    }
}
