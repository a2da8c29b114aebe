//! Configuration resolution: optional TOML file merged with the command line.
//!
//! The file uses the same option names as the long command-line flags, plus
//! a `key-aliases` table fixing the data-reference key of a runtime name:
//!
//! ```toml
//! output = "plots/speedup.tex"
//! serial = "results/serial"
//! benchmarks = ["fib", "fft"]
//! axis = "logarithmic"
//!
//! [[runtime]]
//! name = "nowa"
//! path = "results/nowa"
//!
//! [key-aliases]
//! "\\ourFibril{}" = "fibril"
//! ```
//!
//! Unknown keys are rejected. Command-line values win over file values; a
//! runtime list on the command line replaces the file's list.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use speedup_analysis::{AxisMode, Config, Error, Result, Runtime};

use crate::cli::Cli;

/// Options accepted in a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    output: Option<PathBuf>,
    serial: Option<PathBuf>,
    benchmarks: Option<Vec<String>>,
    columns: Option<usize>,
    legend_columns: Option<usize>,
    relative: Option<bool>,
    axis: Option<AxisMode>,
    uniform: Option<bool>,
    data_file: Option<PathBuf>,
    exclude: Option<String>,
    json: Option<PathBuf>,
    #[serde(default)]
    key_aliases: BTreeMap<String, String>,
    #[serde(default, rename = "runtime")]
    runtimes: Vec<Runtime>,
}

impl FileConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        Self::parse(&text).map_err(|e| match e {
            Error::Configuration(msg) => Error::Configuration(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Configuration(e.to_string()))
    }
}

/// Build the validated configuration for this run.
pub fn resolve(cli: &Cli) -> Result<Config> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    merge(cli, file)?.build()
}

fn merge(cli: &Cli, file: FileConfig) -> Result<speedup_analysis::ConfigBuilder> {
    let mut builder = Config::builder();

    if let Some(output) = cli.output.clone().or(file.output) {
        builder = builder.output(output);
    }
    if let Some(serial) = cli.serial.clone().or(file.serial) {
        builder = builder.serial_path(serial);
    }
    if let Some(benchmarks) = cli.benchmarks.clone().or(file.benchmarks) {
        builder = builder.benchmarks(benchmarks);
    }
    if let Some(columns) = cli.columns.or(file.columns) {
        builder = builder.columns(columns);
    }
    if let Some(columns) = cli.legend_columns.or(file.legend_columns) {
        builder = builder.legend_columns(columns);
    }
    if let Some(path) = cli.data_file.clone().or(file.data_file) {
        builder = builder.data_file(path);
    }
    if let Some(name) = cli.exclude.clone().or(file.exclude) {
        builder = builder.excluded_benchmark(name);
    }
    if let Some(path) = cli.json.clone().or(file.json) {
        builder = builder.json(path);
    }
    for (name, key) in file.key_aliases {
        builder = builder.key_alias(name, key);
    }

    let axis = if cli.logarithmic {
        AxisMode::Logarithmic
    } else {
        file.axis.unwrap_or_default()
    };
    builder = builder
        .axis(axis)
        .relative(cli.relative || file.relative.unwrap_or(false))
        .uniform_points(cli.uniform || file.uniform.unwrap_or(false));

    let runtimes = if cli.runtimes.is_empty() {
        file.runtimes
    } else {
        cli.runtimes
            .iter()
            .map(|spec| spec.parse())
            .collect::<Result<Vec<Runtime>>>()?
    };
    for runtime in runtimes {
        builder = builder.runtime(runtime);
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("speedplot").chain(args.iter().copied()))
    }

    #[test]
    fn command_line_only() {
        let config = merge(
            &cli(&["-o", "out.tex", "-s", "serial", "-b", "fib,fft", "-r", "-l", "a:x", "b:y"]),
            FileConfig::default(),
        )
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(config.benchmarks(), vec!["fib", "fft"]);
        assert_eq!(config.runtimes()[0], Runtime::new("a", "x"));
        assert_eq!(config.runtimes().len(), 2);
        assert!(config.relative());
        assert_eq!(config.axis(), AxisMode::Logarithmic);
    }

    #[test]
    fn file_values_are_overridden_by_flags() {
        let file = FileConfig::parse(
            r#"
            output = "file.tex"
            serial = "serial"
            columns = 1
            axis = "logarithmic"
            uniform = true

            [[runtime]]
            name = "ref"
            path = "data/ref"

            [[runtime]]
            name = "other"
            path = "data/other"
            "#,
        )
        .unwrap();
        let config = merge(&cli(&["-o", "cli.tex", "-b", "fib,fft"]), file)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.output(), Path::new("cli.tex"));
        assert_eq!(config.columns(), 1);
        assert_eq!(config.axis(), AxisMode::Logarithmic);
        assert!(config.uniform_points());
        assert_eq!(config.reference_runtime().name, "ref");
    }

    #[test]
    fn key_aliases_from_file() {
        let file = FileConfig::parse(
            r#"
            output = "out.tex"
            serial = "serial"

            [key-aliases]
            "Fibril/V2" = "fibril"
            "#,
        )
        .unwrap();
        let config = merge(&cli(&["a:x"]), file).unwrap().build().unwrap();
        assert_eq!(config.key_aliases()["Fibril/V2"], "fibril");
        assert_eq!(config.key_aliases()["\\ourWaitFreeAlgo{}"], "nowa");
    }

    #[test]
    fn unknown_key_is_a_configuration_error() {
        let err = FileConfig::parse("colour = \"red\"\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn malformed_runtime_spec_is_a_configuration_error() {
        let err = merge(&cli(&["-o", "o.tex", "-s", "s", "nocolon"]), FileConfig::default())
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
