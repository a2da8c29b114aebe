//! Command-line interface definitions for speedplot.

use std::path::PathBuf;

use clap::Parser;

/// Generate speedup plots and data references from benchmark timing tables.
#[derive(Parser, Debug)]
#[command(name = "speedplot", version, about)]
pub struct Cli {
    /// Plot document to generate.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Directory with the serial `{benchmark}.csv` tables.
    #[arg(short = 's', long)]
    pub serial: Option<PathBuf>,

    /// Comma-separated benchmark list (default: the built-in suite).
    #[arg(short = 'b', long, value_delimiter = ',')]
    pub benchmarks: Option<Vec<String>>,

    /// Columns of the plot grid (default: 1 for up to 6 benchmarks, else 2).
    #[arg(short = 'c', long)]
    pub columns: Option<usize>,

    /// Columns of the legend (default: twice the grid columns).
    #[arg(short = 'L', long)]
    pub legend_columns: Option<usize>,

    /// Append relative numbers to the data-reference file.
    #[arg(short = 'r', long)]
    pub relative: bool,

    /// Use logarithmic axes.
    #[arg(short = 'l', long = "log")]
    pub logarithmic: bool,

    /// Only plot core counts measured by every runtime.
    #[arg(short = 'u', long)]
    pub uniform: bool,

    /// Data-reference file written in relative mode (default: data.tex).
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Benchmark left out of the "wo" relative numbers (default: knapsack).
    #[arg(long)]
    pub exclude: Option<String>,

    /// Also dump the aggregated data as JSON.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// TOML file with default options; command-line values take precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only report errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report per-table loading details.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Runtimes to plot; the first is the reference for relative numbers.
    #[arg(value_name = "NAME:PATH")]
    pub runtimes: Vec<String>,
}
