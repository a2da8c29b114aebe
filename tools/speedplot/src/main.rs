//! Speedup plot generator.
//!
//! Reads per-runtime, per-benchmark timing tables, derives speedups against
//! a serial baseline and writes a grouped pgfplots document. In relative
//! mode it also appends data references comparing every runtime with the
//! first one.
//!
//! Pipeline: resolve config → load tables → aggregate → render artifacts.

mod cli;
mod config;
mod verbose;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use speedup_analysis::plot::PlotDocument;
use speedup_analysis::relative::RelativeReport;
use speedup_analysis::{Analysis, Config, dataref};
use tracing::info;

use verbose::{Timer, Verbosity};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    verbose::init(verbosity);

    let config = match config::resolve(&cli) {
        Ok(config) => config,
        Err(e) if e.is_configuration() => {
            eprintln!("error: {e}\n");
            eprintln!("{}", cli::Cli::command().render_usage());
            eprintln!("\nFor more information, try '--help'.");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("loading configuration"),
    };

    run(&config, verbosity)
}

/// Aggregate the tables and write every requested artifact.
fn run(config: &Config, verbosity: Verbosity) -> Result<()> {
    let analysis = {
        let _t = Timer::start("aggregation");
        Analysis::run(config).context("aggregating timing tables")?
    };

    let report = config
        .relative()
        .then(|| RelativeReport::compute(&analysis, config.excluded_benchmark()));

    if let Some(report) = &report {
        dataref::append(config.data_file(), &analysis, report, config.key_aliases())
            .context("writing relative numbers")?;
        info!(
            path = %config.data_file().display(),
            compared = report.summaries.len(),
            skipped = report.gaps.len(),
            "relative numbers appended"
        );
    }

    PlotDocument::new(config, &analysis)
        .write_to(config.output())
        .context("writing plot document")?;

    if let Some(path) = config.json() {
        analysis
            .write_json(report.as_ref(), path)
            .context("writing JSON export")?;
    }

    if verbosity != Verbosity::Quiet {
        println!(
            "Plot written to {} ({} benchmarks, {} runtimes, {} axes)",
            config.output().display(),
            config.benchmarks().len(),
            config.runtimes().len(),
            config.axis()
        );
    }
    Ok(())
}
