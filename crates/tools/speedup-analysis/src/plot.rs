//! Grouped speedup plot document (pgfplots `groupplot`).
//!
//! One sub-plot per benchmark, one table per runtime inside it, a legend
//! taken from the first benchmark's runtime list, and axis labels anchored
//! to the corner cells of the grid.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::analysis::Analysis;
use crate::config::{AxisMode, Config};
use crate::error::{Error, Result};

/// Spacing and axis options that depend on the axis mode.
struct AxisLayout {
    horizontal_sep: f64,
    ylabel_offset: f64,
    options: &'static str,
}

impl AxisLayout {
    fn for_mode(mode: AxisMode) -> Self {
        match mode {
            AxisMode::Linear => Self {
                horizontal_sep: 0.7,
                ylabel_offset: 0.6,
                options: "        xtick={64,128,192,256},\n        ymin=0,\n",
            },
            AxisMode::Logarithmic => Self {
                horizontal_sep: 1.2,
                ylabel_offset: 0.9,
                options: "        xmode=log,\n        ymode=log,\n        xtick={64,128,256},\n        xticklabels={64,128,256},\n",
            },
        }
    }
}

/// Escape a name for use as plain TeX text.
pub fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '_' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// The plot document, rendered through [`fmt::Display`].
pub struct PlotDocument<'a> {
    config: &'a Config,
    analysis: &'a Analysis,
    uniform_cores: Option<BTreeSet<u32>>,
}

impl<'a> PlotDocument<'a> {
    /// Prepare a document for the given configuration and data.
    pub fn new(config: &'a Config, analysis: &'a Analysis) -> Self {
        let uniform_cores = config
            .uniform_points()
            .then(|| common_core_counts(analysis, config.first_benchmark()));
        Self {
            config,
            analysis,
            uniform_cores,
        }
    }

    /// Render and write the document, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_string())
            .map_err(|e| Error::io(format!("writing plot to {}", path.display()), e))
    }

    fn write_preamble(&self, f: &mut fmt::Formatter<'_>, layout: &AxisLayout) -> fmt::Result {
        let config = self.config;
        let legend_x = if config.columns() % 2 == 0 { "1.05" } else { "0.5" };

        f.write_str("\\documentclass{standalone}\n\\input{common.tex}\n\n")?;
        f.write_str("\\begin{document}\n\\begin{tikzpicture}\n\\begin{groupplot}[\n")?;
        f.write_str("        group style={\n")?;
        writeln!(f, "            group name={},", config.plot_name())?;
        writeln!(f, "            group size={} by {},", config.columns(), config.rows())?;
        f.write_str("            vertical sep=0.65cm,\n")?;
        writeln!(f, "            horizontal sep={:.2}cm,", layout.horizontal_sep)?;
        f.write_str(
            "            xticklabels at=edge bottom,\n\
             \x20           xlabels at=edge bottom,\n\
             \x20           ylabels at=edge left,\n\
             \x20       },\n\
             \x20       cycle list name=vibrant,\n\
             \x20       title style={\n\
             \x20           at={(0.5,0.9)},\n\
             \x20           font=\\small,\n\
             \x20       },\n\
             \x20       xmin=0,\n\
             \x20       xtick pos=bottom,\n\
             \x20       ytick pos=left,\n\
             \x20       xminorticks=false,\n\
             \x20       yminorticks=false,\n\
             \x20       ymajorgrids=true,\n\
             \x20       height=4.0cm,\n\
             \x20       width=6.5cm,\n\
             \x20       enlarge x limits={\n\
             \x20           auto,\n\
             \x20           value=0.04,\n\
             \x20       },\n",
        )?;
        writeln!(f, "        legend columns={},", config.legend_columns())?;
        f.write_str("        legend style={\n")?;
        writeln!(f, "            at={{({legend_x},1.2)}},")?;
        f.write_str(
            "            anchor=south,\n\
             \x20           font=\\small,\n\
             \x20           draw=none,\n\
             \x20       },\n",
        )?;
        f.write_str(layout.options)?;
        f.write_str("]\n\n")
    }

    fn write_title(&self, f: &mut fmt::Formatter<'_>, benchmark: &str) -> fmt::Result {
        match self.analysis.baseline(benchmark) {
            Some(base) if Config::is_default_benchmark(benchmark) => {
                let mean = format!("{:.3}", base.mean);
                let stdev = format!("{:.3}", base.stdev_from_mean);
                writeln!(f, "% stdev: {stdev}")?;
                writeln!(
                    f,
                    "\\nextgroupplot[title={{\\{benchmark}{{}} (${{\\bar{{T}}}}_{{S}} = \
                     \\SI[separate-uncertainty, multi-part-units=single]{{{mean}+-{stdev}}}{{\\second}}$) }}]"
                )
            }
            _ => writeln!(f, "\\nextgroupplot[title={}]", escape_name(benchmark)),
        }
    }

    fn write_series(&self, f: &mut fmt::Formatter<'_>, benchmark: &str) -> fmt::Result {
        for runtime in &self.analysis.runtimes {
            f.write_str("\\addplot+[sharp plot, error bars/.cd, y dir=both, y explicit]\n")?;
            f.write_str("    table [x=cores, y=speedup, y error=err]{\n")?;
            f.write_str("    cores\tspeedup\terr\n")?;
            if let Some(data) = runtime.benchmark(benchmark) {
                for point in data.series.points() {
                    if self
                        .uniform_cores
                        .as_ref()
                        .is_some_and(|cores| !cores.contains(&point.cores))
                    {
                        continue;
                    }
                    writeln!(f, "    {}\t{}\t{}", point.cores, point.mean, point.stdev)?;
                }
            }
            f.write_str("};\n")?;
        }
        Ok(())
    }

    fn write_labels(&self, f: &mut fmt::Formatter<'_>, layout: &AxisLayout) -> fmt::Result {
        let name = self.config.plot_name();
        let (columns, rows) = (self.config.columns(), self.config.rows());
        writeln!(
            f,
            "\\draw ($({name} c1r{rows}.south west)!0.5!({name} c{columns}r{rows}.south east) \
             + (0,-0.4)$) node[anchor=north] (xlabel) {{\\textbf{{Threads}}}};"
        )?;
        writeln!(
            f,
            "\\draw ($({name} c1r1.north west)!0.5!({name} c1r{rows}.south west) \
             + (-{:.1},0)$) node[anchor=south,rotate=90] (ylabel) {{\\textbf{{Speedup}}}};",
            layout.ylabel_offset
        )
    }
}

impl fmt::Display for PlotDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = AxisLayout::for_mode(self.config.axis());
        self.write_preamble(f, &layout)?;

        let benchmarks = self.config.benchmarks();
        for (i, benchmark) in benchmarks.iter().enumerate() {
            self.write_title(f, benchmark)?;
            self.write_series(f, benchmark)?;
            if i == 0 {
                for runtime in &self.analysis.runtimes {
                    writeln!(f, "\\addlegendentry{{{}}}", escape_name(&runtime.name))?;
                }
            }
            f.write_str("\n")?;
        }
        if benchmarks.len() % 2 == 1 && benchmarks.len() != 1 {
            f.write_str("\\nextgroupplot[group/empty plot]\n\n")?;
        }

        f.write_str("\\end{groupplot}\n\n")?;
        self.write_labels(f, &layout)?;
        f.write_str("\n\\end{tikzpicture}\n\\end{document}\n")
    }
}

/// Core counts measured by every runtime for `benchmark`.
fn common_core_counts(analysis: &Analysis, benchmark: &str) -> BTreeSet<u32> {
    let mut sets = analysis.runtimes.iter().map(|runtime| {
        runtime
            .benchmark(benchmark)
            .map(|d| d.table.core_counts().collect::<BTreeSet<u32>>())
            .unwrap_or_default()
    });
    let first = sets.next().unwrap_or_default();
    sets.fold(first, |acc, set| acc.intersection(&set).copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Inputs, RuntimeTables};
    use crate::config::Runtime;
    use crate::table::{RawSample, SampleTable};

    fn table(rows: &[(u32, f64)]) -> SampleTable {
        SampleTable::from_samples(rows.iter().map(|&(cores, time)| RawSample {
            cores,
            time,
            run: 0,
            rss: 0,
            maxrss: 0,
        }))
    }

    fn setup(benchmarks: &[&str], axis: AxisMode, uniform: bool) -> (Config, Analysis) {
        let config = Config::builder()
            .output("out/speedup.tex")
            .serial_path("serial")
            .benchmarks(benchmarks.iter().copied())
            .runtime(Runtime::new("fast_rt", "a"))
            .runtime(Runtime::new("slow", "b"))
            .axis(axis)
            .uniform_points(uniform)
            .build()
            .unwrap();
        let serial = table(&[(1, 8.0), (1, 8.0)]);
        let analysis = Analysis::compute(Inputs {
            benchmarks: config.benchmarks().to_vec(),
            serial: benchmarks.iter().map(|_| serial.clone()).collect(),
            runtimes: vec![
                RuntimeTables {
                    name: "fast_rt".into(),
                    tables: benchmarks.iter().map(|_| table(&[(2, 4.0), (4, 2.0), (8, 1.0)])).collect(),
                },
                RuntimeTables {
                    name: "slow".into(),
                    tables: benchmarks.iter().map(|_| table(&[(4, 4.0), (2, 8.0)])).collect(),
                },
            ],
        })
        .unwrap();
        (config, analysis)
    }

    #[test]
    fn escapes_underscores() {
        assert_eq!(escape_name("my_bench_2"), "my\\_bench\\_2");
        assert_eq!(escape_name("fib"), "fib");
    }

    #[test]
    fn document_structure() {
        let (config, analysis) = setup(&["fib", "fft", "my_bench"], AxisMode::Linear, false);
        let doc = PlotDocument::new(&config, &analysis).to_string();

        assert!(doc.starts_with("\\documentclass{standalone}\n"));
        assert!(doc.contains("group name=speedup,"));
        assert!(doc.contains("group size=1 by 3,"));
        assert!(doc.contains("horizontal sep=0.70cm,"));
        assert!(doc.contains("legend columns=2,"));
        assert!(doc.contains("at={(0.5,1.2)},"));
        assert!(doc.contains("ymin=0,"));
        assert_eq!(doc.matches("\\nextgroupplot[title=").count(), 3);
        assert_eq!(doc.matches("\\addplot+").count(), 6);
        assert_eq!(doc.matches("\\addlegendentry").count(), 2);
        assert!(doc.contains("\\addlegendentry{fast\\_rt}"));
        assert!(doc.contains("\\nextgroupplot[title=my\\_bench]"));
        assert!(doc.contains("\\nextgroupplot[group/empty plot]"));
        assert!(doc.contains("(speedup c1r3.south west)!0.5!(speedup c1r3.south east)"));
        assert!(doc.contains("+ (-0.6,0)$)"));
        assert!(doc.ends_with("\\end{tikzpicture}\n\\end{document}\n"));
    }

    #[test]
    fn default_benchmark_title_shows_serial_time() {
        let (config, analysis) = setup(&["fib"], AxisMode::Linear, false);
        let doc = PlotDocument::new(&config, &analysis).to_string();
        assert!(doc.contains("% stdev: 0.000\n"));
        assert!(doc.contains(
            "\\nextgroupplot[title={\\fib{} (${\\bar{T}}_{S} = \\SI[separate-uncertainty, \
             multi-part-units=single]{8.000+-0.000}{\\second}$) }]"
        ));
        assert!(!doc.contains("empty plot"));
    }

    #[test]
    fn points_sorted_per_runtime() {
        let (config, analysis) = setup(&["fib"], AxisMode::Linear, false);
        let doc = PlotDocument::new(&config, &analysis).to_string();
        let slow = doc.split("\\addplot+").nth(2).unwrap();
        let rows: Vec<&str> = slow.lines().skip(3).take(2).collect();
        assert_eq!(rows, vec!["    2\t1\t0", "    4\t2\t0"]);
    }

    #[test]
    fn logarithmic_layout() {
        let (config, analysis) = setup(&["fib", "fft"], AxisMode::Logarithmic, false);
        let doc = PlotDocument::new(&config, &analysis).to_string();
        assert!(doc.contains("xmode=log,"));
        assert!(doc.contains("horizontal sep=1.20cm,"));
        assert!(doc.contains("+ (-0.9,0)$)"));
        assert!(!doc.contains("ymin=0,"));
    }

    #[test]
    fn uniform_points_drop_unshared_core_counts() {
        let (config, analysis) = setup(&["fib"], AxisMode::Linear, true);
        let doc = PlotDocument::new(&config, &analysis).to_string();
        let fast = doc.split("\\addplot+").nth(1).unwrap();
        assert!(!fast.contains("\n    8\t"));
        assert!(fast.contains("\n    4\t"));
    }
}
