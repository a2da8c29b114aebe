//! Tab-separated timing tables.
//!
//! One table exists per (runtime, benchmark) pair at `{dir}/{benchmark}.csv`.
//! The header row names the columns; `cores` (or `core_count`), `time`,
//! `run`, `rss` and `maxrss` are required for measurement tables, while
//! serial tables only need `time`.

use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// One measured run. Memory columns are kept exactly as recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Parallelism degree of the run.
    pub cores: u32,
    /// Wall-clock time in seconds.
    pub time: f64,
    /// Ordinal index of the run.
    pub run: u32,
    /// Resident set size.
    pub rss: u64,
    /// Peak resident set size.
    pub maxrss: u64,
}

/// All samples of one table that share a core count.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGroup {
    cores: u32,
    samples: Vec<RawSample>,
}

impl SampleGroup {
    /// Core count shared by every sample in the group.
    pub fn cores(&self) -> u32 {
        self.cores
    }

    /// Samples in file order. Never empty.
    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    /// Run times in file order.
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// The sample with the highest run index (last one on ties).
    pub fn last_run(&self) -> &RawSample {
        // Groups are built with at least one sample.
        let mut last = &self.samples[0];
        for sample in &self.samples[1..] {
            if sample.run >= last.run {
                last = sample;
            }
        }
        last
    }
}

/// A loaded table, grouped by core count in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    groups: Vec<SampleGroup>,
}

impl SampleTable {
    /// Group samples by core count, keeping first-seen key order.
    pub fn from_samples(samples: impl IntoIterator<Item = RawSample>) -> Self {
        let mut index: HashMap<u32, usize> = HashMap::new();
        let mut groups: Vec<SampleGroup> = Vec::new();

        for sample in samples {
            match index.get(&sample.cores) {
                Some(&i) => groups[i].samples.push(sample),
                None => {
                    index.insert(sample.cores, groups.len());
                    groups.push(SampleGroup {
                        cores: sample.cores,
                        samples: vec![sample],
                    });
                }
            }
        }

        Self { groups }
    }

    /// Groups in first-seen order (not necessarily sorted).
    pub fn groups(&self) -> &[SampleGroup] {
        &self.groups
    }

    /// Look up the group for a core count.
    pub fn group(&self, cores: u32) -> Option<&SampleGroup> {
        self.groups.iter().find(|g| g.cores == cores)
    }

    /// Core counts in first-seen order.
    pub fn core_counts(&self) -> impl Iterator<Item = u32> + '_ {
        self.groups.iter().map(|g| g.cores)
    }

    /// Highest core count present.
    pub fn max_cores(&self) -> Option<u32> {
        self.core_counts().max()
    }

    /// Every sample, group by group.
    pub fn samples(&self) -> impl Iterator<Item = &RawSample> {
        self.groups.iter().flat_map(|g| g.samples.iter())
    }

    /// Total number of samples.
    pub fn sample_count(&self) -> usize {
        self.groups.iter().map(|g| g.samples.len()).sum()
    }

    /// Returns `true` if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Which columns a table must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Serial baseline table: only `time` is required, `cores` defaults to 1.
    Serial,
    /// Parallel measurement table: all columns are required.
    Measurement,
}

impl TableKind {
    fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Serial => &["time"],
            Self::Measurement => &["time", "run", "rss", "maxrss"],
        }
    }
}

/// Row as it appears on disk; absent columns are checked against the header.
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(alias = "core_count")]
    cores: Option<u32>,
    time: f64,
    run: Option<u32>,
    rss: Option<u64>,
    maxrss: Option<u64>,
}

impl Row {
    /// First measurement column left empty in this row.
    fn blank_cell(&self) -> Option<&'static str> {
        if self.cores.is_none() {
            Some("cores")
        } else if self.run.is_none() {
            Some("run")
        } else if self.rss.is_none() {
            Some("rss")
        } else if self.maxrss.is_none() {
            Some("maxrss")
        } else {
            None
        }
    }
}

/// Conventional location of a benchmark table inside a data directory.
pub fn table_path(dir: &Path, benchmark: &str) -> PathBuf {
    dir.join(format!("{benchmark}.csv"))
}

/// Load `{dir}/{benchmark}.csv`.
pub fn load_table(dir: &Path, benchmark: &str, kind: TableKind) -> Result<SampleTable> {
    let path = table_path(dir, benchmark);
    let file = File::open(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::MissingFile { path: path.clone() },
        _ => Error::io(format!("opening {}", path.display()), e),
    })?;

    let table = read_table(file, &path, kind)?;
    debug!(
        path = %path.display(),
        samples = table.sample_count(),
        core_counts = table.groups().len(),
        "loaded timing table"
    );
    Ok(table)
}

/// Parse a table from any reader. `path` is only used for error messages.
pub fn read_table<R: std::io::Read>(reader: R, path: &Path, kind: TableKind) -> Result<SampleTable> {
    let malformed = |line: u64, message: String| Error::MalformedRow {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| malformed(1, format!("reading header: {e}")))?
        .clone();

    for column in kind.required_columns() {
        if !headers.iter().any(|h| h == *column) {
            return Err(malformed(1, format!("missing required column '{column}'")));
        }
    }
    let has_cores = headers.iter().any(|h| h == "cores" || h == "core_count");
    if kind == TableKind::Measurement && !has_cores {
        return Err(malformed(1, "missing required column 'cores'".into()));
    }

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map_or(0, csv::Position::line);
            malformed(line, e.to_string())
        })?;
        let line = record.position().map_or(0, csv::Position::line);
        let row: Row = record
            .deserialize(Some(&headers))
            .map_err(|e| malformed(line, e.to_string()))?;

        if kind == TableKind::Measurement {
            if let Some(column) = row.blank_cell() {
                return Err(malformed(line, format!("empty '{column}' cell")));
            }
        }
        if !(row.time.is_finite() && row.time > 0.0) {
            return Err(malformed(line, format!("time must be positive, got {}", row.time)));
        }
        let cores = row.cores.unwrap_or(1);
        if cores == 0 {
            return Err(malformed(line, "core count must be positive".into()));
        }

        samples.push(RawSample {
            cores,
            time: row.time,
            run: row.run.unwrap_or(0),
            rss: row.rss.unwrap_or(0),
            maxrss: row.maxrss.unwrap_or(0),
        });
    }

    Ok(SampleTable::from_samples(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, kind: TableKind) -> Result<SampleTable> {
        read_table(text.as_bytes(), Path::new("test.csv"), kind)
    }

    #[test]
    fn groups_by_cores_in_first_seen_order() {
        let text = "cores\ttime\trun\trss\tmaxrss\n\
                    4\t1.0\t0\t10\t20\n\
                    1\t4.0\t0\t10\t20\n\
                    4\t1.2\t1\t11\t21\n\
                    2\t2.0\t0\t10\t20\n";
        let table = parse(text, TableKind::Measurement).unwrap();
        assert_eq!(table.core_counts().collect::<Vec<_>>(), vec![4, 1, 2]);
        assert_eq!(table.group(4).unwrap().times(), vec![1.0, 1.2]);
        assert_eq!(table.sample_count(), 4);
        assert_eq!(table.max_cores(), Some(4));
    }

    #[test]
    fn core_count_alias_accepted() {
        let text = "core_count\ttime\trun\trss\tmaxrss\n8\t0.5\t0\t1\t2\n";
        let table = parse(text, TableKind::Measurement).unwrap();
        assert_eq!(table.core_counts().collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn extra_columns_ignored() {
        let text = "cores\ttime\trun\trss\tmaxrss\tnote\n2\t0.5\t0\t1\t2\tx\n";
        assert!(parse(text, TableKind::Measurement).is_ok());
    }

    #[test]
    fn missing_column_is_malformed() {
        let text = "cores\ttime\trun\trss\n2\t0.5\t0\t1\n";
        match parse(text, TableKind::Measurement) {
            Err(Error::MalformedRow { line, message, .. }) => {
                assert_eq!(line, 1);
                assert!(message.contains("maxrss"));
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn blank_measurement_cell_is_malformed() {
        let text = "cores\ttime\trun\trss\tmaxrss\n\
                    8\t1.0\t0\t10\t20\n\
                    \t1.1\t\t\t\n";
        match parse(text, TableKind::Measurement) {
            Err(Error::MalformedRow { line, message, .. }) => {
                assert_eq!(line, 3);
                assert!(message.contains("cores"));
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }

        let text = "cores\ttime\trun\trss\tmaxrss\n4\t1.0\t0\t\t20\n";
        match parse(text, TableKind::Measurement) {
            Err(Error::MalformedRow { message, .. }) => assert!(message.contains("'rss'")),
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn serial_table_defaults_blank_cells() {
        let text = "cores\ttime\trun\trss\tmaxrss\n\t3.0\t\t\t\n";
        let table = parse(text, TableKind::Serial).unwrap();
        assert_eq!(table.group(1).unwrap().samples()[0].rss, 0);
    }

    #[test]
    fn missing_cores_column_is_malformed() {
        let text = "time\trun\trss\tmaxrss\n0.5\t0\t1\t2\n";
        assert!(matches!(
            parse(text, TableKind::Measurement),
            Err(Error::MalformedRow { .. })
        ));
    }

    #[test]
    fn unparsable_value_is_malformed() {
        let text = "cores\ttime\trun\trss\tmaxrss\n2\tfast\t0\t1\t2\n";
        match parse(text, TableKind::Measurement) {
            Err(Error::MalformedRow { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_time_is_malformed() {
        let text = "cores\ttime\trun\trss\tmaxrss\n2\t0\t0\t1\t2\n";
        assert!(matches!(
            parse(text, TableKind::Measurement),
            Err(Error::MalformedRow { .. })
        ));
    }

    #[test]
    fn serial_table_needs_only_time() {
        let table = parse("time\n3.0\n3.5\n", TableKind::Serial).unwrap();
        assert_eq!(table.core_counts().collect::<Vec<_>>(), vec![1]);
        assert_eq!(table.sample_count(), 2);
    }

    #[test]
    fn last_run_picks_highest_index() {
        let text = "cores\ttime\trun\trss\tmaxrss\n\
                    2\t1.0\t2\t0\t300\n\
                    2\t1.0\t0\t0\t100\n\
                    2\t1.0\t1\t0\t200\n";
        let table = parse(text, TableKind::Measurement).unwrap();
        assert_eq!(table.group(2).unwrap().last_run().maxrss, 300);
    }

    #[test]
    fn missing_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        match load_table(dir.path(), "nope", TableKind::Measurement) {
            Err(Error::MissingFile { path }) => assert!(path.ends_with("nope.csv")),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }
}
