//! Error taxonomy for the analysis pipeline.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Abort-level failures. Recoverable data gaps are reported as
/// [`crate::relative::DataGap`] values instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration option is missing, malformed or unknown.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An input table does not exist.
    #[error("timing table not found: {}", path.display())]
    MissingFile {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// An input table lacks a required column or holds an unparsable row.
    #[error("malformed table {}: line {line}: {message}", path.display())]
    MalformedRow {
        /// Table being read.
        path: PathBuf,
        /// 1-based line number (the header is line 1).
        line: u64,
        /// What went wrong.
        message: String,
    },

    /// Fewer samples than a dispersion estimate needs.
    #[error("benchmark '{benchmark}' has {found} serial sample(s), at least 2 are required")]
    InsufficientSamples {
        /// Benchmark whose baseline could not be estimated.
        benchmark: String,
        /// Number of samples present.
        found: usize,
    },

    /// Any other I/O failure while reading or writing.
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with a short description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` for errors that should be answered with usage text.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
