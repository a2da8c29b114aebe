//! Diagnostic output for the command-line tool.
//!
//! Three output levels controlled by CLI flags:
//! - **Quiet** (`-q`): errors only
//! - **Default** (no flag): warnings (data gaps, unfilled grids) and progress
//! - **Verbose** (`-v`): per-table loading details and timings
//!
//! Log events go to stderr; stdout only carries the final summary.

use std::time::Instant;

use tracing::Level;

/// Output verbosity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Default,
    Verbose,
}

impl Verbosity {
    /// Map the `-q` / `-v` flags to a level.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Default
        }
    }

    fn max_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Default => Level::INFO,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the stderr subscriber for the current process.
pub fn init(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(verbosity.max_level())
        .with_target(false)
        .without_time()
        .init();
}

/// RAII timer that logs the elapsed duration at debug level on drop.
///
/// ```ignore
/// let _t = Timer::start("aggregation");
/// // ... work ...
/// // logs "aggregation: 42ms" on drop
/// ```
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Begin timing a labeled operation.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        tracing::debug!("{}: {:.1?}", self.label, self.start.elapsed());
    }
}
