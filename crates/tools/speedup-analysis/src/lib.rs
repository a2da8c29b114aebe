//! Speedup analysis for parallel runtime benchmarks.
//!
//! Loads tab-separated timing tables (one per runtime and benchmark), derives
//! serial baselines, per-core-count speedup series and relative summaries
//! between runtimes, and renders a grouped plot document plus a flat
//! data-reference file for the typesetting pipeline.
//!
//! Pipeline: load tables → baseline statistics → speedup series →
//!           relative summaries → render.

pub mod analysis;
pub mod baseline;
pub mod config;
pub mod dataref;
pub mod error;
pub mod plot;
pub mod relative;
pub mod speedup;
pub mod stats;
pub mod table;

pub use analysis::Analysis;
pub use config::{AxisMode, Config, ConfigBuilder, Runtime};
pub use error::{Error, Result};
