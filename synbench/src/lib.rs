//! Benchmark orchestration for a command-line synthesis tool.
//!
//! A suite file describes the catalog of benchmarks. Each benchmark is run
//! once, in order, with a timeout; successful runs have their size
//! annotations parsed from the combined log, and the results are rendered as
//! a flat CSV-like summary and a grouped LaTeX table. The combined log can
//! be diffed against an oracle log from an earlier run.

pub mod catalog;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod oracle;
pub mod report;
pub mod runner;
pub mod store;
pub mod suite;

pub use catalog::{BenchmarkEntry, Catalog};
pub use error::{Error, Result};
pub use harness::{Harness, RunSummary};
pub use metrics::MetricSet;
pub use runner::{RunOutcome, RunStatus, Runner};
pub use store::ResultStore;
pub use suite::SuiteConfig;
