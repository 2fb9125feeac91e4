use std::path::PathBuf;

use thiserror::Error;

use crate::metrics::MetricError;

/// Harness errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("suite error in {}: {source}", path.display())]
    Suite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate benchmark identifier: {0}")]
    DuplicateBenchmark(String),
    #[error("benchmark {name}: {source}")]
    Metrics {
        name: String,
        #[source]
        source: MetricError,
    },
    #[error("process error: {0}")]
    Process(String),
}

pub type Result<T> = std::result::Result<T, Error>;
