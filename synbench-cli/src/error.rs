use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Harness(#[from] synbench::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} benchmark(s) succeeded without the expected size annotations")]
    MalformedOutput(usize),
}

pub type Result<T> = std::result::Result<T, CliError>;
