use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::Args;
use synbench::oracle;

use crate::error::{CliError, Result};

#[derive(Args)]
pub struct DiffArgs {
    #[arg(long, help = "Oracle log captured by an earlier run")]
    pub oracle: PathBuf,
    #[arg(long, default_value = "run_all.log", help = "Combined log of the current run")]
    pub log: PathBuf,
}

pub struct DiffCommand;

impl DiffCommand {
    pub fn execute(args: &DiffArgs) -> Result<()> {
        if !args.log.is_file() {
            return Err(CliError::FileNotFound(args.log.display().to_string()));
        }
        let stdout = io::stdout();
        print_oracle_diff(&args.oracle, &args.log, &mut stdout.lock())
    }
}

/// Write the zero-context diff between `oracle` and `log` to `out`.
///
/// A missing oracle is skipped without error.
pub fn print_oracle_diff(oracle: &Path, log: &Path, out: &mut dyn Write) -> Result<()> {
    match oracle::diff_against_oracle(oracle, log)? {
        None => log::info!("no oracle at {}, skipping regression diff", oracle.display()),
        Some(diff) if diff.is_empty() => {
            log::info!("{} matches {}", log.display(), oracle.display());
        }
        Some(diff) => {
            writeln!(out)?;
            out.write_all(diff.as_bytes())?;
            out.flush()?;
        }
    }
    Ok(())
}
