mod commands;
mod error;

use clap::{Parser, Subcommand};

use crate::commands::{DiffArgs, DiffCommand, RunArgs, RunCommand};

#[derive(Parser)]
#[command(
    name = "synbench",
    version,
    about = "Run synthesis benchmarks, tabulate the results and diff against an oracle log"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every benchmark of a suite sequentially and write the reports
    Run(RunArgs),
    /// Diff a combined log against an oracle log
    Diff(DiffArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Run(args) => RunCommand::execute(args),
        Commands::Diff(args) => DiffCommand::execute(args),
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}
