use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::Args;
use synbench::{Harness, RunSummary, Runner, SuiteConfig, report};

use crate::{
    commands::diff::print_oracle_diff,
    error::{CliError, Result},
};

#[derive(Args)]
pub struct RunArgs {
    #[arg(long, help = "Path to the benchmark suite YAML")]
    pub suite: PathBuf,
    #[arg(long, help = "Override the synthesis tool executable")]
    pub tool: Option<PathBuf>,
    #[arg(long, help = "Override the per-benchmark timeout in seconds")]
    pub timeout: Option<u64>,
    #[arg(
        long,
        default_value = ".",
        help = "Directory for the log, the reports and the oracle lookup"
    )]
    pub output: PathBuf,
    #[arg(long, help = "Only run this benchmark (repeatable)")]
    pub only: Vec<String>,
    #[arg(long, default_value_t = false, help = "Skip the oracle diff")]
    pub no_diff: bool,
}

pub struct RunCommand;

impl RunCommand {
    pub fn execute(args: &RunArgs) -> Result<()> {
        let stdout = io::stdout();
        let mut console = stdout.lock();
        run_suite(args, &mut console)
    }
}

fn load_config(args: &RunArgs) -> Result<SuiteConfig> {
    let mut config = SuiteConfig::load(&args.suite)?;
    if let Some(tool) = &args.tool {
        config.tool.clone_from(tool);
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }

    if config.timeout_secs == 0 {
        return Err(CliError::InvalidInput(
            "timeout must be greater than zero".to_string(),
        ));
    }
    Ok(config)
}

fn run_suite(args: &RunArgs, console: &mut dyn Write) -> Result<()> {
    let config = load_config(args)?;
    let catalog = config.catalog()?;
    if catalog.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "suite {} has no benchmarks",
            args.suite.display()
        )));
    }
    if let Some(unknown) = args
        .only
        .iter()
        .find(|name| !catalog.entries().iter().any(|e| &e.name == *name))
    {
        return Err(CliError::InvalidInput(format!(
            "benchmark {unknown} is not in {}",
            args.suite.display()
        )));
    }

    fs::create_dir_all(&args.output)?;
    let resolve = |path: &Path| args.output.join(path);

    let runner = Runner::from_suite(&config, resolve(&config.log_file));
    let harness = Harness::new(&catalog, runner)
        .extract_metrics(config.extract_metrics)
        .only(args.only.iter().cloned());
    let summary = harness.run(console)?;

    write_reports(&config, &catalog, &summary, &resolve)?;

    if !args.no_diff {
        print_oracle_diff(
            &resolve(&config.oracle),
            harness.runner().log_path(),
            console,
        )?;
    }

    if summary.is_clean() {
        Ok(())
    } else {
        Err(CliError::MalformedOutput(summary.metric_errors.len()))
    }
}

fn write_reports(
    config: &SuiteConfig,
    catalog: &synbench::Catalog,
    summary: &RunSummary,
    resolve: &dyn Fn(&Path) -> PathBuf,
) -> Result<()> {
    let csv_path = resolve(&config.csv_file);
    fs::write(&csv_path, report::render_flat(catalog, &summary.store))?;
    log::info!("Wrote flat report to {}", csv_path.display());

    if let Some(table_file) = &config.table_file {
        let table_path = resolve(table_file);
        fs::write(&table_path, report::render_table(catalog, &summary.store))?;
        log::info!("Wrote table report to {}", table_path.display());
    }

    if let Some(json_file) = &config.summary_json {
        let json_path = resolve(json_file);
        let json = summary.store.to_json().map_err(synbench::Error::from)?;
        fs::write(&json_path, json)?;
        log::info!("Wrote result summary to {}", json_path.display());
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::commands::tests::make_temp_dir;

    const TOOL: &str = r#"
case "$1" in
  Int-Add.sq)
    echo "add = \x y . x + y"
    printf '(Size: 3)\n(Spec size: 5)\n(#measures: 1)\n(#components: 2)\n'
    ;;
  abstract/List-Fold.sq)
    printf '(Size: 11)\n(Spec size: 4)\n(#measures: 1)\n(#components: 0)\n'
    ;;
  *)
    exit 1
    ;;
esac
"#;

    fn write_suite(dir: &Path) -> PathBuf {
        let script = dir.join("tool.sh");
        fs::write(&script, TOOL).unwrap();
        let suite = dir.join("suite.yaml");
        fs::write(
            &suite,
            format!(
                r"
tool: /bin/sh
common_opts: ['{}']
timeout_secs: 5
table_file: run_all.tex
summary_json: summary.json
groups:
  - category: Integer
    benchmarks:
      - {{ name: Int-Max2, label: maximum of 2 elements }}
      - {{ name: Int-Add, label: addition }}
sections:
  - title: Abstract refinements
    prefix: abstract/
    summarize: true
    benchmarks:
      - {{ name: List-Fold }}
components:
  Int-Add: integer
",
                script.display()
            ),
        )
        .unwrap();
        suite
    }

    fn args(dir: &Path, suite: PathBuf) -> RunArgs {
        RunArgs {
            suite,
            tool: None,
            timeout: None,
            output: dir.join("out"),
            only: Vec::new(),
            no_diff: false,
        }
    }

    #[test]
    fn run_writes_all_reports() {
        let dir = make_temp_dir("synbench-cli-run");
        let suite = write_suite(&dir);
        let args = args(&dir, suite);

        let mut console: Vec<u8> = Vec::new();
        run_suite(&args, &mut console).unwrap();

        let out = dir.join("out");
        let csv = fs::read_to_string(out.join("run_all.csv")).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Int-Max2,");
        assert!(lines[1].starts_with("Int-Add,") && lines[1].ends_with(','));
        assert!(lines[2].starts_with("List-Fold,"));

        let table = fs::read_to_string(out.join("run_all.tex")).unwrap();
        assert!(table.starts_with("\\multirow{2}{*}[-2pt]{\\rotatebox{90}{Integer}}\n"));
        assert!(table.contains(" & addition &  & 1 & 2 & integer & 3 & "));
        assert!(!table.contains("maximum of 2 elements"));
        assert!(table.contains("List-Fold, "));

        let json = fs::read_to_string(out.join("summary.json")).unwrap();
        assert!(json.contains("\"Int-Add\""));
        assert!(!json.contains("\"Int-Max2\""));

        let console = String::from_utf8(console).unwrap();
        assert!(console.contains("Abstract refinements\n"));
    }

    #[test]
    fn oracle_diff_follows_the_run() {
        let dir = make_temp_dir("synbench-cli-oracle");
        let suite = write_suite(&dir);
        let args = args(&dir, suite);
        fs::create_dir_all(&args.output).unwrap();
        fs::write(args.output.join("oracle_nx"), "(Size: 2)\n").unwrap();
        fs::write(args.output.join("oracle"), "(Size: 2)\n").unwrap();

        let mut console: Vec<u8> = Vec::new();
        run_suite(&args, &mut console).unwrap();

        let console = String::from_utf8(console).unwrap();
        assert!(console.contains("\n-(Size: 2)\n"));
        assert!(console.contains("\n+(Size: 3)\n"));
    }

    #[test]
    fn malformed_output_fails_after_reports() {
        let dir = make_temp_dir("synbench-cli-malformed");
        let suite = write_suite(&dir);
        let mut args = args(&dir, suite);
        // Every benchmark succeeds but prints nothing.
        args.tool = Some(PathBuf::from("/bin/true"));

        let result = run_suite(&args, &mut io::sink());
        assert!(matches!(result, Err(CliError::MalformedOutput(3))));
        let csv = fs::read_to_string(dir.join("out").join("run_all.csv")).unwrap();
        assert_eq!(csv, "Int-Max2,\nInt-Add,\nList-Fold,\n");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = make_temp_dir("synbench-cli-timeout");
        let suite = write_suite(&dir);
        let mut args = args(&dir, suite);
        args.timeout = Some(0);
        assert!(matches!(
            run_suite(&args, &mut io::sink()),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_only_name_is_rejected() {
        let dir = make_temp_dir("synbench-cli-only");
        let suite = write_suite(&dir);
        let mut args = args(&dir, suite);
        args.only = vec!["List-Nope".to_string()];
        assert!(matches!(
            run_suite(&args, &mut io::sink()),
            Err(CliError::InvalidInput(_))
        ));
    }
}
