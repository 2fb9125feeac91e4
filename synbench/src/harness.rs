//! The sequential run loop: one invocation per catalog entry, in order.

use std::{collections::HashSet, io::Write};

use crate::{
    catalog::{BenchmarkEntry, Catalog},
    error::{Error, Result},
    metrics,
    runner::{RunStatus, Runner},
    store::ResultStore,
};

/// What a full pass over the catalog produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub store: ResultStore,
    /// Benchmarks that failed, timed out or could not be started.
    pub failed: Vec<String>,
    /// Successful runs whose output did not carry the expected metrics.
    pub metric_errors: Vec<Error>,
}

impl RunSummary {
    /// True when the tool's output always matched the expected format.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.metric_errors.is_empty()
    }
}

pub struct Harness<'a> {
    catalog: &'a Catalog,
    runner: Runner,
    extract_metrics: bool,
    only: Option<HashSet<String>>,
}

impl<'a> Harness<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, runner: Runner) -> Self {
        Self {
            catalog,
            runner,
            extract_metrics: true,
            only: None,
        }
    }

    #[must_use]
    pub fn extract_metrics(mut self, enabled: bool) -> Self {
        self.extract_metrics = enabled;
        self
    }

    /// Restrict the run to the named benchmarks. An empty list runs everything.
    #[must_use]
    pub fn only<I: IntoIterator<Item = String>>(mut self, names: I) -> Self {
        let names: HashSet<String> = names.into_iter().collect();
        self.only = (!names.is_empty()).then_some(names);
        self
    }

    #[must_use]
    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    fn selected(&self, entry: &BenchmarkEntry) -> bool {
        self.only
            .as_ref()
            .is_none_or(|names| names.contains(&entry.name))
    }

    /// Run every selected entry, writing progress lines to `console`.
    ///
    /// The shared log is truncated first. Failed runs and metric format
    /// errors are recorded in the summary and do not stop the loop; only
    /// I/O problems with the log or the console abort it.
    pub fn run(&self, console: &mut dyn Write) -> Result<RunSummary> {
        self.runner.reset_log()?;
        log::info!(
            "running {} benchmarks, log at {}",
            self.catalog.len(),
            self.runner.log_path().display()
        );

        let mut summary = RunSummary::default();
        let mut section: Option<&str> = None;
        for entry in self.catalog.entries() {
            if !self.selected(entry) {
                log::debug!("skipping {}", entry.name);
                continue;
            }

            if entry.section.as_deref() != section {
                section = entry.section.as_deref();
                if let Some(title) = section {
                    writeln!(console, "{title}")?;
                }
            }

            write!(console, "{} ", entry.name)?;
            console.flush()?;

            let invocation = self.runner.run(entry)?;
            let mut outcome = invocation.outcome;
            writeln!(
                console,
                "{:.2} {}",
                outcome.elapsed_secs(),
                if outcome.success() { "OK" } else { "FAIL" }
            )?;

            if !outcome.success() {
                match &outcome.status {
                    RunStatus::Exited(Some(code)) => {
                        log::warn!("{} exited with status {code}", entry.name);
                    }
                    RunStatus::Exited(None) => log::warn!("{} killed by a signal", entry.name),
                    RunStatus::TimedOut => log::warn!("{} timed out", entry.name),
                    RunStatus::SpawnFailed(reason) => {
                        log::warn!("{} could not be started: {reason}", entry.name);
                    }
                }
                summary.failed.push(entry.name.clone());
                continue;
            }

            if self.extract_metrics {
                match metrics::extract(&invocation.tail) {
                    Ok(metrics) => outcome.metrics = Some(metrics),
                    Err(source) => {
                        log::error!(
                            "{}: tool output does not end with the expected size annotations: {source}",
                            entry.name
                        );
                        summary.metric_errors.push(Error::Metrics {
                            name: entry.name.clone(),
                            source,
                        });
                        continue;
                    }
                }
            }

            summary.store.insert(entry.name.clone(), outcome);
        }

        log::info!(
            "{} succeeded, {} failed, {} with malformed metrics",
            summary.store.len(),
            summary.failed.len(),
            summary.metric_errors.len()
        );
        Ok(summary)
    }
}
