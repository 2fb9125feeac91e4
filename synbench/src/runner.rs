//! Invocation of the tool under test.
//!
//! Every invocation appends its combined stdout/stderr to one shared log
//! file. The child runs in its own process group so that a timeout can take
//! down anything it spawned.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

#[cfg(unix)]
use nix::sys::signal::{Signal, kill, killpg};
#[cfg(unix)]
use nix::unistd::{Pid, getpgid};
#[cfg(unix)]
use std::os::unix::process::CommandExt;

use serde::{Serialize, Serializer};

use crate::{
    catalog::BenchmarkEntry,
    error::{Error, Result},
    metrics::MetricSet,
    suite::SuiteConfig,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);
/// Upper bound on the output read back for metric extraction.
const TAIL_BYTES: u64 = 64 * 1024;

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Exited with the given code (`None` when terminated by a signal).
    Exited(Option<i32>),
    TimedOut,
    SpawnFailed(String),
}

impl RunStatus {
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self, RunStatus::Exited(Some(0)))
    }

    fn from_exit(status: ExitStatus) -> Self {
        RunStatus::Exited(status.code())
    }
}

/// The recorded result of running one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricSet>,
}

impl RunOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

fn serialize_secs<S: Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// A finished invocation: its outcome and the tail of what it printed.
#[derive(Debug)]
pub struct Invocation {
    pub outcome: RunOutcome,
    pub tail: String,
}

#[derive(Debug, Clone)]
pub struct Runner {
    tool: PathBuf,
    common_opts: Vec<String>,
    input_extension: String,
    timeout: Duration,
    grace_period: Duration,
    log_path: PathBuf,
}

impl Runner {
    #[must_use]
    pub fn new(tool: PathBuf, log_path: PathBuf, timeout: Duration) -> Self {
        Self {
            tool,
            common_opts: Vec::new(),
            input_extension: "sq".to_string(),
            timeout,
            grace_period: DEFAULT_GRACE_PERIOD,
            log_path,
        }
    }

    #[must_use]
    pub fn from_suite(config: &SuiteConfig, log_path: PathBuf) -> Self {
        Self::new(config.tool.clone(), log_path, config.timeout())
            .with_common_opts(config.common_opts.clone())
            .with_input_extension(config.input_extension.clone())
    }

    #[must_use]
    pub fn with_common_opts(mut self, opts: Vec<String>) -> Self {
        self.common_opts = opts;
        self
    }

    #[must_use]
    pub fn with_input_extension(mut self, extension: String) -> Self {
        self.input_extension = extension;
        self
    }

    /// Time between SIGTERM and SIGKILL when a run times out.
    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Arguments after the executable: common options, the entry's own
    /// options, then the input file.
    #[must_use]
    pub fn arguments(&self, entry: &BenchmarkEntry) -> Vec<String> {
        self.common_opts
            .iter()
            .chain(&entry.args)
            .cloned()
            .chain(std::iter::once(entry.input_path(&self.input_extension)))
            .collect()
    }

    /// Truncate the shared log. Called once before the first invocation.
    pub fn reset_log(&self) -> Result<()> {
        File::create(&self.log_path)?;
        Ok(())
    }

    /// Run one benchmark to completion or timeout.
    ///
    /// Spawn failures are reported through [`RunStatus::SpawnFailed`];
    /// only problems with the log file or with waiting on the child are
    /// returned as errors.
    pub fn run(&self, entry: &BenchmarkEntry) -> Result<Invocation> {
        let mut log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        let start_offset = log_file.seek(SeekFrom::End(0))?;
        let log_clone = log_file.try_clone()?;

        let mut command = Command::new(&self.tool);
        command.args(self.arguments(entry));

        #[cfg(unix)]
        command.process_group(0);

        let start = Instant::now();
        let status = match command
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_clone))
            .spawn()
        {
            Ok(mut child) => self.wait_with_timeout(&mut child, start, &entry.name)?,
            Err(e) => {
                log::warn!(
                    "{}: failed to start {}: {e}",
                    entry.name,
                    self.tool.display()
                );
                RunStatus::SpawnFailed(e.to_string())
            }
        };
        let elapsed = start.elapsed();

        let tail = if status.success() {
            read_tail(&self.log_path, start_offset)?
        } else {
            String::new()
        };

        Ok(Invocation {
            outcome: RunOutcome {
                elapsed,
                status,
                metrics: None,
            },
            tail,
        })
    }

    fn wait_with_timeout(
        &self,
        child: &mut Child,
        start: Instant,
        name: &str,
    ) -> Result<RunStatus> {
        let deadline = start + self.timeout;
        loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|e| Error::Process(format!("failed to poll {name}: {e}")))?
            {
                return Ok(RunStatus::from_exit(status));
            }

            if Instant::now() >= deadline {
                log::warn!(
                    "{name}: timed out after {:.2}s, terminating",
                    self.timeout.as_secs_f64()
                );
                kill_process_tree(child, self.grace_period);
                return Ok(RunStatus::TimedOut);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Read what was appended to `path` after `offset`, capped at the last
/// [`TAIL_BYTES`] bytes.
fn read_tail(path: &Path, offset: u64) -> io::Result<String> {
    let mut file = File::open(path)?;
    let end = file.seek(SeekFrom::End(0))?;
    let from = offset.max(end.saturating_sub(TAIL_BYTES));
    file.seek(SeekFrom::Start(from))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Terminate a process and everything in its process group.
///
/// Sends SIGTERM first, waits `grace`, then SIGKILL if needed.
#[cfg(unix)]
fn kill_process_tree(child: &mut Child, grace: Duration) {
    let Ok(raw_pid) = i32::try_from(child.id()) else {
        let _ = child.kill();
        let _ = child.wait();
        return;
    };
    let pid = Pid::from_raw(raw_pid);

    let Ok(pgid) = getpgid(Some(pid)) else {
        let _ = kill(pid, Signal::SIGTERM);
        wait_for_exit(child, grace);
        if child.try_wait().ok().flatten().is_none() {
            let _ = kill(pid, Signal::SIGKILL);
        }
        let _ = child.wait();
        return;
    };

    let _ = killpg(pgid, Signal::SIGTERM);
    wait_for_exit(child, grace);
    if child.try_wait().ok().flatten().is_none() {
        let _ = killpg(pgid, Signal::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child, _grace: Duration) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Poll until the child exits or `grace` has passed.
#[cfg(unix)]
fn wait_for_exit(child: &mut Child, grace: Duration) {
    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if child.try_wait().ok().flatten().is_some() {
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
}
