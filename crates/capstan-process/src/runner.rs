//! Run orchestration

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::collector::StreamCollector;
use crate::config::{ProcessSpec, StreamKind};
use crate::error::{ProcessError, Result};
use crate::result::ProcessResult;
use crate::watcher::{ExitState, ExitWatcher};

/// Default bounded wait slice while polling for exit
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default grace window for a forced kill to take effect
const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);
/// Default wait for stream closure after a confirmed exit
const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Runs process specs to completion.
///
/// Spawns the child, drains both output streams concurrently with the exit
/// wait, and assembles a [`ProcessResult`]. The wait intervals are tunable;
/// the defaults suit shelling out to ordinary command-line tools.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    poll_interval: Duration,
    kill_grace: Duration,
    drain_grace: Duration,
}

impl ProcessRunner {
    /// Create a runner with default wait intervals
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            kill_grace: DEFAULT_KILL_GRACE,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }

    /// Override the bounded wait slice used while polling for exit
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the grace window for a forced kill to take effect
    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Override the wait for stream closure after a confirmed exit
    pub fn drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Run a spec to completion and return the captured outcome.
    ///
    /// The only propagated error is an invalid spec. A child that cannot be
    /// started, overruns its time budget, or dies to a signal is reported
    /// through the result's absent exit code, never as an `Err`.
    ///
    /// # Examples
    /// ```no_run
    /// use capstan_process::{ProcessRunner, ProcessSpec};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let result = ProcessRunner::new()
    ///     .run(ProcessSpec::new("echo").args(["hello"]))
    ///     .await?;
    /// assert_eq!(result.exit_code, Some(0));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self, spec: ProcessSpec) -> Result<ProcessResult> {
        spec.validate()?;

        debug!(command = %spec.command, args = ?spec.args, "Spawning process");

        let mut child = match self.spawn_child(&spec) {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %spec.command, error = %e, "Failed to start process");
                return Ok(ProcessResult::start_failure());
            }
        };

        info!(pid = ?child.id(), command = %spec.command, "Process spawned");

        let out = match child.stdout.take() {
            Some(handle) => StreamCollector::spawn(StreamKind::Stdout, handle, spec.on_line.clone()),
            None => StreamCollector::finished(),
        };
        let err = match child.stderr.take() {
            Some(handle) => StreamCollector::spawn(StreamKind::Stderr, handle, spec.on_line.clone()),
            None => StreamCollector::finished(),
        };

        let mut watcher = ExitWatcher::new(child, spec.timeout, self.poll_interval, self.kill_grace);
        let state = watcher.watch().await;

        let (exit_code, streams_drained) = match state {
            ExitState::Exited(status) => {
                let drained = timeout(self.drain_grace, async {
                    out.closed().await;
                    err.closed().await;
                })
                .await
                .is_ok();
                if !drained {
                    warn!(command = %spec.command, "Streams still open after exit, output may be partial");
                }
                (status.code(), drained)
            }
            // Abandoned run: keep whatever text the collectors managed to
            // capture, but never vouch for its completeness
            _ => (None, false),
        };

        let result = ProcessResult {
            exit_code,
            output: out.snapshot(),
            error: err.snapshot(),
            streams_drained,
        };

        debug!(
            command = %spec.command,
            code = ?result.exit_code,
            drained = result.streams_drained,
            "Run complete"
        );

        Ok(result)
    }

    /// Run `program` with `args` and otherwise default settings
    pub async fn run_command<I, S>(&self, program: impl Into<String>, args: I) -> Result<ProcessResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(ProcessSpec::new(program).args(args)).await
    }

    /// Run `program` with `args` from `working_dir`
    pub async fn run_in<I, S>(
        &self,
        program: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        args: I,
    ) -> Result<ProcessResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(ProcessSpec::new(program).args(args).working_dir(working_dir))
            .await
    }

    fn spawn_child(&self, spec: &ProcessSpec) -> Result<Child> {
        let mut cmd = Command::new(&spec.command);
        cmd.args(spec.flattened_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(windows)]
        {
            // CREATE_NO_WINDOW: never pop a console window for the child
            cmd.creation_flags(0x0800_0000);
        }

        cmd.spawn().map_err(ProcessError::StartFailed)
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}
