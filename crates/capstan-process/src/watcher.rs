//! Exit detection and the timeout state machine

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

/// Pause between SIGTERM and SIGKILL on the forced-kill path (Unix)
#[cfg(unix)]
const SIGKILL_ESCALATION: Duration = Duration::from_millis(200);

/// Liveness of the watched child
#[derive(Debug, Clone, Copy)]
pub(crate) enum ExitState {
    /// Still being polled
    Running,
    /// Confirmed exit with its status
    Exited(ExitStatus),
    /// Forcibly terminated after the time budget elapsed
    Killed,
    /// Termination had no visible effect within the grace window
    Unresponsive,
}

/// Polls child liveness in bounded slices and owns the timeout/kill decision.
///
/// Owns the child handle; dropping the watcher on any path releases it (the
/// handle is spawned with `kill_on_drop`, so an unresponsive leftover is
/// reaped by the runtime).
pub(crate) struct ExitWatcher {
    child: Child,
    deadline: Instant,
    poll_interval: Duration,
    kill_grace: Duration,
    state: ExitState,
}

impl ExitWatcher {
    pub(crate) fn new(
        child: Child,
        budget: Duration,
        poll_interval: Duration,
        kill_grace: Duration,
    ) -> Self {
        Self {
            child,
            deadline: Instant::now() + budget,
            poll_interval,
            kill_grace,
            state: ExitState::Running,
        }
    }

    /// Drive the state machine until it leaves `Running`
    pub(crate) async fn watch(&mut self) -> ExitState {
        while matches!(self.state, ExitState::Running) {
            self.step().await;
        }
        self.state
    }

    /// One bounded wait slice, or the kill phase once the budget is spent
    async fn step(&mut self) {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            self.state = self.kill().await;
            return;
        }

        let slice = remaining.min(self.poll_interval);
        match timeout(slice, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(code = ?status.code(), "Child exited");
                self.state = ExitState::Exited(status);
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Waiting on child failed");
                self.state = ExitState::Killed;
            }
            // Slice elapsed without an exit: keep polling
            Err(_) => {}
        }
    }

    /// Forced termination with escalation. Failures are swallowed: the run
    /// must return a result whether or not the kill lands.
    async fn kill(&mut self) -> ExitState {
        warn!(pid = ?self.child.id(), "Time budget elapsed, killing child");

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                warn!(pid = %pid, error = %e, "Failed to send SIGTERM");
            }
            tokio::time::sleep(SIGKILL_ESCALATION).await;
        }

        if let Err(e) = self.child.start_kill() {
            warn!(error = %e, "Failed to kill child");
        }

        match timeout(self.kill_grace, self.child.wait()).await {
            Ok(_) => ExitState::Killed,
            Err(_) => {
                warn!(pid = ?self.child.id(), "Child survived the kill grace window");
                ExitState::Unresponsive
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn spawn(program: &str, args: &[&str]) -> Child {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fast_exit_is_observed() {
        let child = spawn("echo", &["hello"]);
        let mut watcher = ExitWatcher::new(
            child,
            Duration::from_secs(10),
            Duration::from_secs(5),
            Duration::from_secs(5),
        );

        match watcher.watch().await {
            ExitState::Exited(status) => assert_eq!(status.code(), Some(0)),
            other => panic!("expected Exited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_budget_expiry_kills_child() {
        let child = spawn("sleep", &["30"]);
        let mut watcher = ExitWatcher::new(
            child,
            Duration::from_millis(100),
            Duration::from_secs(5),
            Duration::from_secs(5),
        );

        let start = Instant::now();
        let state = watcher.watch().await;
        assert!(matches!(state, ExitState::Killed), "got {state:?}");
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_polling_spans_multiple_slices() {
        let child = spawn("sleep", &["1"]);
        let mut watcher = ExitWatcher::new(
            child,
            Duration::from_secs(30),
            Duration::from_millis(200),
            Duration::from_secs(5),
        );

        match watcher.watch().await {
            ExitState::Exited(status) => assert!(status.success()),
            other => panic!("expected Exited, got {other:?}"),
        }
    }
}
