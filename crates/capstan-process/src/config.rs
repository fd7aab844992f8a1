//! Process specification

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ProcessError, Result};

/// Default time budget for a run when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Which child stream a line arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Callback invoked once per received line, tagged with its stream.
///
/// Calls interleave across the two streams in arrival order; within a single
/// stream the order matches the child's write order.
pub type LineCallback = Arc<dyn Fn(StreamKind, &str) + Send + Sync>;

/// Description of a process to launch
///
/// Pure configuration, consumed by [`ProcessRunner::run`](crate::ProcessRunner::run).
#[derive(Clone)]
pub struct ProcessSpec {
    /// Executable path
    pub command: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Working directory (None = inherit)
    pub working_dir: Option<PathBuf>,
    /// Overall time budget for the run
    pub timeout: Duration,
    /// Optional live line callback
    pub on_line: Option<LineCallback>,
}

impl ProcessSpec {
    /// Create a new spec for `command` with the default timeout
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: vec![],
            working_dir: None,
            timeout: DEFAULT_TIMEOUT,
            on_line: None,
        }
    }

    /// Set command arguments
    ///
    /// Arguments are flattened through a single space-joined string before
    /// spawning, so an argument containing embedded whitespace reaches the
    /// child as multiple arguments and shell metacharacters are passed
    /// through unescaped. Callers needing exact argument boundaries must not
    /// put whitespace inside a single argument.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set timeout duration
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// Set the live line callback
    pub fn on_line(mut self, callback: impl Fn(StreamKind, &str) + Send + Sync + 'static) -> Self {
        self.on_line = Some(Arc::new(callback));
        self
    }

    /// Reject specs that cannot be launched, before any OS interaction
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(ProcessError::InvalidSpec(
                "executable path is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The OS-level argument vector: space-joined, then re-split on whitespace
    pub(crate) fn flattened_args(&self) -> Vec<String> {
        let joined = self.args.join(" ");
        joined.split_whitespace().map(str::to_owned).collect()
    }
}

impl fmt::Debug for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSpec")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("working_dir", &self.working_dir)
            .field("timeout", &self.timeout)
            .field("on_line", &self.on_line.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_rejected() {
        assert!(ProcessSpec::new("").validate().is_err());
        assert!(ProcessSpec::new("   ").validate().is_err());
        assert!(ProcessSpec::new("echo").validate().is_ok());
    }

    #[test]
    fn test_default_timeout_is_finite() {
        let spec = ProcessSpec::new("echo");
        assert_eq!(spec.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_flatten_splits_embedded_whitespace() {
        let spec = ProcessSpec::new("printf").args(["%s", "one two"]);
        assert_eq!(spec.flattened_args(), vec!["%s", "one", "two"]);
    }

    #[test]
    fn test_flatten_preserves_plain_arguments() {
        let spec = ProcessSpec::new("git").args(["status", "--short"]);
        assert_eq!(spec.flattened_args(), vec!["status", "--short"]);
    }
}
