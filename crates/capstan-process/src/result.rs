//! Run result record

use std::fmt;

/// The outcome of a completed run
///
/// Immutable once built and returned by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, present only when the child was confirmed to have exited
    /// and reported one. Absent on start failure, forced kill after the time
    /// budget, an unresponsive child, or signal death. An absent code means
    /// the run did not complete cleanly and `output`/`error` may be partial.
    pub exit_code: Option<i32>,
    /// Accumulated standard output text
    pub output: String,
    /// Accumulated standard error text
    pub error: String,
    /// True only if both streams signalled closure before the run concluded.
    /// When false the captured text may be incomplete.
    pub streams_drained: bool,
}

impl ProcessResult {
    /// Result for a child that never started
    pub(crate) fn start_failure() -> Self {
        Self {
            exit_code: None,
            output: String::new(),
            error: String::new(),
            streams_drained: false,
        }
    }

    /// True when the child exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Renders the output text on success, otherwise the error text (falling
/// back to the output text when the error text is blank).
impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success() || self.error.trim().is_empty() {
            f.write_str(&self.output)
        } else {
            f.write_str(&self.error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: Option<i32>, output: &str, error: &str) -> ProcessResult {
        ProcessResult {
            exit_code,
            output: output.to_string(),
            error: error.to_string(),
            streams_drained: true,
        }
    }

    #[test]
    fn test_success_requires_zero_exit() {
        assert!(result(Some(0), "", "").success());
        assert!(!result(Some(1), "", "").success());
        assert!(!result(None, "", "").success());
    }

    #[test]
    fn test_display_prefers_output_on_success() {
        assert_eq!(result(Some(0), "ok\n", "noise\n").to_string(), "ok\n");
    }

    #[test]
    fn test_display_prefers_error_on_failure() {
        assert_eq!(result(Some(2), "partial\n", "boom\n").to_string(), "boom\n");
    }

    #[test]
    fn test_display_falls_back_to_output_when_error_blank() {
        assert_eq!(result(Some(2), "partial\n", "  \n").to_string(), "partial\n");
    }
}
