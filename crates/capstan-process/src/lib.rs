//! # capstan-process
//!
//! **Purpose**: Run an external executable, capture its stdout and stderr in
//! full, and get the outcome back as data.
//!
//! Provides process spawning with concurrent stream draining, an overall time
//! budget with escalating forced termination, and a structured result
//! describing exit status and captured text.
//!
//! ## Features
//!
//! - **Structured Results**: Exit code, full stdout/stderr text, and a
//!   drained flag signalling whether both streams closed cleanly
//! - **Deadlock-Free Capture**: Both streams are drained concurrently with
//!   the exit wait, so a child flooding a pipe buffer can never hang the run
//! - **Time Budget**: Bounded-slice exit polling with a forced kill
//!   (SIGTERM→SIGKILL escalation on Unix) once the budget is spent
//! - **Live Lines**: Optional per-line callback invoked in arrival order
//!   across both streams
//!
//! ## Usage
//!
//! ```rust,no_run
//! use capstan_process::{ProcessRunner, ProcessSpec};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = ProcessRunner::new();
//!
//! let spec = ProcessSpec::new("git")
//!     .args(["status", "--short"])
//!     .timeout_secs(30);
//!
//! let result = runner.run(spec).await?;
//! if result.success() {
//!     print!("{}", result.output);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Known limitation
//!
//! Arguments are flattened through a single space-joined string before being
//! handed to the OS, so an argument containing embedded whitespace reaches
//! the child as multiple arguments. See [`ProcessSpec::args`].

pub mod config;
pub mod error;
pub mod result;
pub mod runner;

mod collector;
mod watcher;

pub use config::{LineCallback, ProcessSpec, StreamKind, DEFAULT_TIMEOUT};
pub use error::{ProcessError, Result};
pub use result::ProcessResult;
pub use runner::ProcessRunner;
