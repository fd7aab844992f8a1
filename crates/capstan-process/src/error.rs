//! Error types for process execution

use std::io;
use thiserror::Error;

/// Process execution errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Spec rejected before any OS interaction
    #[error("Invalid process spec: {0}")]
    InvalidSpec(String),

    /// The OS could not launch the executable
    #[error("Failed to start process: {0}")]
    StartFailed(#[from] io::Error),
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;
