//! Error types for discovery and launching.

use crate::process::ProcessError;

/// Recoverable scanner failure. Never propagates past the registry.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("helper tool error: {0}")]
    Helper(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure while launching a game from a background task.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("no launch target for '{0}'")]
    NoTarget(String),

    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    #[error("launcher exited with code {0}")]
    ExitCode(i32),
}
