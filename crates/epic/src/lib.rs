//! Epic Games Store integration: launcher manifests and the `legendary`
//! helper CLI.

pub mod legendary;
pub mod manifest;
pub mod scanner;

pub use legendary::{EpicGameInfo, LegendaryClient, LegendaryLauncher, Progress};
pub use manifest::{ItemManifest, default_manifest_dir};
pub use scanner::{EpicScanner, default_filter};

use std::path::PathBuf;

use multilauncher_library::{ProcessError, ScanError};

/// Errors for Epic operations.
#[derive(Debug, thiserror::Error)]
pub enum EpicError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    #[error("'{command}' exited with code {code}")]
    HelperFailed { command: String, code: i32 },

    #[error("legendary not found at {}", .0.display())]
    NotAvailable(PathBuf),

    #[error("authorization code is empty")]
    EmptyCode,
}

impl From<EpicError> for ScanError {
    fn from(e: EpicError) -> Self {
        match e {
            EpicError::Io(io) => ScanError::Io(io),
            EpicError::Json(json) => ScanError::Parse {
                source_name: "epic".into(),
                message: json.to_string(),
            },
            other => ScanError::Helper(other.to_string()),
        }
    }
}
