//! Steam library discovery: install roots, app manifests and playtime.

pub mod library;
pub mod paths;
#[cfg(target_os = "linux")]
pub mod paths_linux;
#[cfg(target_os = "windows")]
pub mod paths_windows;
pub mod playtime;
pub mod scanner;
pub mod vdf;

pub use library::{AppManifest, library_roots, parse_app_manifest};
pub use paths::Paths;
pub use playtime::read_playtime;
pub use scanner::{SteamScanner, default_filter};

use multilauncher_library::ScanError;

/// Failures reading a Steam installation.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("no Steam installation found")]
    NotFound,

    #[error("malformed VDF: {0}")]
    Vdf(String),

    #[error("invalid app manifest: {0}")]
    Manifest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<SteamError> for ScanError {
    fn from(e: SteamError) -> Self {
        match e {
            SteamError::Io(io) => ScanError::Io(io),
            SteamError::NotFound => ScanError::Config(e.to_string()),
            SteamError::Vdf(message) | SteamError::Manifest(message) => ScanError::Parse {
                source_name: "steam".into(),
                message,
            },
        }
    }
}
