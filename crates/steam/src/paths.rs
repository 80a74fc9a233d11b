//! Locations inside a Steam installation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::SteamError;

const STEAMAPPS: &str = "steamapps";
const USERDATA: &str = "userdata";

/// Root of a Steam installation and the files scanned beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Locates the installation for the current platform.
    pub fn new() -> Result<Self, SteamError> {
        detect_root().map(Self::with_base)
    }

    pub fn with_base(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    /// `libraryfolders.vdf`, listing the extra library roots.
    pub fn library_folders_path(&self) -> PathBuf {
        steamapps_of(&self.root).join("libraryfolders.vdf")
    }

    /// Per-account settings holding Steam's own playtime counters.
    pub fn local_config_path(&self, account: &str) -> PathBuf {
        self.root
            .join(USERDATA)
            .join(account)
            .join("config")
            .join("localconfig.vdf")
    }

    /// Numeric account directories under `userdata`, sorted.
    ///
    /// Directory `0` is skipped; Steam writes it when nobody is logged in.
    pub fn account_ids(&self) -> Result<Vec<String>, SteamError> {
        let listing = fs::read_dir(self.root.join(USERDATA)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SteamError::NotFound,
            _ => SteamError::Io(e),
        })?;

        let mut ids: Vec<String> = listing
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name != "0" && name.parse::<u64>().is_ok())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// The `steamapps` directory of any library root.
pub fn steamapps_of(library_root: &Path) -> PathBuf {
    library_root.join(STEAMAPPS)
}

#[cfg(target_os = "linux")]
fn detect_root() -> Result<PathBuf, SteamError> {
    crate::paths_linux::locate()
}

#[cfg(target_os = "windows")]
fn detect_root() -> Result<PathBuf, SteamError> {
    crate::paths_windows::locate()
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn detect_root() -> Result<PathBuf, SteamError> {
    Err(SteamError::NotFound)
}
