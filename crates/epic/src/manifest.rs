//! Epic Games Launcher `.item` manifests.
//!
//! Each installed title has one JSON file in the launcher's `Manifests`
//! directory. Only a handful of its fields matter here.

use std::fs;
use std::path::{Path, PathBuf};

use multilauncher_library::{GameRecord, LauncherKind};
use serde::Deserialize;

use crate::EpicError;

/// Fields read from one `.item` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemManifest {
    pub display_name: String,
    pub install_location: String,
    pub launch_executable: String,
    #[serde(default)]
    pub app_name: Option<String>,
}

impl ItemManifest {
    /// Absolute path of the game executable.
    pub fn executable_path(&self) -> PathBuf {
        Path::new(&self.install_location).join(&self.launch_executable)
    }

    /// Process image name: the file name of `LaunchExecutable`.
    pub fn executable_name(&self) -> String {
        Path::new(&self.launch_executable)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn into_record(self) -> GameRecord {
        let target = self.executable_path().to_string_lossy().into_owned();
        let exe = self.executable_name();
        GameRecord::new(self.display_name, LauncherKind::Epic, target)
            .with_executable(exe)
            .with_platform_key(self.app_name.unwrap_or_default())
    }
}

/// Parses one manifest. Missing or non-string required fields are errors.
pub fn parse_item(text: &str) -> Result<ItemManifest, EpicError> {
    Ok(serde_json::from_str(text)?)
}

/// Collects the `*.item` files from a directory listing, sorted by path.
pub fn item_files(entries: fs::ReadDir) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "item") && p.is_file())
        .collect();
    files.sort();
    files
}

/// Default manifest directory of the Epic Games Launcher.
///
/// Only Windows has one; elsewhere the directory must be configured.
pub fn default_manifest_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let program_data =
            std::env::var("PROGRAMDATA").unwrap_or_else(|_| r"C:\ProgramData".to_string());
        Some(
            PathBuf::from(program_data)
                .join("Epic")
                .join("EpicGamesLauncher")
                .join("Data")
                .join("Manifests"),
        )
    }

    #[cfg(not(target_os = "windows"))]
    {
        None
    }
}
