//! Domain types shared by scanners, the registry and consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform a game was discovered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LauncherKind {
    Steam,
    Epic,
    Gog,
}

impl LauncherKind {
    /// Returns all supported launchers in scan order.
    pub fn all() -> &'static [LauncherKind] {
        &[LauncherKind::Steam, LauncherKind::Epic, LauncherKind::Gog]
    }

    /// Short machine-friendly identifier.
    pub fn id(&self) -> &'static str {
        match self {
            LauncherKind::Steam => "steam",
            LauncherKind::Epic => "epic",
            LauncherKind::Gog => "gog",
        }
    }
}

impl fmt::Display for LauncherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LauncherKind::Steam => write!(f, "Steam"),
            LauncherKind::Epic => write!(f, "Epic Games Store"),
            LauncherKind::Gog => write!(f, "GOG Galaxy"),
        }
    }
}

/// Launch/run/download lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RuntimeStatus {
    Idle = 0,
    Launching = 1,
    Running = 2,
    Downloading = 3,
    Installing = 4,
    Error = 5,
}

impl RuntimeStatus {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => RuntimeStatus::Launching,
            2 => RuntimeStatus::Running,
            3 => RuntimeStatus::Downloading,
            4 => RuntimeStatus::Installing,
            5 => RuntimeStatus::Error,
            _ => RuntimeStatus::Idle,
        }
    }

    /// Returns true while an install or download is in flight.
    pub fn is_transfer(&self) -> bool {
        matches!(self, RuntimeStatus::Downloading | RuntimeStatus::Installing)
    }
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuntimeStatus::Idle => "idle",
            RuntimeStatus::Launching => "launching",
            RuntimeStatus::Running => "running",
            RuntimeStatus::Downloading => "downloading",
            RuntimeStatus::Installing => "installing",
            RuntimeStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Banner acquisition state, independent of [`RuntimeStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ArtworkStatus {
    NotLoaded = 0,
    Downloading = 1,
    ReadyToLoad = 2,
    Loaded = 3,
    Failed = 4,
}

impl ArtworkStatus {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => ArtworkStatus::Downloading,
            2 => ArtworkStatus::ReadyToLoad,
            3 => ArtworkStatus::Loaded,
            4 => ArtworkStatus::Failed,
            _ => ArtworkStatus::NotLoaded,
        }
    }

    /// `Loaded` and `Failed` never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ArtworkStatus::Loaded | ArtworkStatus::Failed)
    }
}

impl fmt::Display for ArtworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtworkStatus::NotLoaded => "not loaded",
            ArtworkStatus::Downloading => "downloading",
            ArtworkStatus::ReadyToLoad => "ready",
            ArtworkStatus::Loaded => "loaded",
            ArtworkStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Normalized scanner output for one title.
///
/// Scanners produce records; the registry turns each one into a [`Game`](crate::Game).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub name: String,
    pub launcher: LauncherKind,
    /// Executable path, platform launch URI, or empty when unresolved.
    pub launch_target: String,
    /// Process image name used for liveness polling.
    pub executable_name: String,
    /// Numeric id on the owning platform (Steam app id).
    pub platform_id: Option<u32>,
    /// String id on the owning platform (Epic `AppName`).
    pub platform_key: Option<String>,
}

impl GameRecord {
    /// Creates a record with the executable name derived from `name`.
    pub fn new(
        name: impl Into<String>,
        launcher: LauncherKind,
        launch_target: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let executable_name = default_executable_name(&name);
        Self {
            name,
            launcher,
            launch_target: launch_target.into(),
            executable_name,
            platform_id: None,
            platform_key: None,
        }
    }

    /// Overrides the executable name. Empty input keeps the default.
    pub fn with_executable(mut self, executable_name: impl Into<String>) -> Self {
        let exe = executable_name.into();
        if !exe.trim().is_empty() {
            self.executable_name = exe;
        }
        self
    }

    pub fn with_platform_id(mut self, id: u32) -> Self {
        self.platform_id = Some(id);
        self
    }

    pub fn with_platform_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.platform_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Platform id as a signed value, `-1` when absent.
    pub fn platform_id_or_sentinel(&self) -> i64 {
        self.platform_id.map(i64::from).unwrap_or(-1)
    }
}

/// Strips whitespace from `name` and appends the host executable suffix.
pub fn default_executable_name(name: &str) -> String {
    let mut exe: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    exe.push_str(std::env::consts::EXE_SUFFIX);
    exe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_executable_strips_whitespace() {
        let exe = default_executable_name("Half Life\t2");
        assert_eq!(exe, format!("HalfLife2{}", std::env::consts::EXE_SUFFIX));
    }

    #[test]
    fn explicit_executable_wins() {
        let rec = GameRecord::new("Some Game", LauncherKind::Epic, "/games/sg/sg.exe")
            .with_executable("sg.exe");
        assert_eq!(rec.executable_name, "sg.exe");
    }

    #[test]
    fn empty_executable_keeps_default() {
        let rec = GameRecord::new("Some Game", LauncherKind::Epic, "").with_executable("  ");
        assert_eq!(rec.executable_name, default_executable_name("Some Game"));
    }

    #[test]
    fn platform_id_sentinel() {
        let rec = GameRecord::new("A", LauncherKind::Gog, "");
        assert_eq!(rec.platform_id_or_sentinel(), -1);
        let rec = rec.with_platform_id(440);
        assert_eq!(rec.platform_id_or_sentinel(), 440);
    }

    #[test]
    fn status_u8_roundtrip() {
        for s in [
            RuntimeStatus::Idle,
            RuntimeStatus::Launching,
            RuntimeStatus::Running,
            RuntimeStatus::Downloading,
            RuntimeStatus::Installing,
            RuntimeStatus::Error,
        ] {
            assert_eq!(RuntimeStatus::from_u8(s as u8), s);
        }
        assert!(ArtworkStatus::Loaded.is_terminal());
        assert!(!ArtworkStatus::ReadyToLoad.is_terminal());
    }

    #[test]
    fn record_json_field_names() {
        let rec = GameRecord::new("A", LauncherKind::Steam, "steam://run/1").with_platform_id(1);
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"launchTarget\""));
        assert!(json.contains("\"platformId\":1"));
        assert!(json.contains("\"launcher\":\"steam\""));
    }
}
