//! Launcher configuration management.
//!
//! One TOML file, created with defaults on first run:
//! - Linux: `$XDG_CONFIG_HOME/multilauncher/launcher.toml`, `~/.config` by default
//! - Windows: `%APPDATA%/multilauncher/launcher.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use multilauncher_library::{DEFAULT_REFRESH_INTERVAL, NameFilter, ScanError};
use serde::{Deserialize, Serialize};

/// Launcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between process-table polls.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Steam install root. Auto-detected when unset.
    #[serde(default)]
    pub steam_root: Option<PathBuf>,

    /// Directory holding Epic `.item` manifests.
    #[serde(default = "multilauncher_epic::default_manifest_dir")]
    pub epic_manifest_dir: Option<PathBuf>,

    /// Path of the `legendary` helper.
    #[serde(default = "multilauncher_epic::legendary::default_program")]
    pub legendary_path: PathBuf,

    /// Base directory for Epic installs (`--base-path`).
    #[serde(default)]
    pub epic_install_base: Option<PathBuf>,

    /// Downloaded banner cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Hand-placed banners, named `<key>.jpg` or `<key>.png`.
    #[serde(default = "default_banners_dir")]
    pub banners_dir: PathBuf,

    /// Local playtime store.
    #[serde(default = "default_playtime_path")]
    pub playtime_path: PathBuf,

    /// Enables name-based artwork lookup for games without a platform id.
    #[serde(default)]
    pub steamgriddb_api_key: Option<String>,

    /// Extra name filters per platform, added to the built-in ones.
    #[serde(default)]
    pub filters: Filters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub steam: FilterRules,
    #[serde(default)]
    pub epic: FilterRules,
}

/// User-supplied exclusion rules for one platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRules {
    #[serde(default)]
    pub exact: Vec<String>,
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterRules {
    /// Extends `base` with these rules.
    pub fn apply(&self, base: NameFilter) -> Result<NameFilter, ScanError> {
        let mut filter = base;
        for name in &self.exact {
            filter = filter.exact(name);
        }
        for prefix in &self.prefixes {
            filter = filter.prefixed(prefix);
        }
        for needle in &self.contains {
            filter = filter.containing(needle);
        }
        for pattern in &self.patterns {
            filter = filter.pattern(pattern)?;
        }
        Ok(filter)
    }
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

fn default_cache_dir() -> PathBuf {
    config_dir().join("cache")
}

fn default_banners_dir() -> PathBuf {
    config_dir().join("banners")
}

fn default_playtime_path() -> PathBuf {
    config_dir().join("playtime.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            steam_root: None,
            epic_manifest_dir: multilauncher_epic::default_manifest_dir(),
            legendary_path: multilauncher_epic::legendary::default_program(),
            epic_install_base: None,
            cache_dir: default_cache_dir(),
            banners_dir: default_banners_dir(),
            playtime_path: default_playtime_path(),
            steamgriddb_api_key: None,
            filters: Filters::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the default location), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // The file may hold an API key.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "wrote launcher config");
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// The SteamGridDB key, if one is set and non-blank.
    pub fn steamgriddb_key(&self) -> Option<&str> {
        self.steamgriddb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Per-user directory holding the config, playtime store and banners.
fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Users\Default\AppData\Roaming"))
            .join("multilauncher")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| std::env::temp_dir().join(".config"));
        base.join("multilauncher")
    }
}

/// `launcher.toml` in the per-user config directory.
pub fn config_path() -> PathBuf {
    config_dir().join("launcher.toml")
}
