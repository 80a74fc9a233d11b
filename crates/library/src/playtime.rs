//! Accumulated playtime per game.
//!
//! Two sources: a local JSON store (`{"Game Name": minutes, ...}`) kept by
//! this process, and platform-reported minutes keyed by platform id (Steam's
//! `localconfig.vdf`). Platform minutes win when the game has an id.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

/// Errors from the playtime store.
#[derive(Debug, thiserror::Error)]
pub enum PlaytimeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process-scoped playtime service. Shared via `Arc`.
pub struct PlaytimeTracker {
    store_path: PathBuf,
    local: Mutex<HashMap<String, u64>>,
    platform: RwLock<HashMap<u32, u64>>,
}

impl PlaytimeTracker {
    /// Creates an empty tracker persisting to `store_path`. Call [`init`](Self::init) to load.
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            local: Mutex::new(HashMap::new()),
            platform: RwLock::new(HashMap::new()),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Installs platform-reported minutes and loads the local store.
    ///
    /// A missing store is not an error. A corrupt store leaves the local map
    /// empty and returns the parse error.
    pub fn init(&self, platform_minutes: HashMap<u32, u64>) -> Result<(), PlaytimeError> {
        let platform_count = platform_minutes.len();
        *self.platform.write().unwrap_or_else(PoisonError::into_inner) = platform_minutes;

        let loaded = load_store(&self.store_path)?;
        let local_count = loaded.len();
        *self.local.lock().unwrap_or_else(PoisonError::into_inner) = loaded;

        tracing::info!(local_count, platform_count, "playtime loaded");
        Ok(())
    }

    /// Accumulated minutes for a game.
    pub fn minutes(&self, name: &str, platform_id: Option<u32>) -> u64 {
        if let Some(id) = platform_id.filter(|id| *id > 0) {
            let platform = self.platform.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(mins) = platform.get(&id) {
                return *mins;
            }
        }

        let local = self.local.lock().unwrap_or_else(PoisonError::into_inner);
        local.get(name).copied().unwrap_or(0)
    }

    /// Accumulated hours for a game.
    pub fn hours(&self, name: &str, platform_id: Option<u32>) -> f32 {
        self.minutes(name, platform_id) as f32 / 60.0
    }

    /// Adds `minutes` to the local record and rewrites the store.
    ///
    /// Non-positive input is ignored.
    pub fn add_playtime(&self, name: &str, minutes: i64) -> Result<(), PlaytimeError> {
        if minutes <= 0 {
            return Ok(());
        }

        let mut local = self.local.lock().unwrap_or_else(PoisonError::into_inner);
        *local.entry(name.to_string()).or_insert(0) += minutes as u64;
        save_store(&self.store_path, &local)?;

        tracing::debug!(game = name, minutes, "playtime recorded");
        Ok(())
    }
}

fn load_store(path: &Path) -> Result<HashMap<String, u64>, PlaytimeError> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&data)?)
}

/// Rewrites the store through a `.part` sibling and a rename, so a crash
/// mid-write leaves the previous store intact.
fn save_store(path: &Path, map: &HashMap<String, u64>) -> Result<(), PlaytimeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(map)?;
    let part = part_path(path);

    let result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&part)?;
        file.write_all(&json)?;
        file.sync_all()?;
        std::fs::rename(&part, path)
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&part);
        return Err(e.into());
    }
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
