use std::path::{Path, PathBuf};

use crate::SteamError;

/// Returns the Steam base directory on Linux/Unix systems.
pub(crate) fn locate() -> Result<PathBuf, SteamError> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(SteamError::NotFound)?;
    let data_home = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from);
    find_base_dir(&home, data_home.as_deref()).ok_or(SteamError::NotFound)
}

/// Install locations in lookup order: the `~/.steam/steam` symlink, the
/// XDG data dir, then Flatpak.
pub(crate) fn candidate_dirs(home: &Path, data_home: Option<&Path>) -> Vec<PathBuf> {
    let data_home = data_home
        .map(Path::to_path_buf)
        .unwrap_or_else(|| home.join(".local").join("share"));

    vec![
        home.join(".steam").join("steam"),
        data_home.join("Steam"),
        home.join(".var")
            .join("app")
            .join("com.valvesoftware.Steam")
            .join(".steam")
            .join("steam"),
    ]
}

/// First candidate that looks like a Steam install (has `steamapps`).
pub(crate) fn find_base_dir(home: &Path, data_home: Option<&Path>) -> Option<PathBuf> {
    candidate_dirs(home, data_home)
        .into_iter()
        .find(|dir| dir.join("steamapps").is_dir())
}
