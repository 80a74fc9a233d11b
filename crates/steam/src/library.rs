//! Steam library folders and per-app manifests.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::SteamError;
use crate::paths::Paths;
use crate::vdf::{self, Object, Value};

/// The fields of an `appmanifest_<id>.acf` the launcher cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    pub app_id: u32,
    pub name: String,
    pub install_dir: String,
}

/// Returns every library root: the Steam install itself, then each entry of
/// `libraryfolders.vdf`, without duplicates.
///
/// A missing `libraryfolders.vdf` is not an error; a malformed one is.
pub fn library_roots(paths: &Paths) -> Result<Vec<PathBuf>, SteamError> {
    let mut roots = vec![paths.base_dir().to_path_buf()];

    let listed = match vdf::load(&paths.library_folders_path()) {
        Ok(root) => parse_library_folders(&root)?,
        Err(SteamError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(base = %paths.base_dir().display(), "no libraryfolders.vdf");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    for dir in listed {
        if !roots.iter().any(|r| same_dir(r, &dir)) {
            roots.push(dir);
        }
    }
    Ok(roots)
}

/// Extracts library paths from a parsed `libraryfolders.vdf`.
///
/// Handles the current layout (`"0" { "path" "..." }`) and the legacy one
/// (`"1" "D:\\SteamLibrary"`). Non-numeric keys such as `contentstatsid`
/// are ignored.
pub fn parse_library_folders(root: &Object) -> Result<Vec<PathBuf>, SteamError> {
    let folders = root
        .get_object("libraryfolders")
        .ok_or_else(|| SteamError::Vdf("missing 'libraryfolders' root".into()))?;

    let mut out = Vec::new();
    for (key, value) in folders.iter() {
        if key.parse::<u32>().is_err() {
            continue;
        }
        let path = match value {
            Value::Object(lib) => lib.get_str("path"),
            Value::String(path) => Some(path.as_str()),
        };
        match path {
            Some(p) if !p.is_empty() => out.push(PathBuf::from(p)),
            _ => tracing::warn!(library = key, "library entry has no path"),
        }
    }
    Ok(out)
}

/// Parses the text of an app manifest.
pub fn parse_app_manifest(text: &str) -> Result<AppManifest, SteamError> {
    let root = vdf::parse(text)?;
    let state = root
        .get_object("AppState")
        .ok_or_else(|| SteamError::Manifest("no AppState".into()))?;

    let field = |key: &str| {
        state
            .get_str(key)
            .map(str::to_string)
            .ok_or_else(|| SteamError::Manifest(format!("missing '{key}'")))
    };

    let app_id = field("appid")?;
    let app_id = app_id
        .trim()
        .parse::<u32>()
        .map_err(|_| SteamError::Manifest(format!("invalid appid '{app_id}'")))?;

    Ok(AppManifest {
        app_id,
        name: field("name")?,
        install_dir: field("installdir")?,
    })
}

/// Lists `appmanifest_*.acf` files in a `steamapps` directory, sorted.
pub fn manifest_files(entries: fs::ReadDir) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("appmanifest_") && n.ends_with(".acf"))
        })
        .collect();
    files.sort();
    files
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
