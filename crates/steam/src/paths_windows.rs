use std::path::PathBuf;

use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};

use crate::SteamError;

/// Registry values that hold the Steam install path, in lookup order.
const REGISTRY_LOCATIONS: &[(&str, &str, &str)] = &[
    ("HKCU", r"Software\Valve\Steam", "SteamPath"),
    ("HKLM", r"SOFTWARE\Wow6432Node\Valve\Steam", "InstallPath"),
    ("HKLM", r"SOFTWARE\Valve\Steam", "InstallPath"),
];

const DEFAULT_INSTALL: &str = r"C:\Program Files (x86)\Steam";

/// Returns the Steam base directory on Windows using the registry.
pub(crate) fn locate() -> Result<PathBuf, SteamError> {
    for (hive, subkey, value) in REGISTRY_LOCATIONS {
        if let Some(path) = read_registry_path(hive, subkey, value) {
            if path.join("steamapps").is_dir() {
                return Ok(path);
            }
            tracing::debug!(path = %path.display(), "registry Steam path has no steamapps");
        }
    }

    let fallback = PathBuf::from(DEFAULT_INSTALL);
    if fallback.join("steamapps").is_dir() {
        return Ok(fallback);
    }

    Err(SteamError::NotFound)
}

fn read_registry_path(hive: &str, subkey: &str, value: &str) -> Option<PathBuf> {
    let root = match hive {
        "HKCU" => RegKey::predef(HKEY_CURRENT_USER),
        _ => RegKey::predef(HKEY_LOCAL_MACHINE),
    };
    let key = root.open_subkey(subkey).ok()?;
    let path: String = key.get_value(value).ok()?;
    // HKCU stores forward slashes.
    Some(PathBuf::from(path.replace('/', "\\")))
}
