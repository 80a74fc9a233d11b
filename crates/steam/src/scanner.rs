//! Steam implementation of the library [`Scanner`].

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use multilauncher_library::scanner::{ScanFuture, Scanner, read_source_dir};
use multilauncher_library::{GameRecord, LauncherKind, NameFilter, ScanError};
use tracing::{debug, info, warn};

use crate::library::{self, AppManifest};
use crate::paths::{Paths, steamapps_of};

/// Names that are Steam tooling rather than games.
pub fn default_filter() -> NameFilter {
    NameFilter::empty()
        .exact("Steamworks Common Redistributables")
        .prefixed("Proton ")
        .containing("Steam Linux Runtime")
        .containing("Proton EasyAntiCheat Runtime")
        .containing("Proton BattlEye Runtime")
}

/// Builds the `steam://run/<appid>` launch target.
pub fn launch_uri(app_id: u32) -> String {
    format!("steam://run/{app_id}")
}

/// Discovers installed Steam apps from library manifests.
#[derive(Debug, Clone)]
pub struct SteamScanner {
    paths: Option<Paths>,
    filter: NameFilter,
}

impl SteamScanner {
    /// Scanner for an explicit Steam install.
    pub fn new(paths: Paths) -> Self {
        Self {
            paths: Some(paths),
            filter: default_filter(),
        }
    }

    /// Scanner for the auto-detected Steam install. Without one, scans
    /// return nothing.
    pub fn detect() -> Self {
        match Paths::new() {
            Ok(paths) => {
                info!(base = %paths.base_dir().display(), "steam install detected");
                Self::new(paths)
            }
            Err(e) => {
                info!(error = %e, "steam install not detected");
                Self {
                    paths: None,
                    filter: default_filter(),
                }
            }
        }
    }

    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn paths(&self) -> Option<&Paths> {
        self.paths.as_ref()
    }

    /// Blocking scan of every library root.
    pub fn scan_blocking(&self) -> Result<Vec<GameRecord>, ScanError> {
        let Some(paths) = &self.paths else {
            return Ok(Vec::new());
        };
        if !paths.base_dir().is_dir() {
            info!(base = %paths.base_dir().display(), "steam directory missing");
            return Ok(Vec::new());
        }

        let roots = library::library_roots(paths)?;
        let mut seen = HashSet::new();
        let mut games = Vec::new();

        for root in roots {
            let before = games.len();
            self.scan_library(&root, &mut seen, &mut games);
            info!(
                count = games.len() - before,
                library = %root.display(),
                "steam library scanned"
            );
        }

        info!(total = games.len(), "steam scan complete");
        Ok(games)
    }

    fn scan_library(
        &self,
        root: &Path,
        seen: &mut HashSet<u32>,
        games: &mut Vec<GameRecord>,
    ) {
        let steamapps = steamapps_of(root);
        let Some(entries) = read_source_dir(&steamapps) else {
            return;
        };

        for file in library::manifest_files(entries) {
            let manifest = match fs::read_to_string(&file)
                .map_err(crate::SteamError::from)
                .and_then(|text| library::parse_app_manifest(&text))
            {
                Ok(m) => m,
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping app manifest");
                    continue;
                }
            };

            if let Some(record) = self.to_record(manifest, seen) {
                games.push(record);
            }
        }
    }

    fn to_record(&self, manifest: AppManifest, seen: &mut HashSet<u32>) -> Option<GameRecord> {
        if self.filter.excludes(&manifest.name) {
            debug!(name = %manifest.name, app_id = manifest.app_id, "filtered");
            return None;
        }
        if !seen.insert(manifest.app_id) {
            debug!(app_id = manifest.app_id, "duplicate app id across libraries");
            return None;
        }
        Some(
            GameRecord::new(manifest.name, LauncherKind::Steam, launch_uri(manifest.app_id))
                .with_platform_id(manifest.app_id),
        )
    }
}

impl Scanner for SteamScanner {
    fn launcher(&self) -> LauncherKind {
        LauncherKind::Steam
    }

    fn scan(&self) -> ScanFuture<'_> {
        let this = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || this.scan_blocking())
                .await
                .map_err(|e| ScanError::Io(std::io::Error::other(e)))?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(steamapps: &Path, app_id: u32, name: &str) {
        fs::create_dir_all(steamapps).unwrap();
        fs::write(
            steamapps.join(format!("appmanifest_{app_id}.acf")),
            format!(
                "\"AppState\"\n{{\n\t\"appid\"\t\t\"{app_id}\"\n\t\"name\"\t\t\"{name}\"\n\t\"installdir\"\t\t\"{name}\"\n}}\n"
            ),
        )
        .unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("Steam");
        let extra = tmp.path().join("Library2");
        let base_apps = base.join("steamapps");

        write_manifest(&base_apps, 620, "Portal 2");
        write_manifest(&base_apps, 228980, "Steamworks Common Redistributables");
        write_manifest(&base_apps, 1493710, "Proton Experimental");
        write_manifest(&extra.join("steamapps"), 440, "Team Fortress 2");
        // Same app listed in two libraries.
        write_manifest(&extra.join("steamapps"), 620, "Portal 2");
        fs::write(base_apps.join("appmanifest_999.acf"), "\"AppState\" { \"name\" ").unwrap();
        fs::write(
            base_apps.join("libraryfolders.vdf"),
            format!(
                "\"libraryfolders\"\n{{\n\t\"0\" {{ \"path\" \"{}\" }}\n\t\"1\" {{ \"path\" \"{}\" }}\n\t\"2\" {{ \"path\" \"{}\" }}\n}}\n",
                base.display(),
                extra.display(),
                tmp.path().join("Unplugged").display(),
            ),
        )
        .unwrap();
        tmp
    }

    #[test]
    fn scans_all_libraries() {
        let tmp = fixture();
        let scanner = SteamScanner::new(Paths::with_base(tmp.path().join("Steam")));
        let games = scanner.scan_blocking().unwrap();

        let names: Vec<_> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Portal 2", "Team Fortress 2"]);

        let portal = &games[0];
        assert_eq!(portal.launcher, LauncherKind::Steam);
        assert_eq!(portal.launch_target, "steam://run/620");
        assert_eq!(portal.platform_id, Some(620));
    }

    #[test]
    fn custom_filter_replaces_default() {
        let tmp = fixture();
        let scanner = SteamScanner::new(Paths::with_base(tmp.path().join("Steam")))
            .with_filter(NameFilter::empty().exact("Portal 2"));
        let names: Vec<_> = scanner
            .scan_blocking()
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(
            names,
            [
                "Proton Experimental",
                "Steamworks Common Redistributables",
                "Team Fortress 2"
            ]
        );
    }

    #[test]
    fn unreadable_library_keeps_other_libraries() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("Steam");
        let broken = tmp.path().join("Broken");
        write_manifest(&base.join("steamapps"), 620, "Portal 2");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("steamapps"), "not a directory").unwrap();
        fs::write(
            base.join("steamapps").join("libraryfolders.vdf"),
            format!(
                "\"libraryfolders\"\n{{\n\t\"0\" {{ \"path\" \"{}\" }}\n\t\"1\" {{ \"path\" \"{}\" }}\n}}\n",
                base.display(),
                broken.display(),
            ),
        )
        .unwrap();

        let scanner = SteamScanner::new(Paths::with_base(&base));
        let names: Vec<_> = scanner
            .scan_blocking()
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, ["Portal 2"]);
    }

    #[test]
    fn missing_install_is_empty() {
        let scanner = SteamScanner::new(Paths::with_base("/no/such/steam"));
        assert!(scanner.scan_blocking().unwrap().is_empty());
    }

    #[test]
    fn corrupt_library_list_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let apps = tmp.path().join("steamapps");
        fs::create_dir_all(&apps).unwrap();
        fs::write(apps.join("libraryfolders.vdf"), "\"libraryfolders\" { \"0\" {").unwrap();

        let scanner = SteamScanner::new(Paths::with_base(tmp.path()));
        assert!(matches!(scanner.scan_blocking(), Err(ScanError::Parse { .. })));
    }

    #[test]
    fn default_filter_keeps_real_games() {
        let f = default_filter();
        assert!(f.excludes("Steam Linux Runtime 3.0 (sniper)"));
        assert!(f.excludes("Proton 9.0"));
        assert!(!f.excludes("Protonaut"));
        assert!(!f.excludes("Half-Life 2"));
    }

    #[tokio::test]
    async fn async_scan_matches_blocking() {
        let tmp = fixture();
        let scanner = SteamScanner::new(Paths::with_base(tmp.path().join("Steam")));
        assert_eq!(scanner.launcher(), LauncherKind::Steam);
        assert_eq!(scanner.scan().await.unwrap().len(), 2);
    }
}
