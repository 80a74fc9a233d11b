//! Epic implementation of the library [`Scanner`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use multilauncher_library::scanner::{ScanFuture, Scanner, read_source_dir};
use multilauncher_library::{GameRecord, LauncherKind, NameFilter, ScanError};
use tracing::{debug, info, warn};

use crate::legendary::{EpicGameInfo, LegendaryClient};
use crate::manifest;

/// Update and version pseudo-entries that show up next to real titles.
pub fn default_filter() -> NameFilter {
    NameFilter::empty()
        .containing(" update")
        .containing(" hotfix")
        .prefixed("UE_")
}

/// Discovers Epic games from launcher manifests and, when the helper CLI
/// is installed, from the signed-in account.
#[derive(Debug, Clone)]
pub struct EpicScanner {
    manifest_dir: Option<PathBuf>,
    legendary: Option<LegendaryClient>,
    filter: NameFilter,
}

impl Default for EpicScanner {
    fn default() -> Self {
        Self::new(manifest::default_manifest_dir())
    }
}

impl EpicScanner {
    pub fn new(manifest_dir: Option<PathBuf>) -> Self {
        Self {
            manifest_dir,
            legendary: None,
            filter: default_filter(),
        }
    }

    pub fn with_legendary(mut self, client: LegendaryClient) -> Self {
        self.legendary = Some(client);
        self
    }

    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn manifest_dir(&self) -> Option<&Path> {
        self.manifest_dir.as_deref()
    }

    /// Blocking pass over the manifest directory.
    pub fn scan_manifests(&self) -> Result<Vec<GameRecord>, ScanError> {
        let Some(dir) = &self.manifest_dir else {
            debug!("no epic manifest directory configured");
            return Ok(Vec::new());
        };
        let Some(entries) = read_source_dir(dir) else {
            return Ok(Vec::new());
        };

        let mut games = Vec::new();
        for file in manifest::item_files(entries) {
            let item = match fs::read_to_string(&file)
                .map_err(crate::EpicError::from)
                .and_then(|text| manifest::parse_item(&text))
            {
                Ok(item) => item,
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping epic manifest");
                    continue;
                }
            };
            if self.filter.excludes(&item.display_name) {
                debug!(name = %item.display_name, "filtered");
                continue;
            }
            games.push(item.into_record());
        }

        info!(count = games.len(), dir = %dir.display(), "epic manifests scanned");
        Ok(games)
    }

    /// Appends helper-listed games whose title is not already present.
    fn merge_owned(&self, games: &mut Vec<GameRecord>, owned: Vec<EpicGameInfo>) {
        let mut titles: HashSet<String> = games.iter().map(|g| g.name.clone()).collect();
        let before = games.len();
        for info in owned {
            if info.app_name.is_empty() || info.title.is_empty() {
                continue;
            }
            if self.filter.excludes(&info.title) {
                debug!(name = %info.title, "filtered");
                continue;
            }
            if !titles.insert(info.title.clone()) {
                continue;
            }
            games.push(
                GameRecord::new(info.title, LauncherKind::Epic, "").with_platform_key(info.app_name),
            );
        }
        info!(added = games.len() - before, "epic account games merged");
    }
}

impl Scanner for EpicScanner {
    fn launcher(&self) -> LauncherKind {
        LauncherKind::Epic
    }

    fn scan(&self) -> ScanFuture<'_> {
        Box::pin(async move {
            let this = self.clone();
            let mut games = tokio::task::spawn_blocking(move || this.scan_manifests())
                .await
                .map_err(|e| ScanError::Io(std::io::Error::other(e)))??;

            if let Some(client) = self.legendary.as_ref().filter(|c| c.is_available()) {
                match client.list_games().await {
                    Ok(owned) => self.merge_owned(&mut games, owned),
                    Err(e) => warn!(error = %e, "legendary sync failed"),
                }
            }

            info!(total = games.len(), "epic scan complete");
            Ok(games)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_item(dir: &Path, file: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(file), body).unwrap();
    }

    #[tokio::test]
    async fn skips_item_missing_executable() {
        let tmp = tempfile::tempdir().unwrap();
        write_item(
            tmp.path(),
            "broken.item",
            r#"{"DisplayName":"Broken","InstallLocation":"/games/broken"}"#,
        );
        write_item(
            tmp.path(),
            "test.item",
            r#"{"DisplayName":"Test Game","InstallLocation":"/games/test","LaunchExecutable":"test.exe"}"#,
        );

        let games = EpicScanner::new(Some(tmp.path().to_path_buf()))
            .scan()
            .await
            .unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "Test Game");
        assert_eq!(games[0].executable_name, "test.exe");
        assert_eq!(games[0].launcher, LauncherKind::Epic);
    }

    #[tokio::test]
    async fn missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let scanner = EpicScanner::new(Some(tmp.path().join("Manifests")));
        assert!(scanner.scan().await.unwrap().is_empty());
        assert!(EpicScanner::new(None).scan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_as_manifest_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("Manifests");
        fs::write(&file, "").unwrap();
        let scanner = EpicScanner::new(Some(file));
        assert!(scanner.scan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn filters_update_entries() {
        let tmp = tempfile::tempdir().unwrap();
        write_item(
            tmp.path(),
            "a.item",
            r#"{"DisplayName":"Fortnite Update","InstallLocation":"/f","LaunchExecutable":"f.exe"}"#,
        );
        write_item(
            tmp.path(),
            "b.item",
            r#"{"DisplayName":"Alan Wake 2","InstallLocation":"/a","LaunchExecutable":"a.exe"}"#,
        );
        let games = EpicScanner::new(Some(tmp.path().to_path_buf()))
            .scan()
            .await
            .unwrap();
        let names: Vec<_> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Alan Wake 2"]);
    }

    #[test]
    fn merge_is_case_sensitive_and_manifest_wins() {
        let scanner = EpicScanner::new(None);
        let mut games = vec![GameRecord::new("Test", LauncherKind::Epic, "/t/test.exe")];
        let owned = vec![
            EpicGameInfo {
                app_name: "abc".into(),
                title: "Test".into(),
            },
            EpicGameInfo {
                app_name: "def".into(),
                title: "test".into(),
            },
            EpicGameInfo {
                app_name: "".into(),
                title: "account".into(),
            },
        ];
        scanner.merge_owned(&mut games, owned);

        assert_eq!(games.len(), 2);
        assert_eq!(games[0].launch_target, "/t/test.exe");
        assert_eq!(games[1].name, "test");
        assert_eq!(games[1].platform_key.as_deref(), Some("def"));
        assert!(games[1].launch_target.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn scan_merges_helper_games() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let manifests = tmp.path().join("Manifests");
        write_item(
            &manifests,
            "test.item",
            r#"{"DisplayName":"Test","InstallLocation":"/games/test","LaunchExecutable":"test.exe","AppName":"abc"}"#,
        );
        let helper = tmp.path().join("legendary");
        fs::write(
            &helper,
            "#!/bin/sh\necho '[cli] INFO: Logging in...'\necho '[{\"app_name\":\"abc\",\"title\":\"Test\"},{\"app_name\":\"xyz\",\"title\":\"Other\"}]'\n",
        )
        .unwrap();
        fs::set_permissions(&helper, fs::Permissions::from_mode(0o755)).unwrap();

        let games = EpicScanner::new(Some(manifests))
            .with_legendary(LegendaryClient::new(helper))
            .scan()
            .await
            .unwrap();
        let names: Vec<_> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Test", "Other"]);
        assert_eq!(games[0].launch_target, Path::new("/games/test").join("test.exe").to_string_lossy());
    }
}
