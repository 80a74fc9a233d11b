//! Scanner capability: one implementation per source platform.

use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use std::pin::Pin;

use tracing::{info, warn};

use crate::error::ScanError;
use crate::model::{GameRecord, LauncherKind};

/// Boxed future returned by [`Scanner::scan`].
pub type ScanFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<GameRecord>, ScanError>> + Send + 'a>>;

/// Discovers games from one platform's data source.
///
/// A missing or unreadable source yields `Ok(vec![])`. `Err` is reserved for
/// a corrupt root source; the registry logs it and moves on either way.
pub trait Scanner: Send + Sync {
    /// Platform this scanner reads.
    fn launcher(&self) -> LauncherKind;

    /// Scans the platform and returns normalized records.
    fn scan(&self) -> ScanFuture<'_>;
}

/// Reserved GOG Galaxy extension point.
#[derive(Debug, Default)]
pub struct GogScanner;

impl Scanner for GogScanner {
    fn launcher(&self) -> LauncherKind {
        LauncherKind::Gog
    }

    fn scan(&self) -> ScanFuture<'_> {
        Box::pin(async {
            info!(launcher = %LauncherKind::Gog, "no scanner implementation yet, skipping");
            Ok(Vec::new())
        })
    }
}

/// Opens a scanner's root directory.
///
/// Returns `None` when the directory cannot be listed for any reason
/// (missing, not a directory, permissions, a failing drive or a stale
/// mount), so the caller skips that root instead of failing the scan.
pub fn read_source_dir(dir: &Path) -> Option<std::fs::ReadDir> {
    match std::fs::read_dir(dir) {
        Ok(entries) => Some(entries),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %dir.display(), "source directory not found");
            None
        }
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "source directory not readable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gog_scanner_is_empty() {
        let games = GogScanner.scan().await.unwrap();
        assert!(games.is_empty());
        assert_eq!(GogScanner.launcher(), LauncherKind::Gog);
    }

    #[test]
    fn missing_source_dir_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(read_source_dir(&missing).is_none());
    }

    #[test]
    fn file_as_source_dir_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("Manifests");
        std::fs::write(&file, b"").unwrap();
        assert!(read_source_dir(&file).is_none());
    }

    #[test]
    fn existing_source_dir_is_some() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.item"), b"{}").unwrap();
        let entries = read_source_dir(tmp.path()).unwrap();
        assert_eq!(entries.count(), 1);
    }
}
