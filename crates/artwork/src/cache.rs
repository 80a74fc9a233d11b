//! On-disk banner cache.
//!
//! Downloaded banners live in the cache directory as
//! `<appid>_hero.jpg` (platform id) or `<key>.<ext>` (name based, where the
//! key is the lowercased alphanumeric rendering of the game name).
//! Hand-placed banners can be dropped into a separate banners directory as
//! `<key>.jpg` or `<key>.png`.

use std::io::Write;
use std::path::{Path, PathBuf};

use multilauncher_library::BannerRequest;

/// Errors from cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Image extensions probed for name-keyed banners, in preference order.
const NAME_EXTENSIONS: &[&str] = &["jpg", "png", "webp"];

/// Locations of cached and hand-placed banners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerCache {
    cache_dir: PathBuf,
    banners_dir: Option<PathBuf>,
}

impl BannerCache {
    /// Cache rooted at `cache_dir`, with no local banners directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            banners_dir: None,
        }
    }

    pub fn with_banners_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.banners_dir = Some(dir.into());
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn banners_dir(&self) -> Option<&Path> {
        self.banners_dir.as_deref()
    }

    /// Slot for a platform-id banner.
    pub fn id_path(&self, app_id: u32) -> PathBuf {
        self.cache_dir.join(format!("{app_id}_hero.jpg"))
    }

    /// Slot for a name-keyed banner with the given extension.
    pub fn name_path(&self, name: &str, ext: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{ext}", name_key(name)))
    }

    /// Returns an existing banner for the request.
    ///
    /// Lookup order: the platform-id slot, the local banners directory, then
    /// the name-keyed cache slot.
    pub fn find(&self, req: &BannerRequest) -> Option<PathBuf> {
        if let Some(id) = req.platform_id {
            let path = self.id_path(id);
            if is_nonempty_file(&path) {
                return Some(path);
            }
        }

        let key = name_key(&req.name);
        if key.is_empty() {
            return None;
        }

        if let Some(dir) = &self.banners_dir {
            let local = ["jpg", "png"]
                .iter()
                .map(|ext| dir.join(format!("{key}.{ext}")))
                .find(|p| is_nonempty_file(p));
            if local.is_some() {
                return local;
            }
        }

        NAME_EXTENSIONS
            .iter()
            .map(|ext| self.cache_dir.join(format!("{key}.{ext}")))
            .find(|p| is_nonempty_file(p))
    }

    /// Total size of cached files in bytes.
    pub fn size(&self) -> u64 {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return 0;
        };
        entries
            .flatten()
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }

    /// Deletes every cached file. Hand-placed banners are left alone.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let entries = match std::fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Lowercased ASCII alphanumeric rendering of a game name.
///
/// Non-ASCII letters are dropped, so "Pokémon" keys as `pokmon`.
pub fn name_key(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Writes `data` to `path` through a `.part` sibling so a failed write
/// never leaves a truncated banner behind.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let part = part_path(path);

    let result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&part)?;
        file.write_all(data)?;
        file.sync_all()?;
        std::fs::rename(&part, path)
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&part);
        return Err(e.into());
    }
    Ok(())
}

/// The temporary name used while `path` is being written.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

fn is_nonempty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: &str, id: Option<u32>) -> BannerRequest {
        BannerRequest {
            name: name.into(),
            platform_id: id,
        }
    }

    #[test]
    fn name_key_strips_punctuation() {
        assert_eq!(name_key("Hollow Knight: Silksong"), "hollowknightsilksong");
        assert_eq!(name_key("DOOM (2016)"), "doom2016");
        assert_eq!(name_key("  "), "");
    }

    #[test]
    fn name_key_drops_non_ascii() {
        assert_eq!(name_key("Pokémon Legends"), "pokmonlegends");
        assert_eq!(name_key("Ōkami HD"), "kamihd");
    }

    #[test]
    fn slots() {
        let cache = BannerCache::new("/cache");
        assert_eq!(cache.id_path(440), PathBuf::from("/cache/440_hero.jpg"));
        assert_eq!(
            cache.name_path("Celeste!", "png"),
            PathBuf::from("/cache/celeste.png")
        );
    }

    #[test]
    fn find_prefers_id_slot() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = BannerCache::new(tmp.path().join("cache"))
            .with_banners_dir(tmp.path().join("banners"));
        std::fs::create_dir_all(cache.cache_dir()).unwrap();
        std::fs::create_dir_all(tmp.path().join("banners")).unwrap();

        std::fs::write(cache.id_path(620), b"jpg").unwrap();
        std::fs::write(tmp.path().join("banners/portal2.png"), b"png").unwrap();

        assert_eq!(cache.find(&req("Portal 2", Some(620))), Some(cache.id_path(620)));
        assert_eq!(
            cache.find(&req("Portal 2", None)),
            Some(tmp.path().join("banners/portal2.png"))
        );
    }

    #[test]
    fn find_uses_name_slot_and_skips_empty_files() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = BannerCache::new(tmp.path());
        std::fs::write(tmp.path().join("celeste.jpg"), b"").unwrap();
        assert_eq!(cache.find(&req("Celeste", None)), None);

        std::fs::write(tmp.path().join("celeste.webp"), b"data").unwrap();
        assert_eq!(
            cache.find(&req("Celeste", None)),
            Some(tmp.path().join("celeste.webp"))
        );
        assert_eq!(cache.find(&req("???", None)), None);
    }

    #[test]
    fn write_atomic_leaves_no_part_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("440_hero.jpg");
        write_atomic(&path, b"image").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"image");
        assert!(!part_path(&path).exists());
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/c/440_hero.jpg")),
            PathBuf::from("/c/440_hero.jpg.part")
        );
    }

    #[test]
    fn size_and_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = BannerCache::new(tmp.path());
        write_atomic(&cache.id_path(1), b"abc").unwrap();
        write_atomic(&cache.name_path("Game", "png"), b"defg").unwrap();

        assert_eq!(cache.size(), 7);
        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn clear_missing_dir_is_noop() {
        let cache = BannerCache::new("/no/such/cache");
        assert_eq!(cache.clear().unwrap(), 0);
        assert_eq!(cache.size(), 0);
    }
}
