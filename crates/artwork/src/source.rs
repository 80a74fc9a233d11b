//! [`BannerSource`] backed by the disk cache, the Steam CDN and SteamGridDB.

use std::path::PathBuf;

use multilauncher_library::{ArtworkError, BannerRequest, BannerSource, FetchFuture};

use crate::cache::BannerCache;
use crate::cdn::{self, CdnClient};
use crate::steamgriddb;

/// Resolves banners by platform id through the CDN, and by name through
/// SteamGridDB when an API key is configured.
#[derive(Debug, Clone)]
pub struct ArtworkSource {
    cache: BannerCache,
    cdn: CdnClient,
    griddb: Option<steamgriddb::Client>,
}

impl ArtworkSource {
    pub fn new(cache: BannerCache) -> Result<Self, cdn::Error> {
        Ok(Self {
            cache,
            cdn: CdnClient::new()?,
            griddb: None,
        })
    }

    pub fn with_cdn(mut self, cdn: CdnClient) -> Self {
        self.cdn = cdn;
        self
    }

    pub fn with_steamgriddb(mut self, client: steamgriddb::Client) -> Self {
        self.griddb = Some(client);
        self
    }
}

impl BannerSource for ArtworkSource {
    fn cached(&self, req: &BannerRequest) -> Option<PathBuf> {
        self.cache.find(req)
    }

    fn can_fetch(&self, req: &BannerRequest) -> bool {
        req.platform_id.is_some() || self.griddb.is_some()
    }

    fn fetch(&self, req: BannerRequest) -> FetchFuture<'_> {
        Box::pin(async move {
            if let Some(app_id) = req.platform_id {
                let dest = self.cache.id_path(app_id);
                return self
                    .cdn
                    .download_banner(app_id, &dest)
                    .await
                    .map_err(|e| ArtworkError::Download(e.to_string()));
            }

            match &self.griddb {
                Some(client) => client
                    .download_banner(&req.name, &self.cache)
                    .await
                    .map_err(|e| ArtworkError::Download(e.to_string())),
                None => Err(ArtworkError::NotFound(req.name)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Route, serve};

    fn req(name: &str, id: Option<u32>) -> BannerRequest {
        BannerRequest {
            name: name.into(),
            platform_id: id,
        }
    }

    #[test]
    fn can_fetch_needs_id_or_key() {
        let tmp = tempfile::tempdir().unwrap();
        let source = ArtworkSource::new(BannerCache::new(tmp.path())).unwrap();
        assert!(source.can_fetch(&req("Portal 2", Some(620))));
        assert!(!source.can_fetch(&req("Celeste", None)));

        let source = source.with_steamgriddb(steamgriddb::Client::new("key").unwrap());
        assert!(source.can_fetch(&req("Celeste", None)));
    }

    #[tokio::test]
    async fn fetch_by_id_fills_cache() {
        let server = serve(vec![(
            "/620/library_hero.jpg",
            Route::ok("image/jpeg", b"hero".to_vec()),
        )])
        .await;
        let tmp = tempfile::tempdir().unwrap();
        let source = ArtworkSource::new(BannerCache::new(tmp.path()))
            .unwrap()
            .with_cdn(CdnClient::new().unwrap().with_base_url(&server.url));

        let request = req("Portal 2", Some(620));
        assert_eq!(source.cached(&request), None);
        let path = source.fetch(request.clone()).await.unwrap();
        assert_eq!(path, tmp.path().join("620_hero.jpg"));
        assert_eq!(source.cached(&request), Some(path));
        assert_eq!(server.hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_maps_to_download_error() {
        let server = serve(vec![]).await;
        let tmp = tempfile::tempdir().unwrap();
        let source = ArtworkSource::new(BannerCache::new(tmp.path()))
            .unwrap()
            .with_cdn(CdnClient::new().unwrap().with_base_url(&server.url));

        let err = source.fetch(req("Gone", Some(5))).await.unwrap_err();
        assert!(matches!(err, ArtworkError::Download(_)));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn fetch_by_name_without_key_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let source = ArtworkSource::new(BannerCache::new(tmp.path())).unwrap();
        let err = source.fetch(req("Celeste", None)).await.unwrap_err();
        assert!(matches!(err, ArtworkError::NotFound(_)));
    }
}
