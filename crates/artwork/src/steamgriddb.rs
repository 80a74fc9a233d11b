//! Name-based banner lookup against SteamGridDB.

use std::path::PathBuf;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::cache::{self, BannerCache, CacheError};
use crate::types::{ArtKind, Envelope, ImageData, ImageFilters, SearchResult};

const API_ROOT: &str = "https://www.steamgriddb.com/api/v2";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SteamGridDB returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("an API key is required")]
    InvalidKey,

    #[error("no artwork found for '{0}'")]
    NoMatch(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Authenticated SteamGridDB client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    api_root: String,
}

impl Client {
    pub fn new(api_key: &str) -> Result<Self, Error> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::InvalidKey);
        }
        let bearer =
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| Error::InvalidKey)?;
        let headers = HeaderMap::from_iter([(AUTHORIZATION, bearer)]);
        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_root: API_ROOT.to_string(),
        })
    }

    /// Points the client at another server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_root = url.into();
        self
    }

    async fn fetch<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        let resp = self
            .http
            .get(format!("{}{path}", self.api_root))
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        envelope.into_data().map_err(|body| Error::Api {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>, Error> {
        let term = utf8_percent_encode(term, NON_ALPHANUMERIC);
        self.fetch(&format!("/search/autocomplete/{term}"), &[]).await
    }

    /// Lists grids or heroes for a SteamGridDB game id.
    pub async fn images(
        &self,
        kind: ArtKind,
        game_id: i32,
        filters: &ImageFilters,
    ) -> Result<Vec<ImageData>, Error> {
        let path = format!("/{}/game/{game_id}", kind.segment());
        self.fetch(&path, &filters.query()).await
    }

    /// Raw bytes of an image URL. Image hosts take no API key, but sending it
    /// is harmless.
    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>, Error> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }

    /// The best banner for `name`: the top search hit's first landscape
    /// grid, else any of its grids, else its heroes in the same order.
    pub async fn find_banner(&self, name: &str) -> Result<ImageData, Error> {
        let no_match = || Error::NoMatch(name.to_string());
        let hits = self.search(name).await?;
        let game = hits.first().ok_or_else(no_match)?;
        debug!(name, game_id = game.id, matched = %game.name, "steamgriddb match");

        let filters = ImageFilters::banners();
        for kind in [ArtKind::Grid, ArtKind::Hero] {
            let images = self.images(kind, game.id, &filters).await?;
            if let Some(img) = pick_banner(&images) {
                return Ok(img.clone());
            }
        }
        Err(no_match())
    }

    /// Finds a banner for `name` and stores it in the name-keyed cache slot.
    pub async fn download_banner(&self, name: &str, cache: &BannerCache) -> Result<PathBuf, Error> {
        let img = self.find_banner(name).await?;
        let bytes = self.download_image(&img.url).await?;
        if bytes.is_empty() {
            return Err(Error::NoMatch(name.to_string()));
        }
        let dest = cache.name_path(name, img.extension());
        cache::write_atomic(&dest, &bytes)?;
        info!(name, path = %dest.display(), "banner downloaded from steamgriddb");
        Ok(dest)
    }
}

/// First landscape image with a URL, else the first image with a URL.
fn pick_banner(images: &[ImageData]) -> Option<&ImageData> {
    let usable = || images.iter().filter(|i| !i.url.is_empty());
    usable().find(|i| i.is_landscape()).or_else(|| usable().next())
}
