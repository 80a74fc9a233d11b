//! Steam CDN banner download.
//!
//! Tries `library_hero.jpg` first and falls back to the smaller
//! `header.jpg`. Successful downloads land in the id-keyed cache slot.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cache::{self, CacheError};

const DEFAULT_BASE_URL: &str = "https://cdn.cloudflare.steamstatic.com/steam/apps";

/// Asset names tried in order.
pub const ASSETS: &[&str] = &["library_hero.jpg", "header.jpg"];

/// Errors from the CDN client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("empty response for {0}")]
    Empty(String),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("no banner for app {app_id}: {last}")]
    Exhausted { app_id: u32, last: Box<Error> },
}

/// Steam CDN client.
#[derive(Debug, Clone)]
pub struct CdnClient {
    http: reqwest::Client,
    base_url: String,
}

impl CdnClient {
    pub fn new() -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("multilauncher/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Sets a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// URL of `asset` for `app_id`.
    pub fn asset_url(&self, app_id: u32, asset: &str) -> String {
        format!("{}/{app_id}/{asset}", self.base_url.trim_end_matches('/'))
    }

    /// Downloads the first available banner asset into `dest`.
    ///
    /// On failure nothing is left at `dest` or its `.part` sibling.
    pub async fn download_banner(&self, app_id: u32, dest: &Path) -> Result<PathBuf, Error> {
        let mut last = None;
        for asset in ASSETS {
            let url = self.asset_url(app_id, asset);
            match self.fetch(&url).await {
                Ok(bytes) => {
                    cache::write_atomic(dest, &bytes)?;
                    info!(app_id, asset, bytes = bytes.len(), "banner downloaded");
                    return Ok(dest.to_path_buf());
                }
                Err(e) => {
                    debug!(app_id, asset, error = %e, "banner asset unavailable");
                    last = Some(e);
                }
            }
        }

        Err(Error::Exhausted {
            app_id,
            last: Box::new(last.unwrap_or_else(|| Error::Empty(self.asset_url(app_id, "")))),
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::Empty(url.to_string()));
        }
        Ok(bytes.to_vec())
    }
}
