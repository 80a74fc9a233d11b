//! Banner acquisition seams.
//!
//! Fetching runs on background tasks through a [`BannerSource`]; turning a
//! cached file into a graphics resource happens on the caller's thread
//! through a [`TextureLoader`], since most graphics APIs only allow resource
//! creation from the thread that owns the context.

use std::any::Any;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Opaque graphics resource owned by a game. Dropped with the game.
pub type BannerHandle = Box<dyn Any + Send + Sync>;

/// Boxed future returned by [`BannerSource::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<PathBuf, ArtworkError>> + Send + 'a>>;

/// Errors from banner acquisition.
#[derive(Debug, thiserror::Error)]
pub enum ArtworkError {
    #[error("no banner available for '{0}'")]
    NotFound(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// What a source needs to know about a game to find its banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerRequest {
    pub name: String,
    pub platform_id: Option<u32>,
}

/// Locates and downloads banner images.
pub trait BannerSource: Send + Sync {
    /// Returns an already cached banner file.
    fn cached(&self, req: &BannerRequest) -> Option<PathBuf>;

    /// Returns true if [`fetch`](Self::fetch) has anything to try.
    fn can_fetch(&self, req: &BannerRequest) -> bool;

    /// Downloads the banner into the cache and returns its path.
    ///
    /// On error no partial file may remain in the cache.
    fn fetch(&self, req: BannerRequest) -> FetchFuture<'_>;
}

/// Creates graphics resources from cached files. Called on one thread only.
pub trait TextureLoader {
    fn load(&mut self, path: &Path) -> Result<BannerHandle, ArtworkError>;
}

/// Source that never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBanners;

impl BannerSource for NoBanners {
    fn cached(&self, _req: &BannerRequest) -> Option<PathBuf> {
        None
    }

    fn can_fetch(&self, _req: &BannerRequest) -> bool {
        false
    }

    fn fetch(&self, req: BannerRequest) -> FetchFuture<'_> {
        Box::pin(async move { Err(ArtworkError::NotFound(req.name)) })
    }
}
