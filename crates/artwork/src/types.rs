//! Wire types of the SteamGridDB v2 API.

use serde::Deserialize;

/// One hit from `/search/autocomplete`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub verified: bool,
}

/// A grid or hero image. Fields the banner lookup ignores are not decoded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageData {
    pub id: i32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub mime: String,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
}

impl ImageData {
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Extension for the cache file, from the reported MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// Which artwork collection to list for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtKind {
    Grid,
    Hero,
}

impl ArtKind {
    pub(crate) fn segment(self) -> &'static str {
        match self {
            ArtKind::Grid => "grids",
            ArtKind::Hero => "heroes",
        }
    }
}

/// Query options for image listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFilters {
    /// e.g. `920x430`; empty means any size.
    pub dimensions: Vec<String>,
    pub static_only: bool,
    pub allow_nsfw: bool,
}

impl ImageFilters {
    /// Static, safe-for-work images of any size.
    pub fn banners() -> Self {
        Self {
            static_only: true,
            ..Self::default()
        }
    }

    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(3);
        if !self.dimensions.is_empty() {
            query.push(("dimensions", self.dimensions.join(",")));
        }
        if self.static_only {
            query.push(("types", "static".to_string()));
        }
        let nsfw = if self.allow_nsfw { "any" } else { "false" };
        query.push(("nsfw", nsfw.to_string()));
        query
    }
}

/// `{"success": .., "errors": [..], "data": ..}` around every payload.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<String>,
    data: Option<T>,
}

impl<T: Default> Envelope<T> {
    /// The payload, or the API's own error messages when it reports failure.
    pub(crate) fn into_data(self) -> Result<T, String> {
        if self.success {
            Ok(self.data.unwrap_or_default())
        } else if self.errors.is_empty() {
            Err("request unsuccessful".to_string())
        } else {
            Err(self.errors.join("; "))
        }
    }
}
