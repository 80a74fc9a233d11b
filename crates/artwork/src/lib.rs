//! Banner artwork for the game library.
//!
//! Banners come from the Steam CDN (by app id) or from
//! [SteamGridDB](https://www.steamgriddb.com) (by name), and are cached on
//! disk so later sessions skip the network.

pub mod cache;
pub mod cdn;
#[cfg(test)]
mod mock;
pub mod source;
pub mod steamgriddb;
pub mod types;

pub use cache::{BannerCache, CacheError, name_key};
pub use cdn::CdnClient;
pub use source::ArtworkSource;
pub use steamgriddb::Client;
pub use types::{ArtKind, ImageData, ImageFilters, SearchResult};
