//! Game library aggregation and lifecycle engine.
//!
//! Scanners discover installed games per platform, the [`GameRegistry`]
//! owns them, and each [`Game`] runs its own launch, download and artwork
//! state machines on background tasks.

pub mod artwork;
pub mod error;
pub mod filter;
pub mod game;
pub mod launch;
pub mod model;
pub mod playtime;
pub mod proc_table;
#[cfg(target_os = "linux")]
mod proc_table_linux;
#[cfg(target_os = "windows")]
mod proc_table_windows;
pub mod process;
pub mod registry;
pub mod scanner;

pub use artwork::{
    ArtworkError, BannerHandle, BannerRequest, BannerSource, FetchFuture, NoBanners, TextureLoader,
};
pub use error::{LaunchError, ScanError};
pub use filter::NameFilter;
pub use game::{Game, GameServices};
pub use launch::{GameLauncher, LaunchFuture, SystemLauncher};
pub use model::{ArtworkStatus, GameRecord, LauncherKind, RuntimeStatus};
pub use playtime::{PlaytimeError, PlaytimeTracker};
pub use proc_table::{ProcessSnapshot, ProcessTable, SystemProcessTable};
pub use process::{CommandSpec, ProcessError};
pub use registry::{
    DEFAULT_REFRESH_INTERVAL, GameRegistry, GamesGuard, MIN_REFRESH_INTERVAL, RefreshHandle,
};
pub use scanner::{GogScanner, ScanFuture, Scanner};
