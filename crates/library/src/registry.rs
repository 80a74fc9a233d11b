//! Owning collection of scanners and discovered games.

use std::ops::Deref;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::artwork::TextureLoader;
use crate::game::{Game, GameServices};
use crate::model::ArtworkStatus;
use crate::proc_table::{ProcessTable, SystemProcessTable};
use crate::scanner::Scanner;

/// Default cadence for [`GameRegistry::spawn_status_refresh`].
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest cadence the refresh task accepts; smaller values are raised to it.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(10);

pub struct GameRegistry {
    services: GameServices,
    processes: Arc<dyn ProcessTable>,
    scanners: Mutex<Vec<Arc<dyn Scanner>>>,
    games: Mutex<Vec<Arc<Game>>>,
}

/// Exclusive view of the game list. The lock is released on drop.
pub struct GamesGuard<'a> {
    inner: MutexGuard<'a, Vec<Arc<Game>>>,
}

impl Deref for GamesGuard<'_> {
    type Target = [Arc<Game>];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Stops the periodic status refresh when dropped.
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl GameRegistry {
    pub fn new(services: GameServices) -> Self {
        Self {
            services,
            processes: Arc::new(SystemProcessTable),
            scanners: Mutex::new(Vec::new()),
            games: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the process table used by [`update`](Self::update).
    pub fn with_process_table(mut self, processes: Arc<dyn ProcessTable>) -> Self {
        self.processes = processes;
        self
    }

    pub fn services(&self) -> &GameServices {
        &self.services
    }

    pub fn add_scanner(&self, scanner: Arc<dyn Scanner>) {
        debug!(launcher = %scanner.launcher(), "scanner registered");
        self.scanners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(scanner);
    }

    /// Runs every scanner in registration order and adopts new games.
    ///
    /// A scanner that errors or panics is logged and skipped. Records that
    /// are already in the registry (same platform and name) are not added
    /// again. Returns the number of games added.
    pub async fn scan_all(&self) -> usize {
        let scanners: Vec<_> = self
            .scanners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut added = 0;
        for scanner in scanners {
            let launcher = scanner.launcher();
            let records = match AssertUnwindSafe(scanner.scan()).catch_unwind().await {
                Ok(Ok(records)) => records,
                Ok(Err(e)) => {
                    warn!(%launcher, error = %e, "scan failed");
                    continue;
                }
                Err(_) => {
                    error!(%launcher, "scanner panicked");
                    continue;
                }
            };

            let found = records.len();
            let mut games = self.games.lock().unwrap_or_else(PoisonError::into_inner);
            let mut new_for_scanner = 0;
            for record in records {
                let known = games
                    .iter()
                    .any(|g| g.launcher() == record.launcher && g.name() == record.name);
                if known {
                    continue;
                }
                games.push(Arc::new(Game::new(record, self.services.clone())));
                new_for_scanner += 1;
            }
            drop(games);

            info!(%launcher, found, added = new_for_scanner, "scan complete");
            added += new_for_scanner;
        }
        added
    }

    /// Reconciles every game's status against one process snapshot.
    pub fn update(&self) {
        let snapshot = self.processes.snapshot();
        let games = self.lock_games();
        for game in games.iter() {
            game.update_status(&snapshot);
        }
    }

    /// Spawns a task calling [`update`](Self::update) every `interval`,
    /// raised to at least [`MIN_REFRESH_INTERVAL`].
    pub fn spawn_status_refresh(self: &Arc<Self>, interval: Duration) -> RefreshHandle {
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        let registry = Arc::clone(self);
        let task = self.services.runtime().spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let registry = Arc::clone(&registry);
                if let Err(e) = tokio::task::spawn_blocking(move || registry.update()).await {
                    error!(error = %e, "status refresh failed");
                }
            }
        });
        RefreshHandle { task }
    }

    pub fn lock_games(&self) -> GamesGuard<'_> {
        GamesGuard {
            inner: self.games.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Shared handles to every game, in discovery order.
    pub fn games(&self) -> Vec<Arc<Game>> {
        self.lock_games().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock_games().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_games().is_empty()
    }

    /// First game whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<Arc<Game>> {
        self.lock_games().iter().find(|g| g.name() == name).cloned()
    }

    /// Loads every `ReadyToLoad` banner on the calling thread.
    ///
    /// Returns how many banners were loaded.
    pub fn apply_ready_artwork(&self, loader: &mut dyn TextureLoader) -> usize {
        let ready: Vec<_> = self
            .lock_games()
            .iter()
            .filter(|g| g.artwork_status() == ArtworkStatus::ReadyToLoad)
            .cloned()
            .collect();

        ready
            .iter()
            .filter(|g| g.apply_banner(&mut *loader))
            .count()
    }
}
