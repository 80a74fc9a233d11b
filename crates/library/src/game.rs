//! A discovered game and its lifecycle state machine.
//!
//! Runtime and artwork status are atomics so UI reads never block on
//! background tasks. Every status write goes through a compare-and-swap
//! from an expected set of states; nothing outside this module stores a
//! status directly.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::artwork::{BannerHandle, BannerRequest, BannerSource, NoBanners, TextureLoader};
use crate::error::LaunchError;
use crate::launch::{GameLauncher, SystemLauncher};
use crate::model::{ArtworkStatus, GameRecord, LauncherKind, RuntimeStatus};
use crate::playtime::PlaytimeTracker;
use crate::proc_table::ProcessSnapshot;

/// Process-scoped services shared by every game.
#[derive(Clone)]
pub struct GameServices {
    runtime: Handle,
    playtime: Arc<PlaytimeTracker>,
    launcher: Arc<dyn GameLauncher>,
    banners: Arc<dyn BannerSource>,
}

impl GameServices {
    /// Services with the system launcher and no banner source.
    pub fn new(runtime: Handle, playtime: Arc<PlaytimeTracker>) -> Self {
        Self {
            runtime,
            playtime,
            launcher: Arc::new(SystemLauncher),
            banners: Arc::new(NoBanners),
        }
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn GameLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_banners(mut self, banners: Arc<dyn BannerSource>) -> Self {
        self.banners = banners;
        self
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn playtime(&self) -> &Arc<PlaytimeTracker> {
        &self.playtime
    }
}

pub struct Game {
    record: GameRecord,
    status: AtomicU8,
    /// Set while a launch task owns the game, from `launch_async` until the
    /// task has reset its own status.
    launch_owned: AtomicBool,
    progress: AtomicU32,
    transfer_rate: Mutex<String>,
    artwork: AtomicU8,
    banner_path: Mutex<Option<PathBuf>>,
    banner: Mutex<Option<BannerHandle>>,
    services: GameServices,
}

impl Game {
    pub fn new(record: GameRecord, services: GameServices) -> Self {
        Self {
            record,
            status: AtomicU8::new(RuntimeStatus::Idle as u8),
            launch_owned: AtomicBool::new(false),
            progress: AtomicU32::new(0f32.to_bits()),
            transfer_rate: Mutex::new(String::new()),
            artwork: AtomicU8::new(ArtworkStatus::NotLoaded as u8),
            banner_path: Mutex::new(None),
            banner: Mutex::new(None),
            services,
        }
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn launcher(&self) -> LauncherKind {
        self.record.launcher
    }

    pub fn launch_target(&self) -> &str {
        &self.record.launch_target
    }

    pub fn executable_name(&self) -> &str {
        &self.record.executable_name
    }

    pub fn platform_id(&self) -> Option<u32> {
        self.record.platform_id
    }

    pub fn platform_key(&self) -> Option<&str> {
        self.record.platform_key.as_deref()
    }

    pub fn runtime(&self) -> &Handle {
        self.services.runtime()
    }

    pub fn status(&self) -> RuntimeStatus {
        RuntimeStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Install progress in `[0.0, 1.0]`.
    pub fn install_progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Acquire))
    }

    /// Human-readable transfer rate, empty when not downloading.
    pub fn transfer_rate(&self) -> String {
        self.transfer_rate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn artwork_status(&self) -> ArtworkStatus {
        ArtworkStatus::from_u8(self.artwork.load(Ordering::Acquire))
    }

    pub fn playtime_hours(&self) -> f32 {
        self.services
            .playtime
            .hours(&self.record.name, self.record.platform_id)
    }

    // -- runtime status ------------------------------------------------------

    fn transition(&self, from: &[RuntimeStatus], to: RuntimeStatus) -> bool {
        let mut current = self.status.load(Ordering::Acquire);
        loop {
            if !from.contains(&RuntimeStatus::from_u8(current)) {
                return false;
            }
            match self.status.compare_exchange_weak(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Runs the platform launch and waits for it to finish.
    ///
    /// Does not touch status; [`launch_async`](Self::launch_async) wraps this.
    pub async fn launch(&self) -> Result<(), LaunchError> {
        self.services.launcher.launch(&self.record).await
    }

    /// Starts a background launch if the game is idle.
    ///
    /// Returns false without side effects when another launch, run or
    /// transfer is already in progress.
    pub fn launch_async(self: &Arc<Self>) -> bool {
        if self
            .launch_owned
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(game = %self.record.name, "launch ignored, previous launch still running");
            return false;
        }
        if !self.transition(&[RuntimeStatus::Idle], RuntimeStatus::Launching) {
            self.launch_owned.store(false, Ordering::Release);
            debug!(game = %self.record.name, status = %self.status(), "launch ignored");
            return false;
        }

        let game = Arc::clone(self);
        self.services.runtime.spawn(async move { game.run_launch().await });
        true
    }

    async fn run_launch(&self) {
        let started = Instant::now();
        info!(game = %self.record.name, "launching");

        match AssertUnwindSafe(self.launch()).catch_unwind().await {
            Ok(Ok(())) => {
                let minutes = started.elapsed().as_secs() / 60;
                info!(game = %self.record.name, minutes, "session ended");
                if self.record.platform_id.is_none() {
                    if let Err(e) = self
                        .services
                        .playtime
                        .add_playtime(&self.record.name, minutes as i64)
                    {
                        warn!(game = %self.record.name, error = %e, "failed to save playtime");
                    }
                }
            }
            Ok(Err(e)) => error!(game = %self.record.name, error = %e, "launch failed"),
            Err(_) => error!(game = %self.record.name, "launch task panicked"),
        }

        self.transition(
            &[RuntimeStatus::Launching, RuntimeStatus::Running],
            RuntimeStatus::Idle,
        );
        // Released after the reset: a new launch needs both Idle and ownership.
        self.launch_owned.store(false, Ordering::Release);
    }

    /// Reconciles status with a process snapshot and returns the result.
    ///
    /// Transfer and error states are never touched. A game that is
    /// launching stays launching until its process shows up, and a running
    /// game whose launch task is still alive falls back to launching rather
    /// than idle.
    pub fn update_status(&self, snapshot: &ProcessSnapshot) -> RuntimeStatus {
        if snapshot.contains(&self.record.executable_name) {
            if self.transition(
                &[RuntimeStatus::Idle, RuntimeStatus::Launching],
                RuntimeStatus::Running,
            ) {
                debug!(game = %self.record.name, "process detected");
            }
        } else {
            let to = if self.launch_owned.load(Ordering::Acquire) {
                RuntimeStatus::Launching
            } else {
                RuntimeStatus::Idle
            };
            if self.transition(&[RuntimeStatus::Running], to) {
                debug!(game = %self.record.name, status = %to, "process gone");
            }
        }
        self.status()
    }

    // -- install / download --------------------------------------------------

    /// Claims the game for a download. Returns false if it is busy.
    pub fn begin_download(&self) -> bool {
        if !self.transition(
            &[RuntimeStatus::Idle, RuntimeStatus::Error],
            RuntimeStatus::Downloading,
        ) {
            return false;
        }
        self.progress.store(0f32.to_bits(), Ordering::Release);
        self.set_transfer_rate("");
        true
    }

    /// Records download progress. Reaching 100% moves the game to installing.
    pub fn report_progress(&self, fraction: f32, rate: &str) {
        if !self.status().is_transfer() {
            return;
        }
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        self.progress.store(fraction.to_bits(), Ordering::Release);
        self.set_transfer_rate(rate);

        if fraction >= 1.0 {
            self.transition(&[RuntimeStatus::Downloading], RuntimeStatus::Installing);
        }
    }

    /// Ends a transfer, returning to idle on success or error otherwise.
    pub fn finish_download(&self, success: bool) {
        let to = if success { RuntimeStatus::Idle } else { RuntimeStatus::Error };
        if self.transition(
            &[RuntimeStatus::Downloading, RuntimeStatus::Installing],
            to,
        ) {
            self.set_transfer_rate("");
            if success {
                self.progress.store(1f32.to_bits(), Ordering::Release);
            }
        }
    }

    /// Abandons an in-flight transfer. A later exit report is ignored.
    pub fn cancel_download(&self) -> bool {
        if !self.transition(
            &[RuntimeStatus::Downloading, RuntimeStatus::Installing],
            RuntimeStatus::Idle,
        ) {
            return false;
        }
        self.progress.store(0f32.to_bits(), Ordering::Release);
        self.set_transfer_rate("");
        true
    }

    fn set_transfer_rate(&self, rate: &str) {
        let mut guard = self.transfer_rate.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clear();
        guard.push_str(rate);
    }

    // -- artwork -------------------------------------------------------------

    fn artwork_transition(&self, from: ArtworkStatus, to: ArtworkStatus) -> bool {
        self.artwork
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn banner_request(&self) -> BannerRequest {
        BannerRequest {
            name: self.record.name.clone(),
            platform_id: self.record.platform_id,
        }
    }

    fn set_banner_path(&self, path: PathBuf) {
        *self.banner_path.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
    }

    pub fn banner_path(&self) -> Option<PathBuf> {
        self.banner_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Starts banner acquisition if it has not started yet.
    ///
    /// A cached banner becomes ready immediately. Otherwise a download is
    /// spawned when the source has something to try, and the banner is marked
    /// failed when it has nothing.
    pub fn request_banner(self: &Arc<Self>) -> ArtworkStatus {
        if self.artwork_status() != ArtworkStatus::NotLoaded {
            return self.artwork_status();
        }

        let req = self.banner_request();
        if let Some(path) = self.services.banners.cached(&req) {
            debug!(game = %self.record.name, path = %path.display(), "banner cached");
            self.set_banner_path(path);
            self.artwork_transition(ArtworkStatus::NotLoaded, ArtworkStatus::ReadyToLoad);
            return self.artwork_status();
        }

        if !self.services.banners.can_fetch(&req) {
            debug!(game = %self.record.name, "no banner source");
            self.artwork_transition(ArtworkStatus::NotLoaded, ArtworkStatus::Failed);
            return self.artwork_status();
        }

        if !self.artwork_transition(ArtworkStatus::NotLoaded, ArtworkStatus::Downloading) {
            return self.artwork_status();
        }

        let game = Arc::clone(self);
        self.services.runtime.spawn(async move {
            let source = Arc::clone(&game.services.banners);
            let outcome = AssertUnwindSafe(source.fetch(req)).catch_unwind().await;
            match outcome {
                Ok(Ok(path)) => {
                    info!(game = %game.record.name, path = %path.display(), "banner downloaded");
                    game.set_banner_path(path);
                    game.artwork_transition(ArtworkStatus::Downloading, ArtworkStatus::ReadyToLoad);
                }
                Ok(Err(e)) => {
                    warn!(game = %game.record.name, error = %e, "banner download failed");
                    game.artwork_transition(ArtworkStatus::Downloading, ArtworkStatus::Failed);
                }
                Err(_) => {
                    error!(game = %game.record.name, "banner task panicked");
                    game.artwork_transition(ArtworkStatus::Downloading, ArtworkStatus::Failed);
                }
            }
        });
        ArtworkStatus::Downloading
    }

    /// Turns a ready banner into a graphics resource on the calling thread.
    ///
    /// Returns true once the banner is loaded; repeated calls after that are
    /// no-ops. Kicks off acquisition when nothing has been requested yet.
    pub fn load_banner(self: &Arc<Self>, loader: &mut dyn TextureLoader) -> bool {
        match self.artwork_status() {
            ArtworkStatus::Loaded => true,
            ArtworkStatus::Downloading | ArtworkStatus::Failed => false,
            ArtworkStatus::NotLoaded => {
                self.request_banner();
                false
            }
            ArtworkStatus::ReadyToLoad => self.apply_banner(loader),
        }
    }

    /// Loads a `ReadyToLoad` banner. Returns true if the banner is loaded.
    pub fn apply_banner(&self, loader: &mut dyn TextureLoader) -> bool {
        if self.artwork_status() != ArtworkStatus::ReadyToLoad {
            return self.artwork_status() == ArtworkStatus::Loaded;
        }

        let Some(path) = self.banner_path() else {
            self.artwork_transition(ArtworkStatus::ReadyToLoad, ArtworkStatus::Failed);
            return false;
        };

        match loader.load(&path) {
            Ok(handle) => {
                *self.banner.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                self.artwork_transition(ArtworkStatus::ReadyToLoad, ArtworkStatus::Loaded)
            }
            Err(e) => {
                warn!(game = %self.record.name, path = %path.display(), error = %e, "banner decode failed");
                self.artwork_transition(ArtworkStatus::ReadyToLoad, ArtworkStatus::Failed);
                false
            }
        }
    }

    /// Runs `f` with the loaded banner resource, if any.
    pub fn with_banner<R>(&self, f: impl FnOnce(&BannerHandle) -> R) -> Option<R> {
        let guard = self.banner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(f)
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("record", &self.record)
            .field("status", &self.status())
            .field("progress", &self.install_progress())
            .field("artwork", &self.artwork_status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::{ArtworkError, FetchFuture};
    use crate::launch::LaunchFuture;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Launcher that counts calls and blocks until released.
    #[derive(Default)]
    struct GatedLauncher {
        calls: AtomicUsize,
        release: Notify,
        fail: bool,
    }

    impl GameLauncher for GatedLauncher {
        fn launch<'a>(&'a self, _game: &'a GameRecord) -> LaunchFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.release.notified().await;
                if self.fail {
                    Err(LaunchError::ExitCode(1))
                } else {
                    Ok(())
                }
            })
        }
    }

    struct PanickingLauncher;

    impl GameLauncher for PanickingLauncher {
        fn launch<'a>(&'a self, _game: &'a GameRecord) -> LaunchFuture<'a> {
            Box::pin(async move {
                if true {
                    panic!("boom");
                }
                Ok::<(), LaunchError>(())
            })
        }
    }

    struct StaticBanners {
        cached: Option<PathBuf>,
        fetch_result: Option<PathBuf>,
    }

    impl BannerSource for StaticBanners {
        fn cached(&self, _req: &BannerRequest) -> Option<PathBuf> {
            self.cached.clone()
        }

        fn can_fetch(&self, _req: &BannerRequest) -> bool {
            true
        }

        fn fetch(&self, req: BannerRequest) -> FetchFuture<'_> {
            let result = self.fetch_result.clone();
            Box::pin(async move { result.ok_or(ArtworkError::NotFound(req.name)) })
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        loads: usize,
        fail: bool,
    }

    impl TextureLoader for CountingLoader {
        fn load(&mut self, path: &Path) -> Result<BannerHandle, ArtworkError> {
            self.loads += 1;
            if self.fail {
                return Err(ArtworkError::Decode("bad image".into()));
            }
            Ok(Box::new(path.to_path_buf()))
        }
    }

    fn services(tmp: &tempfile::TempDir) -> GameServices {
        let playtime = Arc::new(PlaytimeTracker::new(tmp.path().join("playtime.json")));
        GameServices::new(Handle::current(), playtime)
    }

    fn record() -> GameRecord {
        GameRecord::new("Hollow Knight", LauncherKind::Epic, "/games/hk/hollow_knight")
            .with_executable("hollow_knight")
    }

    async fn wait_for(game: &Game, status: RuntimeStatus) {
        for _ in 0..200 {
            if game.status() == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("game never reached {status}, stuck at {}", game.status());
    }

    async fn wait_for_artwork(game: &Game, status: ArtworkStatus) {
        for _ in 0..200 {
            if game.artwork_status() == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("artwork never reached {status}, stuck at {}", game.artwork_status());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_launch_spawns_once() {
        let tmp = tempfile::tempdir().unwrap();
        let launcher = Arc::new(GatedLauncher::default());
        let game = Arc::new(Game::new(
            record(),
            services(&tmp).with_launcher(launcher.clone()),
        ));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let game = Arc::clone(&game);
                std::thread::spawn(move || game.launch_async())
            })
            .collect();
        let accepted = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);

        // The launch task must have started before it can be released.
        for _ in 0..200 {
            if launcher.calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(launcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(game.status(), RuntimeStatus::Launching);

        launcher.release.notify_one();
        wait_for(&game, RuntimeStatus::Idle).await;
        assert_eq!(launcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_launch_returns_to_idle() {
        let tmp = tempfile::tempdir().unwrap();
        let launcher = Arc::new(GatedLauncher {
            fail: true,
            ..Default::default()
        });
        let game = Arc::new(Game::new(record(), services(&tmp).with_launcher(launcher.clone())));

        assert!(game.launch_async());
        launcher.release.notify_one();
        wait_for(&game, RuntimeStatus::Idle).await;
        // Failed sessions record nothing.
        assert!(!tmp.path().join("playtime.json").exists());
    }

    #[tokio::test]
    async fn panicking_launch_returns_to_idle() {
        let tmp = tempfile::tempdir().unwrap();
        let game = Arc::new(Game::new(
            record(),
            services(&tmp).with_launcher(Arc::new(PanickingLauncher)),
        ));

        assert!(game.launch_async());
        wait_for(&game, RuntimeStatus::Idle).await;
        assert!(game.launch_async());
    }

    #[tokio::test]
    async fn update_status_follows_process() {
        let tmp = tempfile::tempdir().unwrap();
        let game = Game::new(record(), services(&tmp));

        let running = ProcessSnapshot::from_names(["bash", "Hollow_Knight"]);
        let gone = ProcessSnapshot::from_names(["bash"]);

        assert_eq!(game.update_status(&gone), RuntimeStatus::Idle);
        assert_eq!(game.update_status(&running), RuntimeStatus::Running);
        assert_eq!(game.update_status(&running), RuntimeStatus::Running);
        assert_eq!(game.update_status(&gone), RuntimeStatus::Idle);
    }

    #[tokio::test]
    async fn update_status_leaves_transfers_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let game = Game::new(record(), services(&tmp));
        let running = ProcessSnapshot::from_names(["hollow_knight"]);

        assert!(game.begin_download());
        assert_eq!(game.update_status(&running), RuntimeStatus::Downloading);
        assert_eq!(game.update_status(&ProcessSnapshot::default()), RuntimeStatus::Downloading);
    }

    #[tokio::test]
    async fn launching_waits_for_process() {
        let tmp = tempfile::tempdir().unwrap();
        let launcher = Arc::new(GatedLauncher::default());
        let game = Arc::new(Game::new(record(), services(&tmp).with_launcher(launcher.clone())));

        assert!(game.launch_async());
        // Process not up yet: stays launching.
        assert_eq!(game.update_status(&ProcessSnapshot::default()), RuntimeStatus::Launching);
        let running = ProcessSnapshot::from_names(["hollow_knight"]);
        assert_eq!(game.update_status(&running), RuntimeStatus::Running);

        launcher.release.notify_one();
        wait_for(&game, RuntimeStatus::Idle).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn vanished_process_keeps_launch_owned() {
        let tmp = tempfile::tempdir().unwrap();
        let launcher = Arc::new(GatedLauncher::default());
        let game = Arc::new(Game::new(record(), services(&tmp).with_launcher(launcher.clone())));
        let running = ProcessSnapshot::from_names(["hollow_knight"]);

        assert!(game.launch_async());
        assert_eq!(game.update_status(&running), RuntimeStatus::Running);
        // Bootstrapper exited but the launch task is still waiting on it.
        assert_eq!(game.update_status(&ProcessSnapshot::default()), RuntimeStatus::Launching);
        assert!(!game.launch_async());

        launcher.release.notify_one();
        wait_for(&game, RuntimeStatus::Idle).await;
        for _ in 0..200 {
            if !game.launch_owned.load(Ordering::Acquire) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // The next launch is accepted exactly once.
        assert!(game.launch_async());
        assert!(!game.launch_async());
        assert_eq!(game.status(), RuntimeStatus::Launching);
        for _ in 0..200 {
            if launcher.calls.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(launcher.calls.load(Ordering::SeqCst), 2);

        launcher.release.notify_one();
        wait_for(&game, RuntimeStatus::Idle).await;
        assert_eq!(launcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_launch_while_downloading() {
        let tmp = tempfile::tempdir().unwrap();
        let game = Arc::new(Game::new(record(), services(&tmp)));

        assert!(game.begin_download());
        assert!(!game.launch_async());
        assert!(!game.begin_download());
        assert_eq!(game.status(), RuntimeStatus::Downloading);
    }

    #[tokio::test]
    async fn download_progress_flow() {
        let tmp = tempfile::tempdir().unwrap();
        let game = Game::new(record(), services(&tmp));

        // Progress outside a transfer is dropped.
        game.report_progress(0.5, "1 MB/s");
        assert_eq!(game.install_progress(), 0.0);

        assert!(game.begin_download());
        game.report_progress(0.42, "12.5MB/s");
        assert_eq!(game.install_progress(), 0.42);
        assert_eq!(game.transfer_rate(), "12.5MB/s");
        assert_eq!(game.status(), RuntimeStatus::Downloading);

        game.report_progress(1.7, "3.1MB/s");
        assert_eq!(game.install_progress(), 1.0);
        assert_eq!(game.status(), RuntimeStatus::Installing);

        game.finish_download(true);
        assert_eq!(game.status(), RuntimeStatus::Idle);
        assert_eq!(game.transfer_rate(), "");
    }

    #[tokio::test]
    async fn failed_download_can_retry() {
        let tmp = tempfile::tempdir().unwrap();
        let game = Game::new(record(), services(&tmp));

        assert!(game.begin_download());
        game.report_progress(0.3, "");
        game.finish_download(false);
        assert_eq!(game.status(), RuntimeStatus::Error);

        assert!(game.begin_download());
        assert_eq!(game.install_progress(), 0.0);
    }

    #[tokio::test]
    async fn cancelled_download_ignores_exit() {
        let tmp = tempfile::tempdir().unwrap();
        let game = Game::new(record(), services(&tmp));
        assert!(!game.cancel_download());

        assert!(game.begin_download());
        game.report_progress(0.6, "4MB/s");
        assert!(game.cancel_download());
        assert_eq!(game.status(), RuntimeStatus::Idle);
        assert_eq!(game.install_progress(), 0.0);

        game.finish_download(false);
        assert_eq!(game.status(), RuntimeStatus::Idle);
    }

    #[tokio::test]
    async fn cached_banner_loads_once() {
        let tmp = tempfile::tempdir().unwrap();
        let banners = Arc::new(StaticBanners {
            cached: Some(PathBuf::from("/cache/hk.jpg")),
            fetch_result: None,
        });
        let game = Arc::new(Game::new(record(), services(&tmp).with_banners(banners)));
        let mut loader = CountingLoader::default();

        assert_eq!(game.request_banner(), ArtworkStatus::ReadyToLoad);
        assert!(game.load_banner(&mut loader));
        assert_eq!(game.artwork_status(), ArtworkStatus::Loaded);
        assert_eq!(loader.loads, 1);

        assert!(game.load_banner(&mut loader));
        assert!(game.load_banner(&mut loader));
        assert_eq!(loader.loads, 1);
        assert_eq!(game.artwork_status(), ArtworkStatus::Loaded);

        let path = game.with_banner(|h| h.downcast_ref::<PathBuf>().cloned());
        assert_eq!(path.flatten(), Some(PathBuf::from("/cache/hk.jpg")));
    }

    #[tokio::test]
    async fn fetched_banner_becomes_ready() {
        let tmp = tempfile::tempdir().unwrap();
        let banners = Arc::new(StaticBanners {
            cached: None,
            fetch_result: Some(PathBuf::from("/cache/dl.jpg")),
        });
        let game = Arc::new(Game::new(record(), services(&tmp).with_banners(banners)));

        assert_eq!(game.request_banner(), ArtworkStatus::Downloading);
        wait_for_artwork(&game, ArtworkStatus::ReadyToLoad).await;
        assert_eq!(game.banner_path(), Some(PathBuf::from("/cache/dl.jpg")));
    }

    #[tokio::test]
    async fn banner_fetch_failure_is_terminal() {
        let tmp = tempfile::tempdir().unwrap();
        let banners = Arc::new(StaticBanners {
            cached: None,
            fetch_result: None,
        });
        let game = Arc::new(Game::new(record(), services(&tmp).with_banners(banners)));

        game.request_banner();
        wait_for_artwork(&game, ArtworkStatus::Failed).await;
        assert_eq!(game.request_banner(), ArtworkStatus::Failed);
    }

    #[tokio::test]
    async fn no_source_fails_immediately() {
        let tmp = tempfile::tempdir().unwrap();
        let game = Arc::new(Game::new(record(), services(&tmp)));
        assert_eq!(game.request_banner(), ArtworkStatus::Failed);
    }

    #[tokio::test]
    async fn decode_failure_is_terminal() {
        let tmp = tempfile::tempdir().unwrap();
        let banners = Arc::new(StaticBanners {
            cached: Some(PathBuf::from("/cache/broken.jpg")),
            fetch_result: None,
        });
        let game = Arc::new(Game::new(record(), services(&tmp).with_banners(banners)));
        let mut loader = CountingLoader {
            fail: true,
            ..Default::default()
        };

        game.request_banner();
        assert!(!game.load_banner(&mut loader));
        assert_eq!(game.artwork_status(), ArtworkStatus::Failed);
        assert!(!game.load_banner(&mut loader));
        assert_eq!(loader.loads, 1);
    }
}
