//! Application orchestrator: wires scanners, services and the registry
//! together and runs one command against them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use multilauncher_artwork::{ArtworkSource, BannerCache};
use multilauncher_epic::{EpicScanner, LegendaryClient, LegendaryLauncher};
use multilauncher_library::{
    ArtworkStatus, Game, GameRegistry, GameServices, GogScanner, LauncherKind, PlaytimeTracker,
    RuntimeStatus,
};
use multilauncher_steam::{Paths, SteamScanner};
use tokio::runtime::Handle;

use crate::config::Config;
use crate::texture::{HeadlessLoader, banner_size};
use crate::{Command, EpicCommand};

const POLL: Duration = Duration::from_millis(250);

/// Runs `command` to completion.
pub async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let legendary = LegendaryClient::new(&config.legendary_path);

    match command {
        Command::Epic { command } => epic(command, &legendary, &config).await,
        Command::Cancel => {
            require_helper(&legendary)?;
            legendary.cancel().await?;
            println!("install cancelled");
            Ok(())
        }
        Command::List { json } => Library::open(&config, legendary).await?.list(json),
        Command::Launch { name } => Library::open(&config, legendary).await?.launch(&name).await,
        Command::Install { name, base_path } => {
            let base = base_path.or_else(|| config.epic_install_base.clone());
            Library::open(&config, legendary)
                .await?
                .install(&name, base)
                .await
        }
        Command::Banners { clear } => {
            if clear {
                clear_banner_cache(&config)?;
            }
            Library::open(&config, legendary).await?.banners().await
        }
        Command::Watch => {
            Library::open(&config, legendary)
                .await?
                .watch(config.refresh_interval())
                .await
        }
    }
}

async fn epic(
    command: EpicCommand,
    legendary: &LegendaryClient,
    config: &Config,
) -> anyhow::Result<()> {
    require_helper(legendary)?;
    match command {
        EpicCommand::Auth => {
            println!("Sign in at https://legendary.gl/epiclogin and copy the authorizationCode.");
            println!("Then run `multilauncher epic login <code>`.");
            legendary.authenticate().await?;
        }
        EpicCommand::Login { code } => {
            legendary.login_with_code(&code).await?;
            let library = Library::open(config, legendary.clone()).await?;
            println!("signed in, {} games in library", library.registry.len());
        }
        EpicCommand::Logout => {
            legendary.logout().await?;
            println!("signed out");
        }
    }
    Ok(())
}

fn require_helper(legendary: &LegendaryClient) -> anyhow::Result<()> {
    if !legendary.is_available() {
        bail!(
            "Epic support requires legendary (looked for {})",
            legendary.program().display()
        );
    }
    Ok(())
}

/// A scanned library plus the handles commands need.
struct Library {
    registry: Arc<GameRegistry>,
    legendary: LegendaryClient,
}

impl Library {
    async fn open(config: &Config, legendary: LegendaryClient) -> anyhow::Result<Self> {
        let steam = match &config.steam_root {
            Some(root) => SteamScanner::new(Paths::with_base(root)),
            None => SteamScanner::detect(),
        };
        let steam = steam.with_filter(
            config
                .filters
                .steam
                .apply(multilauncher_steam::default_filter())?,
        );

        let epic = EpicScanner::new(config.epic_manifest_dir.clone())
            .with_legendary(legendary.clone())
            .with_filter(
                config
                    .filters
                    .epic
                    .apply(multilauncher_epic::default_filter())?,
            );

        let playtime = Arc::new(PlaytimeTracker::new(&config.playtime_path));
        let steam_paths = steam.paths().cloned();
        let platform_minutes = tokio::task::spawn_blocking(move || {
            steam_paths
                .map(|p| multilauncher_steam::read_playtime(&p))
                .unwrap_or_default()
        })
        .await?;
        if let Err(e) = playtime.init(platform_minutes) {
            tracing::warn!(
                error = %e,
                path = %config.playtime_path.display(),
                "playtime store unreadable"
            );
        }

        let services = GameServices::new(Handle::current(), playtime)
            .with_launcher(Arc::new(LegendaryLauncher::new(legendary.clone())))
            .with_banners(Arc::new(artwork_source(config)?));

        let registry = Arc::new(GameRegistry::new(services));
        registry.add_scanner(Arc::new(steam));
        registry.add_scanner(Arc::new(epic));
        registry.add_scanner(Arc::new(GogScanner));

        let added = registry.scan_all().await;
        tracing::info!(added, "library ready");

        Ok(Self { registry, legendary })
    }

    fn find(&self, name: &str) -> anyhow::Result<Arc<Game>> {
        self.registry
            .find(name)
            .ok_or_else(|| anyhow!("no game named '{name}'"))
    }

    fn list(&self, json: bool) -> anyhow::Result<()> {
        let games = self.registry.lock_games();
        if json {
            let records: Vec<_> = games.iter().map(|g| g.record()).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        for game in games.iter() {
            println!(
                "{:<40} {:<18} {:<11} {:>7.1} h",
                game.name(),
                game.launcher().to_string(),
                game.status().to_string(),
                game.playtime_hours(),
            );
        }
        println!("{} games", games.len());
        Ok(())
    }

    async fn launch(&self, name: &str) -> anyhow::Result<()> {
        let game = self.find(name)?;
        if !game.launch_async() {
            bail!("'{name}' is busy ({})", game.status());
        }
        println!("launching {name}");

        let refresh = self.registry.spawn_status_refresh(POLL);
        while game.status() != RuntimeStatus::Idle {
            tokio::time::sleep(POLL).await;
        }
        refresh.stop();

        println!("{name} finished, {:.1} h played", game.playtime_hours());
        Ok(())
    }

    async fn install(&self, name: &str, base_path: Option<PathBuf>) -> anyhow::Result<()> {
        let game = self.find(name)?;
        if game.launcher() != LauncherKind::Epic {
            bail!("'{name}' is a {} game, only Epic games install here", game.launcher());
        }
        require_helper(&self.legendary)?;
        if !self.legendary.install_game(&game, base_path.as_deref()) {
            bail!("'{name}' is busy ({})", game.status());
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    self.legendary
                        .cancel_install(&game)
                        .await
                        .context("cancel task")?;
                    println!("install cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(POLL) => {}
            }

            match game.status() {
                RuntimeStatus::Downloading | RuntimeStatus::Installing => {
                    println!(
                        "{:>5.1}% {} {}",
                        game.install_progress() * 100.0,
                        game.status(),
                        game.transfer_rate()
                    );
                }
                RuntimeStatus::Error => {
                    bail!("install of '{name}' failed, run install again to resume")
                }
                _ => {
                    println!("{name} installed");
                    return Ok(());
                }
            }
        }
    }

    async fn banners(&self) -> anyhow::Result<()> {
        let games = self.registry.games();
        for game in &games {
            game.request_banner();
        }
        while games
            .iter()
            .any(|g| g.artwork_status() == ArtworkStatus::Downloading)
        {
            tokio::time::sleep(POLL).await;
        }

        let mut loader = HeadlessLoader::default();
        let applied = self.registry.apply_ready_artwork(&mut loader);
        tracing::info!(applied, decoded = loader.loaded(), "banners applied");

        for game in &games {
            let size = game
                .with_banner(banner_size)
                .flatten()
                .map(|s| format!("{}x{}", s.width, s.height))
                .unwrap_or_default();
            println!("{:<40} {:<11} {}", game.name(), game.artwork_status().to_string(), size);
        }
        Ok(())
    }

    async fn watch(&self, interval: Duration) -> anyhow::Result<()> {
        let refresh = self.registry.spawn_status_refresh(interval);
        let mut last: HashMap<String, RuntimeStatus> = HashMap::new();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            for game in self.registry.games() {
                let status = game.status();
                if last.insert(game.name().to_string(), status) != Some(status) {
                    println!("{:<40} {status}", game.name());
                }
            }
            tokio::select! {
                _ = &mut ctrl_c => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        refresh.stop();
        Ok(())
    }
}

fn banner_cache(config: &Config) -> BannerCache {
    BannerCache::new(&config.cache_dir).with_banners_dir(&config.banners_dir)
}

fn clear_banner_cache(config: &Config) -> anyhow::Result<()> {
    let cache = banner_cache(config);
    let bytes = cache.size();
    let removed = cache
        .clear()
        .with_context(|| format!("clearing {}", cache.cache_dir().display()))?;
    println!("removed {removed} cached banners ({} KiB)", bytes / 1024);
    Ok(())
}

fn artwork_source(config: &Config) -> anyhow::Result<ArtworkSource> {
    let cache = banner_cache(config);
    let mut source = ArtworkSource::new(cache)?;
    if let Some(key) = config.steamgriddb_key() {
        source = source.with_steamgriddb(multilauncher_artwork::Client::new(key)?);
    }
    Ok(source)
}
