//! Driver for the `legendary` helper CLI.
//!
//! `legendary` handles Epic account authentication, owned-game listing,
//! installs and launches. It is run as an opaque subprocess; only its
//! textual output is interpreted.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use futures_util::FutureExt;
use multilauncher_library::process::{self, CommandSpec};
use multilauncher_library::{
    Game, GameLauncher, GameRecord, LaunchError, LaunchFuture, LauncherKind, SystemLauncher,
};
use regex::Regex;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::EpicError;

/// One owned game as reported by `legendary list --json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EpicGameInfo {
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub title: String,
}

/// One parsed `[DL]` progress line.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub fraction: f32,
    pub transferred: String,
    pub rate: String,
}

/// Handle to a `legendary` executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendaryClient {
    program: PathBuf,
}

impl Default for LegendaryClient {
    fn default() -> Self {
        Self::new(default_program())
    }
}

impl LegendaryClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether the helper binary can be found.
    ///
    /// A bare program name is looked up on `PATH`.
    pub fn is_available(&self) -> bool {
        let is_bare = self.program.components().count() == 1;
        if !is_bare {
            return self.program.is_file();
        }
        std::env::var_os("PATH")
            .map(|paths| {
                std::env::split_paths(&paths).any(|dir| {
                    let candidate = dir.join(&self.program);
                    candidate.is_file()
                        || candidate
                            .with_extension(std::env::consts::EXE_EXTENSION)
                            .is_file()
                })
            })
            .unwrap_or(false)
    }

    fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&self.program).args(args)
    }

    /// Starts the interactive `auth` flow without waiting for it.
    pub fn authenticate(&self) -> JoinHandle<()> {
        let cmd = self.command(["auth"]);
        info!(command = %cmd, "starting epic authentication");
        process::run_detached(
            cmd,
            |result| match result {
                Ok(code) => info!(code, "legendary auth finished"),
                Err(e) => error!(error = %e, "legendary auth failed to start"),
            },
            |line| info!("[legendary] {line}"),
        )
    }

    /// Signs in with an authorization code from the Epic login page.
    pub async fn login_with_code(&self, code: &str) -> Result<(), EpicError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(EpicError::EmptyCode);
        }
        self.run_checked(self.command(["auth", "--code", code, "--yes"]))
            .await?;
        info!("epic account signed in");
        Ok(())
    }

    /// Forgets the stored Epic session.
    pub async fn logout(&self) -> Result<(), EpicError> {
        self.run_checked(self.command(["auth", "--delete", "--yes"]))
            .await?;
        info!("epic account signed out");
        Ok(())
    }

    /// Lists the games owned by the signed-in account.
    pub async fn list_games(&self) -> Result<Vec<EpicGameInfo>, EpicError> {
        if !self.is_available() {
            return Err(EpicError::NotAvailable(self.program.clone()));
        }
        let cmd = self.command(["list", "--json"]);
        let mut lines = Vec::new();
        let code = process::run(&cmd, |line| lines.push(line.to_string())).await?;
        if code != 0 {
            return Err(EpicError::HelperFailed {
                command: cmd.to_string(),
                code,
            });
        }
        let games = parse_list_output(&lines)?;
        debug!(count = games.len(), "legendary list parsed");
        Ok(games)
    }

    /// Installs (or resumes installing) `game` in the background.
    ///
    /// Returns false without doing anything if the game is busy. Progress
    /// lines update the game's transfer state; the exit code decides
    /// between `Idle` and `Error`.
    pub fn install_game(&self, game: &Arc<Game>, base_path: Option<&Path>) -> bool {
        if !game.begin_download() {
            debug!(game = %game.name(), status = %game.status(), "install ignored, game busy");
            return false;
        }

        let app_name = game.platform_key().unwrap_or(game.name());
        let cmd = self.install_command(app_name, base_path);
        info!(game = %game.name(), command = %cmd, "install started");

        let game = Arc::clone(game);
        let runtime = game.runtime().clone();
        runtime.spawn(async move {
            let result = AssertUnwindSafe(process::run(&cmd, |line| {
                if let Some(p) = parse_progress(line) {
                    game.report_progress(p.fraction, &p.rate);
                }
                info!(game = %game.name(), "[legendary] {line}");
            }))
            .catch_unwind()
            .await;

            match result {
                Ok(Ok(0)) => {
                    info!(game = %game.name(), "install finished");
                    game.finish_download(true);
                }
                Ok(Ok(code)) => {
                    warn!(game = %game.name(), code, "install failed");
                    game.finish_download(false);
                }
                Ok(Err(e)) => {
                    error!(game = %game.name(), error = %e, "install could not run");
                    game.finish_download(false);
                }
                Err(_) => {
                    error!(game = %game.name(), "install task panicked");
                    game.finish_download(false);
                }
            }
        });
        true
    }

    fn install_command(&self, app_name: &str, base_path: Option<&Path>) -> CommandSpec {
        let mut cmd = self.command(["install", app_name, "--skip-sdl", "--repair"]);
        if let Some(base) = base_path.filter(|p| !p.as_os_str().is_empty()) {
            cmd = cmd.arg("--base-path").arg(base.to_string_lossy());
        }
        cmd
    }

    /// Launches `app_name` through the helper without waiting for it.
    pub fn launch_game(&self, app_name: &str) -> JoinHandle<()> {
        let cmd = self.command(["launch", app_name]);
        let name = app_name.to_string();
        info!(app = %name, "launching through legendary");
        process::run_detached(
            cmd,
            move |result| match result {
                Ok(code) => info!(app = %name, code, "legendary launch finished"),
                Err(e) => error!(app = %name, error = %e, "legendary launch failed"),
            },
            |line| debug!("[legendary] {line}"),
        )
    }

    /// Runs `launch` to completion, returning the helper's exit code.
    pub async fn run_launch(&self, app_name: &str) -> Result<i32, EpicError> {
        let cmd = self.command(["launch", app_name]);
        Ok(process::run(&cmd, |line| info!(app = app_name, "[legendary] {line}")).await?)
    }

    /// Cancels the running install and returns `game` to idle.
    pub fn cancel_install(&self, game: &Game) -> JoinHandle<()> {
        if game.cancel_download() {
            info!(game = %game.name(), "install cancelled");
        }
        process::run_detached(
            self.command(["cancel"]),
            |result| {
                if let Err(e) = result {
                    warn!(error = %e, "legendary cancel failed");
                }
            },
            |line| debug!("[legendary] {line}"),
        )
    }

    /// Runs `cancel` to completion.
    pub async fn cancel(&self) -> Result<(), EpicError> {
        self.run_checked(self.command(["cancel"])).await
    }

    async fn run_checked(&self, cmd: CommandSpec) -> Result<(), EpicError> {
        let code = process::run(&cmd, |line| info!("[legendary] {line}")).await?;
        if code != 0 {
            return Err(EpicError::HelperFailed {
                command: cmd.to_string(),
                code,
            });
        }
        Ok(())
    }
}

/// Default helper location: bundled next to the launcher on Windows, on
/// `PATH` elsewhere.
pub fn default_program() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from("tools/legendary/legendary.exe")
    } else {
        PathBuf::from("legendary")
    }
}

fn log_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // `[cli] INFO: ...`, `[Core] WARNING: ...`
    PATTERN.get_or_init(|| Regex::new(r"^\[[A-Za-z][^\]]*\]").expect("valid log prefix pattern"))
}

fn progress_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // [DL]  42% | 8.2GB / 19.3GB | 12MB/s
        Regex::new(r"\[DL\]\s+(\d+)%\s+\|\s+([\d\.]+GB\s+/\s+[\d\.]+GB)\s+\|\s+([\d\.]+\w+/s)")
            .expect("valid progress pattern")
    })
}

/// Extracts the JSON game list from `list --json` output.
///
/// JSON starts at the first line beginning with `[` or `{` that is not a
/// bracketed log tag; every later untagged line belongs to it. Entries
/// with an empty `app_name` are account labels and are dropped.
pub fn parse_list_output<S: AsRef<str>>(lines: &[S]) -> Result<Vec<EpicGameInfo>, EpicError> {
    let mut json = String::new();
    for line in lines {
        let line = line.as_ref().trim();
        if log_prefix().is_match(line) {
            continue;
        }
        if json.is_empty() && !(line.starts_with('[') || line.starts_with('{')) {
            continue;
        }
        json.push_str(line);
    }

    if json.is_empty() {
        return Ok(Vec::new());
    }

    let games: Vec<EpicGameInfo> = serde_json::from_str(&json)?;
    Ok(games
        .into_iter()
        .filter(|g| !g.app_name.is_empty())
        .collect())
}

/// Parses a `[DL] <pct>% | <done> / <total> | <speed>` line.
pub fn parse_progress(line: &str) -> Option<Progress> {
    let caps = progress_pattern().captures(line)?;
    let percent: f32 = caps[1].parse().ok()?;
    Some(Progress {
        fraction: (percent / 100.0).clamp(0.0, 1.0),
        transferred: caps[2].to_string(),
        rate: caps[3].to_string(),
    })
}

/// [`GameLauncher`] that starts Epic games without a local executable
/// through `legendary launch`, and everything else through the OS.
#[derive(Debug, Clone)]
pub struct LegendaryLauncher {
    client: LegendaryClient,
    fallback: SystemLauncher,
}

impl LegendaryLauncher {
    pub fn new(client: LegendaryClient) -> Self {
        Self {
            client,
            fallback: SystemLauncher,
        }
    }

    fn routes_to_helper(&self, game: &GameRecord) -> bool {
        game.launcher == LauncherKind::Epic
            && game.launch_target.trim().is_empty()
            && game.platform_key.is_some()
    }
}

impl GameLauncher for LegendaryLauncher {
    fn launch<'a>(&'a self, game: &'a GameRecord) -> LaunchFuture<'a> {
        if !self.routes_to_helper(game) {
            return self.fallback.launch(game);
        }
        Box::pin(async move {
            let Some(app_name) = game.platform_key.as_deref() else {
                return Err(LaunchError::NoTarget(game.name.clone()));
            };
            let code = match self.client.run_launch(app_name).await {
                Ok(code) => code,
                Err(EpicError::Process(e)) => return Err(LaunchError::Process(e)),
                Err(e) => return Err(LaunchError::NoTarget(format!("{}: {e}", game.name))),
            };
            if code != 0 {
                return Err(LaunchError::ExitCode(code));
            }
            Ok(())
        })
    }
}
