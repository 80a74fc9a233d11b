//! Platform-appropriate game launching.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tracing::{debug, info};

use crate::error::LaunchError;
use crate::model::GameRecord;
use crate::process::{self, CommandSpec};

/// Boxed future returned by [`GameLauncher::launch`].
pub type LaunchFuture<'a> = Pin<Box<dyn Future<Output = Result<(), LaunchError>> + Send + 'a>>;

/// Starts a game and resolves once the process or platform hand-off ends.
pub trait GameLauncher: Send + Sync {
    fn launch<'a>(&'a self, game: &'a GameRecord) -> LaunchFuture<'a>;
}

/// Launches through the host OS: URIs go to the native opener, paths are
/// spawned directly with their output forwarded to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl GameLauncher for SystemLauncher {
    fn launch<'a>(&'a self, game: &'a GameRecord) -> LaunchFuture<'a> {
        Box::pin(async move {
            let target = game.launch_target.trim();
            if target.is_empty() {
                return Err(LaunchError::NoTarget(game.name.clone()));
            }

            if is_uri(target) {
                info!(game = %game.name, uri = target, "opening platform URI");
                let cmd = open_uri_command(target);
                let code = process::run(&cmd, |line| debug!(game = %game.name, "{line}")).await?;
                if code != 0 {
                    return Err(LaunchError::ExitCode(code));
                }
                return Ok(());
            }

            let path = Path::new(target);
            let mut cmd = CommandSpec::new(path);
            if let Some(dir) = path.parent() {
                cmd = cmd.current_dir(dir);
            }

            info!(game = %game.name, path = target, "spawning game executable");
            let code = process::run(&cmd, |line| info!(game = %game.name, "{line}")).await?;
            info!(game = %game.name, code, "game process exited");
            Ok(())
        })
    }
}

/// Returns true for `scheme://...` launch targets.
pub fn is_uri(target: &str) -> bool {
    match target.split_once("://") {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Builds the command that hands `uri` to the desktop's URI handler.
pub fn open_uri_command(uri: &str) -> CommandSpec {
    #[cfg(target_os = "windows")]
    {
        CommandSpec::new("cmd").args(["/C", "start", ""]).arg(uri)
    }

    #[cfg(target_os = "macos")]
    {
        CommandSpec::new("open").arg(uri)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        CommandSpec::new("xdg-open").arg(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LauncherKind;

    #[test]
    fn uri_detection() {
        assert!(is_uri("steam://run/440"));
        assert!(is_uri("com.epicgames.launcher://apps/Fortnite"));
        assert!(!is_uri("/usr/games/foo"));
        assert!(!is_uri(r"C:\Games\Foo\foo.exe"));
        // Single-letter scheme would be a drive letter.
        assert!(!is_uri("C://weird"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_uses_xdg_open() {
        let cmd = open_uri_command("steam://run/440");
        assert_eq!(cmd.program(), Path::new("xdg-open"));
        assert_eq!(cmd.get_args(), ["steam://run/440"]);
    }

    #[tokio::test]
    async fn empty_target_is_error() {
        let rec = GameRecord::new("Nothing", LauncherKind::Epic, "");
        let err = SystemLauncher.launch(&rec).await.unwrap_err();
        assert!(matches!(err, LaunchError::NoTarget(_)));
    }

    #[tokio::test]
    async fn missing_executable_is_process_error() {
        let rec = GameRecord::new("Ghost", LauncherKind::Epic, "/no/such/dir/ghost.bin");
        let err = SystemLauncher.launch(&rec).await.unwrap_err();
        assert!(matches!(err, LaunchError::Process(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawns_executable_to_completion() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let exe = tmp.path().join("game.sh");
        std::fs::write(&exe, "#!/bin/sh\necho started\nexit 1\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let rec = GameRecord::new("Script", LauncherKind::Epic, exe.to_string_lossy());
        // A non-zero game exit is not a launch failure.
        SystemLauncher.launch(&rec).await.unwrap();
    }
}
