//! MultiLauncher command-line front end.

mod app;
mod config;
mod texture;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// One library for Steam, Epic and GOG games
#[derive(Parser)]
#[command(name = "multilauncher", version)]
#[command(about = "List, launch and install games from every store in one place")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List discovered games
    List {
        /// Print game records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Launch a game and wait for it to finish
    Launch { name: String },

    /// Install or resume an Epic game through legendary
    Install {
        name: String,

        /// Install directory (overrides `epic_install_base`)
        #[arg(long)]
        base_path: Option<PathBuf>,
    },

    /// Cancel the running legendary install
    Cancel,

    /// Fetch and decode banners for every game
    Banners {
        /// Delete downloaded banners first so they are fetched again
        #[arg(long)]
        clear: bool,
    },

    /// Print status changes until interrupted
    Watch,

    /// Epic account management
    Epic {
        #[command(subcommand)]
        command: EpicCommand,
    },
}

#[derive(Subcommand)]
pub(crate) enum EpicCommand {
    /// Start the interactive legendary sign-in
    Auth,

    /// Sign in with an authorization code
    Login { code: String },

    /// Sign out and forget the stored session
    Logout,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting multilauncher");

    let config = config::Config::load(cli.config.as_deref())?;
    tracing::debug!(
        steam_root = ?config.steam_root,
        epic_manifest_dir = ?config.epic_manifest_dir,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(
        cli.command.unwrap_or(Command::List { json: false }),
        config,
    ))
}
