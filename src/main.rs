use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod catalog;
mod commands;
mod config;
mod error;
mod player;
mod source;
mod storage;
mod stream;
mod tags;
mod term;
mod tui;
mod util;

use catalog::Catalog;
use config::{Settings, expand_tilde};

#[derive(Parser)]
#[command(
    name = "trackstash",
    version,
    about = "Manage and stream a personal cloud MP3 stash"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload an MP3 file to the object store and add it to the catalog
    Add {
        /// Path to the local MP3 file
        path: PathBuf,
    },
    /// List all tracks in the catalog
    List,
    /// Stream a track by its id
    Play {
        /// Track id as shown by `list`
        id: String,
    },
    /// Download the audio of a video as MP3
    Download {
        /// Video URL or bare video id
        url: String,
    },
    /// Delete a track from storage and the catalog
    Delete {
        /// Track id as shown by `list`
        id: String,
    },
    /// Launch the interactive terminal UI
    Tui,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI and the play ticker own the terminal; logs would tear their
    // output apart, so the subscriber is only installed for batch commands.
    if !matches!(cli.command, Command::Tui | Command::Play { .. }) {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let settings = Settings::load().context("failed to load configuration")?;
    settings
        .validate()
        .map_err(|msg| anyhow::anyhow!("invalid configuration: {msg}"))?;

    let catalog_path = expand_tilde(&settings.catalog.path);
    let mut catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("failed to load catalog from {}", catalog_path.display()))?;

    match cli.command {
        Command::Add { path } => {
            commands::add::run(&settings, &mut catalog, &catalog_path, &path)?;
        }
        Command::List => {
            commands::list::run(&catalog);
        }
        Command::Play { id } => {
            commands::play::run(&settings, &catalog, &id)?;
        }
        Command::Download { url } => {
            commands::download::run(&settings, &url)?;
        }
        Command::Delete { id } => {
            commands::delete::run(&settings, &mut catalog, &catalog_path, &id)?;
        }
        Command::Tui => {
            tui::run(&settings, catalog, catalog_path)?;
        }
    }

    Ok(())
}
