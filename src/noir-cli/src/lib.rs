//! noir: browse the Steam catalog in the terminal and download games with
//! steamcmd.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub mod cache;
pub mod catalog;
pub mod credentials;
pub mod details;
pub mod download;
pub mod error;
mod http;
pub mod input;
pub mod message;
pub mod task;
pub mod tui;

pub use catalog::{Catalog, CatalogCache, Game};
pub use credentials::CredentialStore;
pub use details::{DetailFetcher, GameDetails, Platform};
pub use download::{DownloadRequest, Downloader};
pub use error::{FetchError, InputError, ProcessError, TaskError};

#[derive(Parser, Debug)]
#[command(name = "noir")]
#[command(version, about = "Browse the Steam catalog and download games with steamcmd", long_about = None)]
pub struct Cli {
    /// steamcmd executable to run downloads with
    #[arg(long, env = "NOIR_STEAMCMD", default_value = download::DEFAULT_STEAMCMD)]
    pub steamcmd: PathBuf,

    /// Write a log to this file (filter with RUST_LOG)
    #[arg(long, env = "NOIR_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// App list endpoint
    #[arg(long, env = "NOIR_CATALOG_URL", default_value = catalog::CATALOG_URL, hide = true)]
    pub catalog_url: String,

    /// App details endpoint
    #[arg(long, env = "NOIR_DETAILS_URL", default_value = details::DETAILS_URL, hide = true)]
    pub details_url: String,
}

/// Everything the TUI needs from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// `<cache-root>/noir`, if a cache root could be found.
    pub cache_dir: Option<PathBuf>,
    pub steamcmd: PathBuf,
    pub catalog_url: String,
    pub details_url: String,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            cache_dir: cache::resolve_cache_dir(),
            steamcmd: cli.steamcmd.clone(),
            catalog_url: cli.catalog_url.clone(),
            details_url: cli.details_url.clone(),
        }
    }

    pub fn services(&self) -> Result<task::Services> {
        let client = http::client()?;
        Ok(task::Services {
            catalog: CatalogCache::new(
                self.cache_dir.as_deref(),
                self.catalog_url.clone(),
                client.clone(),
            ),
            details: DetailFetcher::new(self.details_url.clone(), client),
            downloader: Downloader::new(&self.steamcmd),
        })
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.cache_dir.as_deref())
    }
}

/// Install a file-backed subscriber. The terminal belongs to the TUI, so
/// without a log file nothing is logged.
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Main entry point for the CLI.
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let config = Config::from_cli(&cli);
    tracing::info!(
        cache_dir = ?config.cache_dir,
        steamcmd = %config.steamcmd.display(),
        "starting noir"
    );

    let services = config.services()?;
    tui::run(services, config.credentials())
}
