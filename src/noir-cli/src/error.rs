//! Error types shared by the fetchers, the download runner and the TUI.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failure to obtain remote or cached data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no cache directory available")]
    NoCacheDir,

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode response")]
    Decode(#[from] serde_json::Error),

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no store entry for app {0}")]
    MissingEntry(u32),

    #[error("store data unavailable for app {0}")]
    Unavailable(u32),
}

/// Search text that does not name a catalog entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid input")]
    Unresolved(String),
}

/// Failure while driving the external download tool.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to write download script")]
    Script(#[source] std::io::Error),

    #[error("failed to resolve install directory")]
    InstallDir(#[source] std::io::Error),

    #[error("failed to run {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {status}", program.display())]
    Exit { program: PathBuf, status: ExitStatus },

    #[error("download cancelled")]
    Cancelled,
}

/// A failed background task, tagged with what it was doing.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("could not load game list: {0}")]
    Catalog(#[source] FetchError),

    #[error("could not load details for app {id}: {source}")]
    Details {
        id: u32,
        #[source]
        source: FetchError,
    },

    #[error("download of app {id} failed: {source}")]
    Download {
        id: u32,
        #[source]
        source: ProcessError,
    },
}
