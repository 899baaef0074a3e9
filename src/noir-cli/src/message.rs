//! What flows into the state machine and what it asks to have done.

use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::catalog::Catalog;
use crate::details::GameDetails;
use crate::download::DownloadRequest;
use crate::error::TaskError;

/// Input to [`App::update`](crate::tui::App::update).
#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    /// Emitted by the event loop when no key arrived within a poll interval.
    Tick,
    CatalogLoaded(Catalog),
    /// Details for the app `id` was requested with. The payload's own
    /// `steam_appid` may differ.
    DetailsLoaded { id: u32, details: GameDetails },
    DownloadDone { id: u32 },
    Failed(TaskError),
    /// The display timer for the error shown with this token ran out.
    ErrorExpired(u64),
}

/// Work requested by the state machine, run off the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadCatalog,
    FetchDetails(u32),
    Download(DownloadRequest),
    ExpireError { token: u64, after: Duration },
}
