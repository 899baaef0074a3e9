//! The remembered steamcmd login name.

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::cache::CachedFile;

/// How long a saved username is reused without asking again.
pub const USERNAME_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const USERNAME_FILE: &str = "username";

/// Best-effort cache of a single username. Nothing here ever fails loudly:
/// a missing cache directory just means the user is asked every time.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    file: Option<CachedFile>,
}

impl CredentialStore {
    pub fn new(cache_dir: Option<&Path>) -> Self {
        Self {
            file: cache_dir.map(|dir| CachedFile::new(dir.join(USERNAME_FILE), USERNAME_TTL)),
        }
    }

    pub fn cached_username(&self) -> Option<String> {
        self.cached_username_at(SystemTime::now())
    }

    /// The saved username if it was written less than [`USERNAME_TTL`] before
    /// `now`. Stale files are ignored, not removed.
    pub fn cached_username_at(&self, now: SystemTime) -> Option<String> {
        let bytes = self.file.as_ref()?.read_fresh_at(now)?;
        let name = String::from_utf8_lossy(&bytes)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        (!name.is_empty()).then_some(name)
    }

    pub fn save_username(&self, name: &str) {
        let Some(file) = &self.file else {
            tracing::debug!("no cache directory, not saving username");
            return;
        };
        match file.store(name.as_bytes()) {
            Ok(()) => tracing::debug!(path = %file.path().display(), "saved username"),
            Err(e) => {
                tracing::warn!(path = %file.path().display(), error = %e, "failed to save username")
            }
        }
    }
}
